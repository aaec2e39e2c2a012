//! Caller-misuse checks, applied before any model call.

use lorekeeper_error::{LorekeeperResult, ValidationError, ValidationErrorKind};

/// Longest accepted character name, in chars.
pub const MAX_NAME_CHARS: usize = 100;

const FORBIDDEN_NAME_PARTS: [&str; 4] = ["/", "\\", "..", "\0"];

/// Validate a character name and return it trimmed.
///
/// Names double as storage keys, so path separators, `..` and NUL are
/// rejected along with empty and over-long names.
///
/// # Examples
///
/// ```
/// use lorekeeper_core::validate_character_name;
///
/// assert_eq!(validate_character_name("  Mei ").unwrap(), "Mei");
/// assert!(validate_character_name("   ").is_err());
/// assert!(validate_character_name("../etc").is_err());
/// ```
pub fn validate_character_name(name: &str) -> LorekeeperResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new(ValidationErrorKind::EmptyName).into());
    }
    let length = name.chars().count();
    if length > MAX_NAME_CHARS {
        return Err(ValidationError::new(ValidationErrorKind::NameTooLong {
            length,
            max: MAX_NAME_CHARS,
        })
        .into());
    }
    if let Some(part) = FORBIDDEN_NAME_PARTS.iter().find(|part| name.contains(**part)) {
        return Err(ValidationError::new(ValidationErrorKind::InvalidNameCharacters(
            part.escape_default().to_string(),
        ))
        .into());
    }
    Ok(name)
}

/// Validate a chapter index against the number of chapters in the source.
pub fn validate_chapter_index(index: usize, chapter_count: usize) -> LorekeeperResult<()> {
    if index >= chapter_count {
        return Err(ValidationError::new(ValidationErrorKind::ChapterOutOfRange {
            index,
            chapter_count,
        })
        .into());
    }
    Ok(())
}

/// Validate a chapter budget such as `max_chapters`.
pub fn validate_budget(label: &'static str, value: usize) -> LorekeeperResult<usize> {
    if value == 0 {
        return Err(ValidationError::new(ValidationErrorKind::ZeroBudget(label)).into());
    }
    Ok(value)
}
