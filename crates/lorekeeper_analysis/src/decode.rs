//! Tolerant readers over untyped model output.
//!
//! Every reader returns a usable value for missing keys and wrong types.
//! Stage adapters (`decode_appearance`, `decode_relations`, ...) are built
//! from these and are the only code that touches raw [`Mapping`]s.

use lorekeeper_core::{EnumPolicy, Vocabulary};
use lorekeeper_interface::Mapping;
use serde_json::Value;

/// Text of a scalar value, trimmed. Numbers and booleans are rendered.
pub fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    Some(text)
}

/// String field, empty when missing or not a scalar.
pub fn text(map: &Mapping, key: &str) -> String {
    map.get(key).and_then(scalar_text).unwrap_or_default()
}

/// First present key among aliases, as text.
pub fn text_any(map: &Mapping, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(scalar_text))
        .unwrap_or_default()
}

/// List of non-empty strings, at most `cap`.
///
/// A bare string is read as a one-element list.
pub fn string_list(map: &Mapping, key: &str, cap: usize) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .filter(|s| !s.is_empty())
            .take(cap)
            .collect(),
        Some(value) => scalar_text(value)
            .filter(|s| !s.is_empty())
            .into_iter()
            .take(cap)
            .collect(),
        None => Vec::new(),
    }
}

/// Elements of an array field; nothing when missing or not an array.
pub fn items<'a>(map: &'a Mapping, key: &str) -> impl Iterator<Item = &'a Value> + use<'a> {
    map.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

/// Vocabulary term run through the policy.
///
/// Missing or empty terms take `fallback`. `None` means the policy
/// rejected an undocumented term.
pub fn term<T: Vocabulary>(
    map: &Mapping,
    keys: &[&str],
    policy: EnumPolicy,
    fallback: T,
) -> Option<T> {
    let raw = text_any(map, keys);
    if raw.is_empty() {
        return Some(fallback);
    }
    policy.admit(T::from_term(&raw), fallback)
}

/// Scalar vocabulary term: a rejected term falls back instead of dropping
/// the record.
pub fn scalar_term<T: Vocabulary>(
    map: &Mapping,
    keys: &[&str],
    policy: EnumPolicy,
    fallback: T,
) -> T {
    term(map, keys, policy, fallback.clone()).unwrap_or(fallback)
}

/// One-based chapter number from the model, as a zero-based index.
///
/// Accepts integers, integral floats and numeric strings such as `"12"`.
pub fn chapter_number(map: &Mapping, key: &str) -> Option<usize> {
    let number = match map.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s
            .trim()
            .trim_start_matches(|c: char| !c.is_ascii_digit())
            .split(|c: char| !c.is_ascii_digit())
            .next()
            .and_then(|digits| digits.parse().ok()),
        _ => None,
    }?;
    usize::try_from(number).ok()?.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeeper_core::Sentiment;
    use serde_json::json;

    fn map(value: Value) -> Mapping {
        match value {
            Value::Object(map) => map,
            _ => Mapping::new(),
        }
    }

    #[test]
    fn text_reads_scalars_only() {
        let m = map(json!({"a": " x ", "b": 3, "c": [1], "d": null}));
        assert_eq!(text(&m, "a"), "x");
        assert_eq!(text(&m, "b"), "3");
        assert_eq!(text(&m, "c"), "");
        assert_eq!(text(&m, "d"), "");
        assert_eq!(text(&m, "missing"), "");
    }

    #[test]
    fn string_list_caps_and_skips_blanks() {
        let m = map(json!({"xs": ["a", "", 2, {"k": 1}, "b", "c"], "one": "solo"}));
        assert_eq!(string_list(&m, "xs", 3), vec!["a", "2", "b"]);
        assert_eq!(string_list(&m, "one", 5), vec!["solo"]);
        assert!(string_list(&m, "missing", 5).is_empty());
    }

    #[test]
    fn term_applies_policy() {
        let m = map(json!({"s": "ecstatic", "e": ""}));
        assert_eq!(
            term(&m, &["s"], EnumPolicy::Coerce, Sentiment::Neutral),
            Some(Sentiment::Neutral)
        );
        assert_eq!(term(&m, &["s"], EnumPolicy::Reject, Sentiment::Neutral), None);
        assert_eq!(
            term(&m, &["e"], EnumPolicy::Reject, Sentiment::Neutral),
            Some(Sentiment::Neutral)
        );
        assert_eq!(
            scalar_term(&m, &["s"], EnumPolicy::Reject, Sentiment::Neutral),
            Sentiment::Neutral
        );
    }

    #[test]
    fn chapter_number_converts_to_index() {
        let m = map(json!({"a": 12, "b": "7", "c": 0, "d": -1, "e": "chapter 3", "f": 4.0}));
        assert_eq!(chapter_number(&m, "a"), Some(11));
        assert_eq!(chapter_number(&m, "b"), Some(6));
        assert_eq!(chapter_number(&m, "c"), None);
        assert_eq!(chapter_number(&m, "d"), None);
        assert_eq!(chapter_number(&m, "e"), Some(2));
        assert_eq!(chapter_number(&m, "f"), Some(3));
    }
}
