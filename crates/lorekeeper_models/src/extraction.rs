//! Utilities for extracting structured data from LLM responses.
//!
//! Replies often wrap the JSON in a markdown fence or surround it with
//! prose. Extraction tries a fenced block first, then the first balanced
//! `{ ... }` or `[ ... ]`.

use lorekeeper_error::{JsonError, LorekeeperResult};
use lorekeeper_interface::Mapping;

/// Extract JSON from a response that may contain markdown or extra text.
///
/// # Errors
///
/// Returns an error if no JSON-looking text is found.
///
/// # Examples
///
/// ```
/// use lorekeeper_models::extract_json;
///
/// let response = "Result:\n```json\n{\"events\": [\"arrives\"]}\n```\n";
/// let json = extract_json(response).unwrap();
/// assert!(json.contains("arrives"));
/// ```
pub fn extract_json(response: &str) -> LorekeeperResult<String> {
    if let Some(json) = extract_from_code_block(response, "json") {
        return Ok(json);
    }

    let bracket_pos = response.find('[');
    let brace_pos = response.find('{');
    let order = match (bracket_pos, brace_pos) {
        (Some(b_pos), Some(c_pos)) if b_pos < c_pos => [('[', ']'), ('{', '}')],
        (Some(_), None) => [('[', ']'), ('{', '}')],
        _ => [('{', '}'), ('[', ']')],
    };
    for (open, close) in order {
        if let Some(json) = extract_balanced(response, open, close) {
            return Ok(json);
        }
    }

    tracing::warn!(
        response_length = response.len(),
        "No JSON found in model response"
    );
    Err(JsonError::new(format!(
        "No JSON found in response (length: {})",
        response.len()
    ))
    .into())
}

/// Parse a model reply into a JSON object.
///
/// Never fails: replies without JSON, with invalid JSON, or with a JSON
/// value that is not an object all yield an empty mapping.
///
/// # Examples
///
/// ```
/// use lorekeeper_models::parse_mapping;
///
/// assert_eq!(parse_mapping("Sure: {\"role\": \"minor\"}")["role"], "minor");
/// assert!(parse_mapping("[1, 2]").is_empty());
/// assert!(parse_mapping("no idea").is_empty());
/// ```
pub fn parse_mapping(response: &str) -> Mapping {
    let Ok(json) = extract_json(response) else {
        return Mapping::new();
    };
    match serde_json::from_str::<serde_json::Value>(&json) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "Model returned non-object JSON");
            Mapping::new()
        }
        Err(e) => {
            let preview = json.chars().take(100).collect::<String>();
            tracing::warn!(error = %e, json_preview = %preview, "JSON parsing failed");
            Mapping::new()
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Content of the first fenced block, preferring one tagged `language`.
///
/// An unterminated fence yields everything after it.
fn extract_from_code_block(response: &str, language: &str) -> Option<String> {
    let pattern = format!("```{}", language);

    if let Some(start) = response.find(&pattern) {
        let content_start = start + pattern.len();
        return Some(fenced_content(&response[content_start..]));
    }

    if let Some(start) = response.find("```") {
        let content_start = start + 3;
        // Skip an unknown language tag
        let skip_to = response[content_start..]
            .find('\n')
            .map(|n| content_start + n + 1)
            .unwrap_or(content_start);
        return Some(fenced_content(&response[skip_to..]));
    }

    None
}

fn fenced_content(rest: &str) -> String {
    match rest.find("```") {
        Some(end) => rest[..end].trim().to_string(),
        None => rest.trim().to_string(),
    }
}

/// Content from the first `open` up to its matching `close`, skipping
/// delimiters inside JSON strings.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
