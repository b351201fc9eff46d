use lazy_static::lazy_static;
use regex::Regex;

use super::LlmResponse;

lazy_static! {
    /// Trailing commas before } or ] are not valid JSON
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();

    /// JavaScript-style string concatenation ("a" + "b") is not valid JSON
    static ref STRING_CONCAT_RE: Regex = Regex::new(r#""\s*\+\s*""#).unwrap();
}

/// Extract the JSON object embedded in a model reply.
///
/// Tries in order: a ```json fenced block, a generic fenced block, a reply
/// that is plain JSON already, and finally the substring between the first
/// `{` and the last `}`.
pub fn extract_json_string(text: &str) -> Result<String, String> {
    if text.contains("```json") {
        return text
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| "Failed to extract JSON from markdown code block".to_string());
    }

    if let Some(start) = text.find("```") {
        let block_start = start + 3;
        // Skip the optional language identifier on the opening line
        if let Some(newline_offset) = text[block_start..].find('\n') {
            let json_start = block_start + newline_offset + 1;
            if let Some(end_offset) = text[json_start..].find("```") {
                return Ok(text[json_start..json_start + end_offset].trim().to_string());
            }
        }
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    let start = text
        .find('{')
        .ok_or_else(|| "No JSON object found in response".to_string())?;
    let end = text
        .rfind('}')
        .ok_or_else(|| "Incomplete JSON object in response".to_string())?;

    if start < end {
        Ok(text[start..=end].to_string())
    } else {
        Err("Invalid JSON boundaries in response".to_string())
    }
}

/// Remove trailing commas before closing braces/brackets
pub fn fix_trailing_commas(json_str: &str) -> String {
    TRAILING_COMMA_RE.replace_all(json_str, "$1").to_string()
}

/// Merge JavaScript-style string concatenations into one literal
pub fn fix_string_concatenation(json_str: &str) -> String {
    STRING_CONCAT_RE.replace_all(json_str, "").to_string()
}

fn apply_quick_fixes(json_str: &str) -> String {
    let fixed = fix_string_concatenation(json_str);
    fix_trailing_commas(&fixed)
}

/// Last-resort repair through the llm_json crate. The repair routine works
/// on arbitrary model output, so a panic inside it must not take the
/// request down.
fn repair_json(json_str: &str) -> Option<String> {
    let options = llm_json::RepairOptions::default();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        llm_json::repair_json(json_str, &options)
    }));

    match result {
        Ok(Ok(repaired)) => Some(repaired),
        Ok(Err(e)) => {
            tracing::debug!("JSON repair failed: {:?}", e);
            None
        }
        Err(_) => {
            tracing::warn!("JSON repair panicked");
            None
        }
    }
}

fn try_parse<T>(text: &str) -> Result<T, String>
where
    T: LlmResponse,
{
    let json_str = extract_json_string(text)?;

    // Fast path: the reply is already valid JSON
    if let Ok(parsed) = serde_json::from_str::<T>(&json_str) {
        return Ok(parsed);
    }

    let fixed_json = apply_quick_fixes(&json_str);
    if let Ok(parsed) = serde_json::from_str::<T>(&fixed_json) {
        tracing::debug!("JSON parsed after quick fixes");
        return Ok(parsed);
    }

    if let Some(repaired) = repair_json(&json_str) {
        if let Ok(parsed) = serde_json::from_str::<T>(&repaired) {
            tracing::debug!("JSON parsed after llm_json repair");
            return Ok(parsed);
        }
    }

    Err(format!(
        "Failed to parse JSON after all repair attempts. Original: {}",
        json_str.chars().take(200).collect::<String>()
    ))
}

/// Parse model output with graceful fallback.
///
/// Attempts extraction, direct parse, quick fixes and llm_json repair in
/// order. If everything fails the type's default value is returned, marked
/// as a fallback with the error message attached, so the caller can decide
/// what "unavailable" means.
pub fn parse_with_fallback<T>(text: &str) -> T
where
    T: LlmResponse,
{
    match try_parse::<T>(text) {
        Ok(parsed) => parsed,
        Err(error_msg) => {
            tracing::warn!("LLM response parsing failed, using fallback: {}", error_msg);
            let mut fallback = T::default();
            fallback.mark_as_fallback(error_msg);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    fn default_true() -> bool {
        true
    }

    #[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
    struct Suggestion {
        pub suggested_category: String,
        pub suggested_priority: String,

        #[serde(default = "default_true")]
        #[schemars(skip)]
        pub is_llm_success: bool,

        #[serde(skip_serializing_if = "Option::is_none")]
        #[schemars(skip)]
        pub llm_error_message: Option<String>,
    }

    impl LlmResponse for Suggestion {
        fn mark_as_fallback(&mut self, error_message: String) {
            self.is_llm_success = false;
            self.llm_error_message = Some(error_message);
        }

        fn is_success(&self) -> bool {
            self.is_llm_success
        }
    }

    #[test]
    fn test_extract_from_json_code_block() {
        let reply = "Here is my suggestion:\n\n```json\n{\"suggested_category\": \"billing\", \"suggested_priority\": \"low\"}\n```\n";

        let json = extract_json_string(reply).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.contains("\"suggested_category\""));
    }

    #[test]
    fn test_extract_from_generic_code_block() {
        let reply = "```\n{\"suggested_category\": \"account\"}\n```";

        let json = extract_json_string(reply).unwrap();
        assert_eq!(json, "{\"suggested_category\": \"account\"}");
    }

    #[test]
    fn test_extract_plain_json() {
        let reply = r#"{"suggested_category": "general", "suggested_priority": "medium"}"#;
        assert_eq!(extract_json_string(reply).unwrap(), reply);
    }

    #[test]
    fn test_extract_embedded_json_between_first_and_last_brace() {
        let reply = "Sure! {\"suggested_category\": \"technical\", \"suggested_priority\": \"high\"} Hope that helps.";

        let json = extract_json_string(reply).unwrap();
        assert_eq!(
            json,
            r#"{"suggested_category": "technical", "suggested_priority": "high"}"#
        );
    }

    #[test]
    fn test_extract_fails_without_json() {
        assert!(extract_json_string("no structured data here").is_err());
    }

    #[test]
    fn test_fix_trailing_commas() {
        let input = r#"{"suggested_category": "billing", "suggested_priority": "low",}"#;
        assert_eq!(
            fix_trailing_commas(input),
            r#"{"suggested_category": "billing", "suggested_priority": "low"}"#
        );

        let nested = r#"{"a": [1, 2,],}"#;
        assert_eq!(fix_trailing_commas(nested), r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn test_fix_string_concatenation() {
        let input = r#"{"suggested_category": "tech" + "nical"}"#;
        assert_eq!(
            fix_string_concatenation(input),
            r#"{"suggested_category": "technical"}"#
        );
    }

    #[test]
    fn test_parse_with_fallback_valid_reply() {
        let reply = r#"{"suggested_category": "technical", "suggested_priority": "high"}"#;

        let result: Suggestion = parse_with_fallback(reply);

        assert!(result.is_success());
        assert_eq!(result.suggested_category, "technical");
        assert_eq!(result.suggested_priority, "high");
        assert!(result.llm_error_message.is_none());
    }

    #[test]
    fn test_parse_with_fallback_trailing_comma_reply() {
        let reply = r#"{"suggested_category": "billing", "suggested_priority": "low",}"#;

        let result: Suggestion = parse_with_fallback(reply);

        assert!(result.is_success());
        assert_eq!(result.suggested_category, "billing");
    }

    #[test]
    fn test_parse_with_fallback_prose_reply_falls_back() {
        let result: Suggestion = parse_with_fallback("I could not classify this ticket.");

        assert!(!result.is_success());
        assert!(result.llm_error_message.is_some());
        assert!(result.suggested_category.is_empty());
    }

    #[test]
    fn test_json_schema_string_skips_internal_fields() {
        let schema = Suggestion::json_schema_string();

        assert!(schema.contains("suggested_category"));
        assert!(schema.contains("suggested_priority"));
        assert!(!schema.contains("is_llm_success"));
        assert!(!schema.contains("llm_error_message"));
    }
}
