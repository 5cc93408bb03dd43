//! Parsing of the model's analysis reply
//!
//! Models like to wrap JSON in Markdown fences even when told not to. The
//! fences are removed; anything else around the object is an error.

use tracing::warn;

use crate::error::{Error, Result};

use super::types::AnalysisResult;

const MAX_ALERTS: usize = 2;
const EXPECTED_INSIGHTS: usize = 3;
const EXPECTED_ACTIONS: usize = 3;

/// Remove a surrounding ```` ```json ```` / ```` ``` ```` fence, if any
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop the info string ("json", "JSON", ...) on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parse the reply into an [`AnalysisResult`]
///
/// Count rules (≤2 alerts, 3 insights, 3 actions) are logged when broken but
/// the reply is still returned as the model produced it.
pub fn parse_analysis_response(raw: &str) -> Result<AnalysisResult> {
    let json = strip_code_fences(raw);

    let result: AnalysisResult = serde_json::from_str(json).map_err(|e| Error::BadAiResponse {
        message: format!("AI reply is not valid analysis JSON: {}", e),
        raw: raw.to_string(),
    })?;

    if result.alerts.len() > MAX_ALERTS {
        warn!("AI returned {} alerts (max {})", result.alerts.len(), MAX_ALERTS);
    }
    if result.insights.len() != EXPECTED_INSIGHTS {
        warn!(
            "AI returned {} insights (expected {})",
            result.insights.len(),
            EXPECTED_INSIGHTS
        );
    }
    if result.action_plan.len() != EXPECTED_ACTIONS {
        warn!(
            "AI returned {} actions (expected {})",
            result.action_plan.len(),
            EXPECTED_ACTIONS
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"alerts":[],"insights":["x","y","z"],"action_plan":[{"action":"a","details":"b"},{"action":"c","details":"d"},{"action":"e","details":"f"}]}"#;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences(&format!("```json\n{}\n```", BODY)), BODY);
        assert_eq!(strip_code_fences(&format!("```\n{}\n```\n", BODY)), BODY);
        assert_eq!(strip_code_fences(&format!("```json{}```", BODY)), BODY);
        assert_eq!(strip_code_fences(&format!("  {}  ", BODY)), BODY);
    }

    #[test]
    fn test_parse_fenced_reply() {
        let result = parse_analysis_response(&format!("```json\n{}\n```", BODY)).unwrap();

        assert!(result.alerts.is_empty());
        assert_eq!(result.insights, vec!["x", "y", "z"]);
        assert_eq!(result.action_plan[1].action.as_deref(), Some("c"));
        assert_eq!(result.action_plan[2].details.as_deref(), Some("f"));
    }

    #[test]
    fn test_parse_alert_type_field() {
        let raw = r#"{"alerts":[{"type":"inventory","message":"Sắp hết hàng"}],"insights":[],"action_plan":[]}"#;
        let result = parse_analysis_response(raw).unwrap();

        assert_eq!(result.alerts[0].alert_type.as_deref(), Some("inventory"));
        assert_eq!(result.alerts[0].message.as_deref(), Some("Sắp hết hàng"));
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = r#"{"alerts":[{"type":"stock","message":"m","severity":"high"},{"message":"no type"}],"insights":["x","y","z"],"action_plan":[{"action":"a","details":"b","owner":"shop"}],"summary":"s"}"#;
        let result = parse_analysis_response(raw).unwrap();

        assert_eq!(result.alerts[1].alert_type, None);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::from_str::<serde_json::Value>(raw).unwrap()
        );
    }

    #[test]
    fn test_count_mismatch_is_not_an_error() {
        let raw = r#"{"alerts":[],"insights":["only one"],"action_plan":[]}"#;
        let result = parse_analysis_response(raw).unwrap();
        assert_eq!(result.insights.len(), 1);
    }

    #[test]
    fn test_unparseable_reply_keeps_raw_text() {
        let raw = "```json\nXin lỗi, tôi không thể phân tích dữ liệu này.\n```";
        match parse_analysis_response(raw) {
            Err(Error::BadAiResponse { raw: kept, .. }) => assert_eq!(kept, raw),
            other => panic!("expected BadAiResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_shape_is_bad_response() {
        let err = parse_analysis_response(r#"{"alerts": "none"}"#).unwrap_err();
        assert!(matches!(err, Error::BadAiResponse { .. }));

        let err = parse_analysis_response("").unwrap_err();
        assert!(matches!(err, Error::BadAiResponse { .. }));
    }
}
