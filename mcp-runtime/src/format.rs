//! Turns raw procedure results into MCP text content.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

use crate::args::ToolError;
use crate::to_pretty_json;

pub(crate) const PREVIEW_MAX_CHARS: usize = 4000;

/// Summary line plus an optional second text item.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ToolOutput {
    pub(crate) summary: String,
    pub(crate) detail: Option<String>,
}

impl ToolOutput {
    pub(crate) fn summary_only(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: None,
        }
    }

    fn with_detail(summary: impl Into<String>, detail: String) -> Self {
        Self {
            summary: summary.into(),
            detail: Some(detail),
        }
    }

    pub(crate) fn into_content(self) -> Value {
        let mut content = vec![json!({ "type": "text", "text": self.summary })];
        if let Some(detail) = self.detail {
            content.push(json!({ "type": "text", "text": detail }));
        }
        json!({ "content": content })
    }
}

/// Error results carry exactly one text item.
pub(crate) fn error_content(err: &ToolError) -> Value {
    json!({
        "isError": true,
        "content": [{ "type": "text", "text": err.display_message() }]
    })
}

fn status_only(value: &Value) -> Option<&str> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    obj.get("status").and_then(Value::as_str)
}

fn is_trivial(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// `summary` describes the call; the JSON item is added only when the
/// result has something worth reading.
pub(crate) fn summarize(summary: impl Into<String>, result: &Value) -> ToolOutput {
    let summary = summary.into();
    if let Some(status) = status_only(result) {
        return ToolOutput::summary_only(format!("{summary}: {status}"));
    }
    if is_trivial(result) {
        return ToolOutput::summary_only(summary);
    }
    ToolOutput::with_detail(summary, to_pretty_json(result))
}

fn approx_kb(encoded_len: usize) -> f64 {
    (encoded_len as f64 * 3.0 / 4.0) / 1024.0
}

fn size_line(encoded_len: usize) -> String {
    format!("approximate size {:.1} KB", approx_kb(encoded_len))
}

/// Exports come back base64 encoded. Text documents are decoded into a
/// bounded preview; binary documents only report their size.
pub(crate) fn export_preview(summary: impl Into<String>, result: &Value, is_text: bool) -> ToolOutput {
    let summary = summary.into();
    let Some(encoded) = result.as_str().filter(|s| !s.is_empty()) else {
        return summarize(summary, result);
    };

    if !is_text {
        return ToolOutput::summary_only(format!(
            "{summary} ({}, base64 encoded)",
            size_line(encoded.len())
        ));
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| e.to_string())
        .and_then(|bytes| String::from_utf8(bytes).map_err(|e| e.to_string()));
    let text = match decoded {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(error = %err, "export payload could not be decoded for preview");
            return ToolOutput::summary_only(format!(
                "{summary} ({}; preview unavailable, payload could not be decoded: {err})",
                size_line(encoded.len())
            ));
        }
    };

    let total_chars = text.chars().count();
    if total_chars <= PREVIEW_MAX_CHARS {
        return ToolOutput::with_detail(summary, text);
    }
    let mut preview: String = text.chars().take(PREVIEW_MAX_CHARS).collect();
    preview.push_str(&format!(
        "\n... [truncated: showing {PREVIEW_MAX_CHARS} of {total_chars} characters]"
    ));
    ToolOutput::with_detail(summary, preview)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str) -> Value {
        Value::String(STANDARD.encode(text))
    }

    #[test]
    fn trivial_results_have_no_json_item() {
        for value in [json!(null), json!(""), json!([]), json!({})] {
            let out = summarize("Listed groups", &value);
            assert_eq!(out.detail, None, "{value}");
            assert_eq!(out.summary, "Listed groups");
        }
    }

    #[test]
    fn status_only_object_folds_into_summary() {
        let out = summarize("Activated survey 12", &json!({"status": "OK"}));
        assert_eq!(out, ToolOutput::summary_only("Activated survey 12: OK"));
    }

    #[test]
    fn non_trivial_result_is_pretty_printed() {
        let out = summarize("Found surveys", &json!([{"sid": 1}]));
        let detail = out.detail.unwrap();
        assert!(detail.contains("\"sid\": 1"));
        assert!(detail.contains('\n'));
    }

    #[test]
    fn csv_export_is_decoded() {
        let out = export_preview("Exported responses", &encode("id,q1\n1,yes\n"), true);
        assert_eq!(out.detail.as_deref(), Some("id,q1\n1,yes\n"));
    }

    #[test]
    fn long_text_export_is_truncated_with_note() {
        let body = "x".repeat(PREVIEW_MAX_CHARS + 10);
        let out = export_preview("Exported", &encode(&body), true);
        let detail = out.detail.unwrap();
        assert!(detail.starts_with(&"x".repeat(PREVIEW_MAX_CHARS)));
        assert!(detail.contains("truncated: showing 4000 of 4010 characters"));
    }

    #[test]
    fn binary_export_reports_size_only() {
        let payload = Value::String("A".repeat(4096));
        let out = export_preview("Exported statistics", &payload, false);
        assert_eq!(out.detail, None);
        assert_eq!(
            out.summary,
            "Exported statistics (approximate size 3.0 KB, base64 encoded)"
        );
    }

    #[test]
    fn undecodable_text_export_reports_size_and_note() {
        let out = export_preview("Exported", &json!("@@not base64@@"), true);
        assert_eq!(out.detail, None);
        assert!(out.summary.contains("approximate size"));
        assert!(out.summary.contains("could not be decoded"));
    }

    #[test]
    fn non_string_export_result_is_summarized() {
        let out = export_preview("Exported", &json!({"status": "No Response found"}), true);
        assert_eq!(out.summary, "Exported: No Response found");
    }

    #[test]
    fn error_content_has_one_item() {
        let payload = error_content(&ToolError::new("x", ""));
        assert_eq!(payload["isError"], true);
        assert_eq!(payload["content"].as_array().unwrap().len(), 1);
        assert_eq!(payload["content"][0]["text"], "Unknown error");
    }
}
