use serde_json::{Map, Value};
use survey_bridge_core::GatewayError;

#[derive(Debug, Clone)]
pub(crate) struct ToolError {
    pub(crate) code: String,
    pub(crate) message: String,
    pub(crate) field: Option<String>,
}

impl ToolError {
    pub(crate) fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: None,
        }
    }

    pub(crate) fn validation(key: &str, message: impl Into<String>) -> Self {
        Self::new("validation_failed", message).with_field(key)
    }

    pub(crate) fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Text shown to the caller; never empty.
    pub(crate) fn display_message(&self) -> &str {
        if self.message.trim().is_empty() {
            "Unknown error"
        } else {
            &self.message
        }
    }
}

impl From<GatewayError> for ToolError {
    fn from(err: GatewayError) -> Self {
        ToolError::new(err.code(), err.to_string())
    }
}

fn parse_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub(crate) fn arg_bool(args: &Map<String, Value>, key: &str, default: bool) -> Result<bool, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(v)) => Ok(*v),
        Some(_) => Err(ToolError::validation(key, format!("'{key}' must be a boolean"))),
    }
}

pub(crate) fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    let value = args
        .get(key)
        .ok_or_else(|| ToolError::validation(key, format!("Missing required field '{key}'")))?;
    match value {
        Value::String(v) if !v.trim().is_empty() => Ok(v.clone()),
        Value::String(_) => Err(ToolError::validation(key, format!("'{key}' must not be empty"))),
        _ => Err(ToolError::validation(key, format!("'{key}' must be a string"))),
    }
}

pub(crate) fn arg_optional_string(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(v)) if v.trim().is_empty() => Ok(None),
        Some(Value::String(v)) => Ok(Some(v.clone())),
        Some(_) => Err(ToolError::validation(key, format!("'{key}' must be a string"))),
    }
}

/// Integer IDs are accepted as JSON numbers or numeric strings.
pub(crate) fn required_i64(args: &Map<String, Value>, key: &str) -> Result<i64, ToolError> {
    let value = args
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ToolError::validation(key, format!("Missing required field '{key}'")))?;
    parse_i64(value)
        .ok_or_else(|| ToolError::validation(key, format!("'{key}' must be an integer")))
}

pub(crate) fn arg_optional_i64(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<i64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_i64(value)
            .map(Some)
            .ok_or_else(|| ToolError::validation(key, format!("'{key}' must be an integer"))),
    }
}

pub(crate) fn arg_i64(args: &Map<String, Value>, key: &str, default: i64) -> Result<i64, ToolError> {
    Ok(arg_optional_i64(args, key)?.unwrap_or(default))
}

pub(crate) fn arg_optional_string_array(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<String>>, ToolError> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let items = value
        .as_array()
        .ok_or_else(|| ToolError::validation(key, format!("'{key}' must be an array of strings")))?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let text = item
            .as_str()
            .ok_or_else(|| ToolError::validation(key, format!("'{key}' items must be strings")))?;
        let normalized = text.trim();
        if !normalized.is_empty() {
            out.push(normalized.to_string());
        }
    }
    Ok(Some(out))
}

pub(crate) fn arg_optional_i64_array(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<i64>>, ToolError> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let items = value
        .as_array()
        .ok_or_else(|| ToolError::validation(key, format!("'{key}' must be an array of integers")))?;
    items
        .iter()
        .map(|item| {
            parse_i64(item)
                .ok_or_else(|| ToolError::validation(key, format!("'{key}' items must be integers")))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

pub(crate) fn required_i64_array(args: &Map<String, Value>, key: &str) -> Result<Vec<i64>, ToolError> {
    match arg_optional_i64_array(args, key)? {
        Some(ids) if !ids.is_empty() => Ok(ids),
        Some(_) => Err(ToolError::validation(key, format!("'{key}' must not be empty"))),
        None => Err(ToolError::validation(key, format!("Missing required field '{key}'"))),
    }
}

pub(crate) fn arg_optional_object(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<Map<String, Value>>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(_) => Err(ToolError::validation(key, format!("'{key}' must be an object"))),
    }
}

pub(crate) fn required_object(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Map<String, Value>, ToolError> {
    match arg_optional_object(args, key)? {
        Some(map) if !map.is_empty() => Ok(map),
        Some(_) => Err(ToolError::validation(key, format!("'{key}' must not be empty"))),
        None => Err(ToolError::validation(key, format!("Missing required field '{key}'"))),
    }
}

pub(crate) fn required_object_array(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Vec<Map<String, Value>>, ToolError> {
    let items = match args.get(key) {
        None | Some(Value::Null) => {
            return Err(ToolError::validation(key, format!("Missing required field '{key}'")));
        }
        Some(Value::Array(items)) if !items.is_empty() => items,
        Some(Value::Array(_)) => {
            return Err(ToolError::validation(key, format!("'{key}' must not be empty")));
        }
        Some(_) => {
            return Err(ToolError::validation(key, format!("'{key}' must be an array of objects")));
        }
    };
    items
        .iter()
        .map(|item| {
            item.as_object()
                .cloned()
                .ok_or_else(|| ToolError::validation(key, format!("'{key}' items must be objects")))
        })
        .collect()
}

/// Fixed vocabulary argument, falling back to `default` when absent.
pub(crate) fn arg_enum<E>(
    args: &Map<String, Value>,
    key: &str,
    default: E,
    parse: fn(&str) -> Option<E>,
    allowed: &[&str],
) -> Result<E, ToolError> {
    match arg_optional_string(args, key)? {
        None => Ok(default),
        Some(raw) => parse(&raw).ok_or_else(|| {
            ToolError::validation(
                key,
                format!("'{key}' must be one of: {} (got '{raw}')", allowed.join(", ")),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use survey_bridge_core::ResponseFormat;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn ids_accept_numbers_and_numeric_strings() {
        let a = args(json!({"survey_id": 123456, "group_id": "12", "bad": "x"}));
        assert_eq!(required_i64(&a, "survey_id").unwrap(), 123456);
        assert_eq!(arg_optional_i64(&a, "group_id").unwrap(), Some(12));
        assert_eq!(arg_optional_i64(&a, "missing").unwrap(), None);

        let err = required_i64(&a, "bad").unwrap_err();
        assert_eq!(err.code, "validation_failed");
        assert_eq!(err.field.as_deref(), Some("bad"));
        assert!(required_i64(&a, "missing").is_err());
    }

    #[test]
    fn empty_optional_strings_become_none() {
        let a = args(json!({"language": "  ", "owner": "admin"}));
        assert_eq!(arg_optional_string(&a, "language").unwrap(), None);
        assert_eq!(arg_optional_string(&a, "owner").unwrap().as_deref(), Some("admin"));
        assert!(required_string(&a, "language").is_err());
    }

    #[test]
    fn object_arrays_reject_scalars() {
        let a = args(json!({"participants": [{"email": "a@example.org"}, 3]}));
        let err = required_object_array(&a, "participants").unwrap_err();
        assert!(err.message.contains("items must be objects"));

        let a = args(json!({"participants": []}));
        assert!(required_object_array(&a, "participants").is_err());
    }

    #[test]
    fn choice_lists_allowed_values_on_mismatch() {
        let a = args(json!({"format": "PDF", "other": "rtf"}));
        let names = ResponseFormat::names();
        assert_eq!(
            arg_enum(&a, "format", ResponseFormat::Csv, ResponseFormat::parse, &names).unwrap(),
            ResponseFormat::Pdf
        );
        assert_eq!(
            arg_enum(&a, "absent", ResponseFormat::Csv, ResponseFormat::parse, &names).unwrap(),
            ResponseFormat::Csv
        );
        let err = arg_enum(&a, "other", ResponseFormat::Csv, ResponseFormat::parse, &names)
            .unwrap_err();
        assert!(err.message.contains("csv, json, xls, pdf, doc, html, txt"));
    }

    #[test]
    fn blank_tool_error_message_falls_back() {
        assert_eq!(ToolError::new("x", " ").display_message(), "Unknown error");
        assert_eq!(ToolError::new("x", "boom").display_message(), "boom");
    }
}
