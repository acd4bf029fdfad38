//! Wire types for the remote JSON-RPC endpoint.
//!
//! Outbound: `{"method": "...", "params": [...], "id": n}`.
//! Inbound: `{"id": n, "result": ..., "error": ...}`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GatewayError;

/// One positional argument of a remote procedure call.
///
/// Serialized untagged, so `Param::Text("x")` goes on the wire as `"x"`
/// and `Param::Null` as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    TextList(Vec<String>),
    IntList(Vec<i64>),
    Record(Map<String, Value>),
    Records(Vec<Map<String, Value>>),
}

impl Param {
    /// Absent optional arguments keep their slot as an explicit `null`.
    pub fn optional<T: Into<Param>>(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Param::Null)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<&String> for Param {
    fn from(value: &String) -> Self {
        Param::Text(value.clone())
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Bool(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<Vec<String>> for Param {
    fn from(value: Vec<String>) -> Self {
        Param::TextList(value)
    }
}

impl From<Vec<i64>> for Param {
    fn from(value: Vec<i64>) -> Self {
        Param::IntList(value)
    }
}

impl From<Map<String, Value>> for Param {
    fn from(value: Map<String, Value>) -> Self {
        Param::Record(value)
    }
}

impl From<Vec<Map<String, Value>>> for Param {
    fn from(value: Vec<Map<String, Value>>) -> Self {
        Param::Records(value)
    }
}

/// Outbound request body. Constructed per call and discarded.
#[derive(Clone, Serialize)]
pub struct RpcRequest {
    pub method: String,
    pub params: Vec<Param>,
    pub id: u64,
}

// Params can carry the password, so Debug only shows their count.
impl fmt::Debug for RpcRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcRequest")
            .field("method", &self.method)
            .field("params", &format_args!("[{} params]", self.params.len()))
            .field("id", &self.id)
            .finish()
    }
}

/// Decoded response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcEnvelope {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl RpcEnvelope {
    /// Split into the result value or a `RemoteProcedure` error.
    ///
    /// `null`, `""` and `{}` in the error slot do not count as errors, and a
    /// missing result is reported as `Value::Null`.
    pub fn into_result(self, procedure: &str) -> Result<Value, GatewayError> {
        if let Some(error) = self.error.filter(|e| !is_blank(e)) {
            return Err(GatewayError::RemoteProcedure {
                procedure: procedure.to_string(),
                fault: RemoteFault::from_value(error),
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Error payload as the remote endpoint sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteFault {
    Message(String),
    Coded { code: i64, message: String },
    Other(Value),
}

impl RemoteFault {
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(RemoteFault::Other(value))
    }
}

impl fmt::Display for RemoteFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFault::Message(message) => write!(f, "{message}"),
            RemoteFault::Coded { code, message } => write!(f, "{message} (code {code})"),
            RemoteFault::Other(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_serialize_positionally() {
        let mut record = Map::new();
        record.insert("email".to_string(), json!("a@example.org"));
        let request = RpcRequest {
            method: "add_participants".to_string(),
            params: vec![
                Param::from("KEY"),
                Param::Int(123456),
                Param::Records(vec![record]),
                Param::Bool(true),
                Param::optional(None::<String>),
            ],
            id: 7,
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(
            wire,
            json!({
                "method": "add_participants",
                "params": ["KEY", 123456, [{"email": "a@example.org"}], true, null],
                "id": 7
            })
        );
    }

    #[test]
    fn debug_hides_param_values() {
        let request = RpcRequest {
            method: "authenticate".to_string(),
            params: vec![Param::from("admin"), Param::from("hunter2")],
            id: 1,
        };
        let rendered = format!("{request:?}");
        assert!(rendered.contains("authenticate"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn envelope_returns_empty_results_verbatim() {
        for result in [json!(null), json!([]), json!({})] {
            let envelope: RpcEnvelope =
                serde_json::from_value(json!({"id": 1, "result": result.clone(), "error": null}))
                    .unwrap();
            assert_eq!(envelope.into_result("list_surveys").unwrap(), result);
        }

        let envelope: RpcEnvelope = serde_json::from_value(json!({"id": 1})).unwrap();
        assert_eq!(envelope.into_result("list_surveys").unwrap(), Value::Null);
    }

    #[test]
    fn blank_error_members_are_not_failures() {
        for error in [json!(null), json!(""), json!({})] {
            let envelope: RpcEnvelope =
                serde_json::from_value(json!({"id": 1, "result": "ok", "error": error})).unwrap();
            assert_eq!(envelope.into_result("x").unwrap(), json!("ok"));
        }
    }

    #[test]
    fn error_member_wins_over_result() {
        let envelope: RpcEnvelope = serde_json::from_value(
            json!({"id": 1, "result": {"status": "OK"}, "error": "Invalid session key"}),
        )
        .unwrap();
        let err = envelope.into_result("list_surveys").unwrap_err();
        assert_eq!(
            err.remote_fault(),
            Some(&RemoteFault::Message("Invalid session key".to_string()))
        );
    }

    #[test]
    fn structured_faults_keep_code_and_message() {
        let fault = RemoteFault::from_value(json!({"code": -32000, "message": "Permission denied"}));
        assert_eq!(
            fault,
            RemoteFault::Coded {
                code: -32000,
                message: "Permission denied".to_string()
            }
        );
        assert_eq!(fault.to_string(), "Permission denied (code -32000)");

        let fault = RemoteFault::from_value(json!(["odd", 1]));
        assert_eq!(fault, RemoteFault::Other(json!(["odd", 1])));
        assert_eq!(fault.to_string(), r#"["odd",1]"#);
    }
}
