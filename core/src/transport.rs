use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::error::TransportError;
use crate::rpc::RpcRequest;

const ERROR_BODY_MAX_CHARS: usize = 512;

/// Delivers one request body to the remote endpoint and hands back the
/// decoded JSON response. Envelope interpretation belongs to the gateway.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &RpcRequest,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// reqwest-backed transport: one POST per call against a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let endpoint = endpoint.into();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| TransportError::Request {
                endpoint: endpoint.clone(),
                source,
            })?;
        Ok(Self { http, endpoint })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &RpcRequest) -> Result<Value, TransportError> {
        tracing::debug!(procedure = %request.method, id = request.id, "sending remote procedure call");

        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        if !status.is_success() {
            let body: String = String::from_utf8_lossy(&bytes)
                .chars()
                .take(ERROR_BODY_MAX_CHARS)
                .collect();
            tracing::warn!(procedure = %request.method, status = status.as_u16(), "remote endpoint rejected request");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::Param;

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_error() {
        let transport =
            HttpTransport::new("http://127.0.0.1:9/jsonrpc", Duration::from_secs(2)).unwrap();
        let request = RpcRequest {
            method: "list_surveys".to_string(),
            params: vec![Param::from("KEY"), Param::Null],
            id: 1,
        };

        let err = transport
            .send(&request)
            .await
            .expect_err("nothing listens on the discard port");

        assert!(matches!(err, TransportError::Request { .. }));
        assert!(err.to_string().contains("127.0.0.1:9"));
    }
}
