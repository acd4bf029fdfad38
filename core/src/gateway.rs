//! The single authenticated channel to the remote API.
//!
//! A [`Gateway`] owns the transport, the configured credentials and the
//! cached session key. Every typed procedure (see `procedures.rs`) goes
//! through [`Gateway::call_with_session`], which obtains the key lazily and
//! puts it in front of the procedure's own arguments.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::OnceCell;

use crate::config::{Credentials, GatewayConfig, non_empty};
use crate::error::{GatewayError, TransportError};
use crate::procedures::procedure;
use crate::rpc::{Param, RpcEnvelope, RpcRequest};
use crate::transport::{HttpTransport, Transport};

/// Holder for the process-wide session key.
///
/// The key lives in a `OnceCell`, so concurrent first callers share one
/// in-flight authentication. Releasing swaps in a fresh cell; callers that
/// still hold the old `Arc` finish against the old key.
#[derive(Default)]
pub struct SessionKeys {
    current: Mutex<Arc<OnceCell<String>>>,
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("cached", &self.cell().initialized())
            .finish()
    }
}

impl SessionKeys {
    fn cell(&self) -> Arc<OnceCell<String>> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn cached(&self) -> Option<String> {
        self.cell().get().cloned()
    }

    fn reset_if_current(&self, cell: &Arc<OnceCell<String>>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if Arc::ptr_eq(&current, cell) {
            *current = Arc::new(OnceCell::new());
        }
    }
}

pub struct Gateway<T = HttpTransport> {
    transport: T,
    credentials: Credentials,
    session: SessionKeys,
    next_id: AtomicU64,
}

impl Gateway<HttpTransport> {
    /// Build a gateway speaking HTTP to `config.endpoint`. No request is sent yet.
    pub fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        let transport = HttpTransport::new(config.endpoint, config.timeout)?;
        Ok(Self::with_transport(transport, config.credentials))
    }
}

impl<T: Transport> Gateway<T> {
    pub fn with_transport(transport: T, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            session: SessionKeys::default(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn has_token(&self) -> bool {
        self.session.cached().is_some()
    }

    /// Send one procedure call and unwrap its envelope.
    ///
    /// Returns `result` verbatim, including `null`, `[]` and `{}`. A non-empty
    /// `error` member becomes [`GatewayError::RemoteProcedure`] even when the
    /// HTTP exchange itself succeeded.
    pub async fn invoke(&self, procedure: &str, params: Vec<Param>) -> Result<Value, GatewayError> {
        let request = RpcRequest {
            method: procedure.to_string(),
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let body = self.transport.send(&request).await?;
        let envelope: RpcEnvelope = serde_json::from_value(body).map_err(|e| {
            TransportError::Decode(format!("response is not a JSON-RPC envelope: {e}"))
        })?;

        let outcome = envelope.into_result(procedure);
        if let Err(err) = &outcome {
            tracing::debug!(procedure, id = request.id, error = %err, "remote procedure returned an error");
        }
        outcome
    }

    /// Return the cached session key, authenticating first if there is none.
    pub async fn get_token(&self) -> Result<String, GatewayError> {
        let cell = self.session.cell();
        let token = cell.get_or_try_init(|| self.authenticate()).await?;
        Ok(token.clone())
    }

    async fn authenticate(&self) -> Result<String, GatewayError> {
        let username = non_empty(self.credentials.username.as_deref()).ok_or_else(|| {
            GatewayError::Configuration("username is not configured (set SURVEY_USERNAME)".to_string())
        })?;
        let password = non_empty(self.credentials.password.as_deref()).ok_or_else(|| {
            GatewayError::Configuration("password is not configured (set SURVEY_PASSWORD)".to_string())
        })?;

        tracing::info!(username, "requesting session key");
        let value = self
            .invoke(procedure::AUTHENTICATE, vec![username.into(), password.into()])
            .await?;

        match value {
            Value::String(token) if !token.trim().is_empty() => Ok(token),
            other => Err(GatewayError::Authentication(format!(
                "empty or invalid response from {}: {}",
                procedure::AUTHENTICATE,
                describe_invalid_token(&other)
            ))),
        }
    }

    /// Release the cached session key. Best effort: failures are logged and
    /// reported as `false`, never raised. Without a cached key this is a no-op.
    pub async fn release_token(&self) -> bool {
        let cell = self.session.cell();
        let Some(token) = cell.get().cloned() else {
            return true;
        };

        match self
            .invoke(procedure::RELEASE_TOKEN, vec![Param::Text(token)])
            .await
        {
            Ok(_) => {
                self.session.reset_if_current(&cell);
                tracing::info!("session key released");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to release session key");
                false
            }
        }
    }

    /// Invoke `procedure` with the session key as first argument.
    pub async fn call_with_session(
        &self,
        procedure: &str,
        args: Vec<Param>,
    ) -> Result<Value, GatewayError> {
        let token = self.get_token().await?;
        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(Param::Text(token));
        params.extend(args);
        self.invoke(procedure, params).await
    }
}

fn describe_invalid_token(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(_) => "empty string".to_string(),
        Value::Object(map) => match map.get("status").and_then(Value::as_str) {
            Some(status) => status.to_string(),
            None => "object".to_string(),
        },
        Value::Array(_) => "array".to_string(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
    }
}
