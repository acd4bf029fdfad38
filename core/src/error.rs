use crate::rpc::RemoteFault;

/// Everything the gateway can fail with. Callers see these unchanged;
/// only the tool adapters turn them into user-visible error results.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A credential required for authentication is not configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The authenticate procedure answered, but not with a usable session key.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The remote endpoint could not be reached or did not speak JSON.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The endpoint answered with an `error` member. The payload is kept verbatim.
    #[error("Remote procedure '{procedure}' failed: {fault}")]
    RemoteProcedure {
        procedure: String,
        fault: RemoteFault,
    },
}

impl GatewayError {
    /// Stable machine-readable code, mirrored into tool error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Configuration(_) => codes::CONFIGURATION_ERROR,
            GatewayError::Authentication(_) => codes::AUTHENTICATION_FAILED,
            GatewayError::Transport(_) => codes::TRANSPORT_ERROR,
            GatewayError::RemoteProcedure { .. } => codes::REMOTE_PROCEDURE_ERROR,
        }
    }

    pub fn remote_fault(&self) -> Option<&RemoteFault> {
        match self {
            GatewayError::RemoteProcedure { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, TLS or timeout failure reported by the HTTP client.
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("remote endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Decode(String),
}

/// Error codes used across the gateway and tool adapters
pub mod codes {
    pub const CONFIGURATION_ERROR: &str = "configuration_error";
    pub const AUTHENTICATION_FAILED: &str = "authentication_failed";
    pub const TRANSPORT_ERROR: &str = "transport_error";
    pub const REMOTE_PROCEDURE_ERROR: &str = "remote_procedure_error";
}
