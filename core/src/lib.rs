//! Session-key gateway for the survey platform's JSON-RPC administrative API.

pub mod config;
pub mod error;
pub mod gateway;
pub mod procedures;
pub mod rpc;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{Credentials, GatewayConfig};
pub use error::{GatewayError, TransportError};
pub use gateway::{Gateway, SessionKeys};
pub use procedures::{
    CompletionStatus, ExportOptions, HeadingType, ParticipantQuery, ResponseFormat, ResponseType,
    StatisticsFormat, SurveyImportFormat, TimelinePeriod, decode_string_list, procedure,
};
pub use rpc::{Param, RemoteFault, RpcEnvelope, RpcRequest};
pub use transport::{HttpTransport, Transport};
