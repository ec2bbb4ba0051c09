use thiserror::Error;

/// Errors that can occur while reading process configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors that can occur while the client simulator drives a call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimulatorError {
    /// Failed to connect to the gRPC endpoint.
    #[error("failed to connect: {0}")]
    Connect(#[from] tonic::transport::Error),

    /// The call failed with a gRPC status.
    #[error("rpc failed: {}", .0.message())]
    Rpc(#[from] tonic::Status),

    /// The bounded wait for the session to resolve elapsed.
    #[error("timeout waiting for {0}")]
    Timeout(&'static str),
}
