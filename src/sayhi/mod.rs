//! The SayHi service: one handler per RPC interaction pattern.

pub mod bidi;
pub mod client_stream;
pub mod server_stream;
pub mod service;

pub use bidi::BidiEchoSession;
pub use client_stream::HiCounter;
pub use service::SayHiServiceImpl;

use crate::sayhi_proto::{HiRequest, HiResponse};

/// Sender name stamped on every server-originated message.
pub const SERVER_SENDER: &str = "server";

/// The unary reply. It ignores the request content.
pub fn unary_reply(_request: &HiRequest) -> HiResponse {
    server_message("hi".to_string())
}

pub(crate) fn server_message(message: String) -> HiResponse {
    HiResponse {
        message,
        sender: SERVER_SENDER.to_string(),
    }
}

/// The interaction pattern a call was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Unary,
    ClientStream,
    ServerStream,
    Bidirectional,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Unary => "unary",
            Pattern::ClientStream => "client_stream",
            Pattern::ServerStream => "server_stream",
            Pattern::Bidirectional => "bidirectional",
        }
    }

    /// Span covering one call, tagged with a fresh call id.
    pub(crate) fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "rpc",
            pattern = self.as_str(),
            call = %uuid::Uuid::new_v4()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unary_reply_ignores_input() {
        for (message, sender) in [("hi", "alice"), ("", ""), ("hello there", "server")] {
            let reply = unary_reply(&HiRequest {
                message: message.to_string(),
                sender: sender.to_string(),
            });
            assert_eq!(reply.message, "hi");
            assert_eq!(reply.sender, "server");
        }
    }
}
