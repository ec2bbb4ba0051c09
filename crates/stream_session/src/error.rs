use thiserror::Error;

/// Errors returned when writing to an [`OutboundSink`](crate::OutboundSink).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SinkError {
    /// The session already emitted its terminal signal. Late writes are
    /// dropped; callers treat this as a no-op.
    #[error("session already terminated")]
    Terminated,

    /// The receiving side of the stream has gone away.
    #[error("peer is no longer receiving")]
    PeerGone,

    /// A single-response call was handed a second message.
    #[error("unary response already written")]
    UnaryOverflow,
}

impl SinkError {
    /// Whether the error should end the session rather than be ignored.
    pub fn is_peer_gone(&self) -> bool {
        matches!(self, SinkError::PeerGone)
    }
}

/// How an inbound stream stopped being pumped.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PumpError {
    /// The peer signalled an error on its half of the stream.
    #[error("peer stream failed: {0}")]
    Peer(#[from] tonic::Status),
}

impl PumpError {
    /// The status carried by the failure, for handing back to the transport.
    pub fn status(&self) -> &tonic::Status {
        match self {
            PumpError::Peer(status) => status,
        }
    }
}
