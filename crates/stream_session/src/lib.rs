//! Building blocks for callback-style streaming RPC sessions on tonic.
//!
//! A session is an observer with three inbound callbacks
//! ([`StreamObserver`]), an outbound half that emits at most one terminal
//! signal ([`OutboundSink`]), and optionally a one-shot [`Deadline`]. Handlers
//! keep the sink and their counters behind one lock so message arrival, peer
//! completion, peer error and deadline expiry all serialize on the same gate.

pub mod clock;
pub mod config;
pub mod error;
pub mod observer;
pub mod sink;

pub use clock::{Deadline, DeadlineState};
pub use config::SessionConfig;
pub use error::{PumpError, SinkError};
pub use observer::{StreamObserver, pump, spawn_pump};
pub use sink::{ABANDONED, ChannelSink, OutboundSink, PeerSink, ResponseStream, Terminal, UnaryReply};
