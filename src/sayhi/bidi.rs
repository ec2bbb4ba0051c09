use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use stream_session::{Deadline, OutboundSink, PeerSink, StreamObserver, Terminal};
use tonic::Status;
use tracing::{debug, info, warn};

use crate::sayhi::server_message;
use crate::sayhi_proto::{HiRequest, HiResponse};

/// A bidirectional echo session.
///
/// While active, every inbound message is answered with exactly one
/// `hi back #{n}`. The session ends on whichever comes first: the window
/// deadline, the peer completing its half, or the peer failing. All four
/// entry points take the same lock, and the sink hands out the terminal signal
/// only once, so exactly one of them wins.
pub struct BidiEchoSession<S> {
    state: Mutex<EchoState<S>>,
}

struct EchoState<S> {
    sink: OutboundSink<HiResponse, S>,
    message_count: u32,
    peer_name: String,
    deadline: Option<Deadline>,
}

impl<S> EchoState<S> {
    fn disarm(&self) {
        if let Some(deadline) = &self.deadline {
            deadline.cancel();
        }
    }
}

/// Point-in-time view of a session, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub message_count: u32,
    pub peer_name: String,
    pub active: bool,
    pub terminal: Option<Terminal>,
}

impl<S> BidiEchoSession<S>
where
    S: PeerSink<HiResponse> + 'static,
{
    /// Open a session and arm its window.
    pub fn start(sink: OutboundSink<HiResponse, S>, window: Duration) -> Arc<Self> {
        let session = Arc::new(Self {
            state: Mutex::new(EchoState {
                sink,
                message_count: 0,
                peer_name: String::new(),
                deadline: None,
            }),
        });

        let weak = Arc::downgrade(&session);
        let deadline = Deadline::arm(window, move || {
            if let Some(session) = weak.upgrade() {
                session.on_deadline();
            }
        });
        session.lock().deadline = Some(deadline);

        info!(window_ms = window.as_millis() as u64, "Bidirectional session opened");
        session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            message_count: state.message_count,
            peer_name: state.peer_name.clone(),
            active: state.sink.is_active(),
            terminal: state.sink.terminal(),
        }
    }

    fn on_deadline(&self) {
        let mut state = self.lock();
        if state.sink.complete() {
            info!(
                messages = state.message_count,
                peer = %state.peer_name,
                "Window elapsed, closing stream"
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, EchoState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> StreamObserver<HiRequest> for BidiEchoSession<S>
where
    S: PeerSink<HiResponse> + 'static,
{
    fn on_next(&self, request: HiRequest) {
        let mut state = self.lock();
        if !state.sink.is_active() {
            debug!(sender = %request.sender, "Dropping message after termination");
            return;
        }

        state.message_count += 1;
        state.peer_name = request.sender;
        let n = state.message_count;
        info!(n, message = %request.message, peer = %state.peer_name, "Received");

        match state.sink.send(server_message(format!("hi back #{n}"))) {
            Ok(()) => {}
            Err(e) if e.is_peer_gone() => {
                warn!(n, "Peer stopped receiving, abandoning session");
                state.sink.abandon();
                state.disarm();
            }
            Err(e) => debug!(n, error = %e, "Echo not sent"),
        }
    }

    fn on_error(&self, status: Status) {
        let mut state = self.lock();
        warn!(error = %status, messages = state.message_count, "Peer stream failed");
        if state.sink.abandon() {
            state.disarm();
        }
    }

    fn on_completed(&self) {
        let mut state = self.lock();
        info!(messages = state.message_count, "Peer completed");
        if state.sink.complete() {
            state.disarm();
        }
    }
}
