use std::sync::{Mutex, MutexGuard, PoisonError};

use stream_session::{OutboundSink, PeerSink, StreamObserver};
use tonic::Status;
use tracing::{info, warn};

use crate::sayhi_proto::{HiCountResponse, HiRequest};

/// Counts the messages of a client-streaming call and answers once the peer
/// completes.
///
/// The most recent sender is reported as the peer name; with several distinct
/// senders in one call, the last one wins.
pub struct HiCounter<S> {
    state: Mutex<CounterState<S>>,
}

struct CounterState<S> {
    sink: OutboundSink<HiCountResponse, S>,
    count: i32,
    peer_name: String,
}

impl<S> HiCounter<S>
where
    S: PeerSink<HiCountResponse>,
{
    pub fn new(sink: OutboundSink<HiCountResponse, S>) -> Self {
        Self {
            state: Mutex::new(CounterState {
                sink,
                count: 0,
                peer_name: String::new(),
            }),
        }
    }

    pub fn count(&self) -> i32 {
        self.lock().count
    }

    fn lock(&self) -> MutexGuard<'_, CounterState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The single response of a client-streaming call.
pub fn count_response(count: i32, peer_name: &str) -> HiCountResponse {
    HiCountResponse {
        received_count: count,
        message: format!("Server received {count} hi messages from {peer_name}"),
    }
}

impl<S> StreamObserver<HiRequest> for HiCounter<S>
where
    S: PeerSink<HiCountResponse>,
{
    fn on_next(&self, request: HiRequest) {
        let mut state = self.lock();
        if !state.sink.is_active() {
            return;
        }
        state.count += 1;
        state.peer_name = request.sender;
        info!(
            n = state.count,
            message = %request.message,
            peer = %state.peer_name,
            "Received"
        );
    }

    fn on_error(&self, status: Status) {
        let mut state = self.lock();
        warn!(error = %status, received = state.count, "Client stream failed, no count sent");
        state.sink.abandon();
    }

    fn on_completed(&self) {
        let mut state = self.lock();
        let response = count_response(state.count, &state.peer_name);
        info!(received = state.count, "Client stream completed");

        if let Err(e) = state.sink.send(response) {
            warn!(error = %e, "Count response not delivered");
        }
        state.sink.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stream_session::pump;

    fn hi(sender: &str) -> Result<HiRequest, Status> {
        Ok(HiRequest {
            message: "hi".to_string(),
            sender: sender.to_string(),
        })
    }

    #[tokio::test]
    async fn test_counts_every_message() {
        for n in [0usize, 1, 3, 5, 17] {
            let (sink, reply) = OutboundSink::unary();
            let counter = HiCounter::new(sink);
            let inbound = futures::stream::iter((0..n).map(|_| hi("David client")));

            pump(inbound, &counter).await.unwrap();

            let response = reply.await.unwrap().unwrap();
            assert_eq!(response.received_count, n as i32);
            assert_eq!(counter.count(), n as i32);
        }
    }

    #[tokio::test]
    async fn test_response_text() {
        let (sink, reply) = OutboundSink::unary();
        let counter = HiCounter::new(sink);
        let inbound = futures::stream::iter(vec![hi("alice"), hi("bob"), hi("carol")]);

        pump(inbound, &counter).await.unwrap();

        let response = reply.await.unwrap().unwrap();
        assert_eq!(response.received_count, 3);
        assert_eq!(response.message, "Server received 3 hi messages from carol");
    }

    #[tokio::test]
    async fn test_empty_stream_reports_zero() {
        let (sink, reply) = OutboundSink::unary();
        let counter = HiCounter::new(sink);

        pump(futures::stream::empty::<Result<HiRequest, Status>>(), &counter).await.unwrap();

        let response = reply.await.unwrap().unwrap();
        assert_eq!(response, count_response(0, ""));
        assert_eq!(response.message, "Server received 0 hi messages from ");
    }

    #[tokio::test]
    async fn test_error_sends_no_response() {
        let (sink, reply) = OutboundSink::unary();
        let counter = HiCounter::new(sink);
        let inbound = futures::stream::iter(vec![
            hi("alice"),
            Err(Status::cancelled("client gave up")),
        ]);

        assert!(pump(inbound, &counter).await.is_err());
        assert!(reply.await.is_err());
        assert_eq!(counter.count(), 1);
    }
}
