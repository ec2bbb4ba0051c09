use std::pin::pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tonic::Status;
use tracing::Instrument;

use crate::error::PumpError;

/// The three inbound callbacks of a streaming session.
///
/// Calls can arrive from different tasks (the pump, a deadline timer), so
/// implementations funnel all three through one lock on their session state.
pub trait StreamObserver<Req>: Send + Sync {
    /// A message arrived from the peer.
    fn on_next(&self, message: Req);

    /// The peer's half of the stream failed. No further calls follow.
    fn on_error(&self, status: Status);

    /// The peer finished sending. No further calls follow.
    fn on_completed(&self);
}

impl<Req, O> StreamObserver<Req> for Arc<O>
where
    O: StreamObserver<Req> + ?Sized,
{
    fn on_next(&self, message: Req) {
        (**self).on_next(message)
    }

    fn on_error(&self, status: Status) {
        (**self).on_error(status)
    }

    fn on_completed(&self) {
        (**self).on_completed()
    }
}

/// Drive a decoded inbound stream into an observer.
///
/// Every `Ok` item becomes `on_next`, the first `Err` becomes `on_error` and
/// ends the pump, and the end of the stream becomes `on_completed`. Returns the
/// number of messages handed to the observer.
pub async fn pump<Req, S, O>(inbound: S, observer: &O) -> Result<u64, PumpError>
where
    S: Stream<Item = Result<Req, Status>>,
    O: StreamObserver<Req> + ?Sized,
{
    let mut inbound = pin!(inbound);
    let mut received = 0u64;

    while let Some(item) = inbound.next().await {
        match item {
            Ok(message) => {
                received += 1;
                observer.on_next(message);
            }
            Err(status) => {
                tracing::debug!(received, error = %status, "Inbound stream failed");
                observer.on_error(status.clone());
                return Err(PumpError::Peer(status));
            }
        }
    }

    tracing::debug!(received, "Inbound stream completed");
    observer.on_completed();
    Ok(received)
}

/// Run [`pump`] on its own task, inside the caller's current span, so the
/// caller can return a response stream right away.
pub fn spawn_pump<Req, S, O>(inbound: S, observer: Arc<O>) -> JoinHandle<Result<u64, PumpError>>
where
    Req: Send + 'static,
    S: Stream<Item = Result<Req, Status>> + Send + 'static,
    O: StreamObserver<Req> + ?Sized + 'static,
{
    tokio::spawn(async move { pump(inbound, &*observer).await }.in_current_span())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, PartialEq)]
    enum Call {
        Next(u32),
        Error(tonic::Code),
        Completed,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
    }

    impl StreamObserver<u32> for Recorder {
        fn on_next(&self, message: u32) {
            self.calls.lock().unwrap().push(Call::Next(message));
        }

        fn on_error(&self, status: Status) {
            self.calls.lock().unwrap().push(Call::Error(status.code()));
        }

        fn on_completed(&self) {
            self.calls.lock().unwrap().push(Call::Completed);
        }
    }

    #[tokio::test]
    async fn test_pump_completes() {
        let recorder = Recorder::default();
        let inbound = futures::stream::iter(vec![Ok(1), Ok(2), Ok(3)]);

        let received = pump(inbound, &recorder).await.unwrap();

        assert_eq!(received, 3);
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec![Call::Next(1), Call::Next(2), Call::Next(3), Call::Completed]
        );
    }

    #[tokio::test]
    async fn test_pump_stops_at_first_error() {
        let recorder = Recorder::default();
        let inbound = futures::stream::iter(vec![
            Ok(1),
            Err(Status::unavailable("reset")),
            Ok(2),
        ]);

        let err = pump(inbound, &recorder).await.unwrap_err();

        assert_eq!(err.status().code(), tonic::Code::Unavailable);
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec![Call::Next(1), Call::Error(tonic::Code::Unavailable)]
        );
    }

    #[tokio::test]
    async fn test_pump_empty_stream() {
        let recorder = Recorder::default();
        let inbound = futures::stream::empty::<Result<u32, Status>>();

        assert_eq!(pump(inbound, &recorder).await.unwrap(), 0);
        assert_eq!(*recorder.calls.lock().unwrap(), vec![Call::Completed]);
    }

    #[tokio::test]
    async fn test_spawn_pump_through_arc() {
        let recorder = Arc::new(Recorder::default());
        let inbound = futures::stream::iter(vec![Ok(9)]);

        let received = spawn_pump(inbound, Arc::clone(&recorder))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(received, 1);
        assert_eq!(recorder.calls.lock().unwrap().len(), 2);
    }
}
