use std::marker::PhantomData;

use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tonic::Status;

use crate::error::SinkError;

/// The receiving end of a streamed response, ready to hand to tonic.
pub type ResponseStream<T> = UnboundedReceiverStream<Result<T, Status>>;

/// The raw "send to peer" half of a session.
///
/// Implementations only move bytes; they do not guard against duplicate
/// terminal signals. [`OutboundSink`] consumes the peer on the first terminal
/// call, so every terminal method here runs at most once per session.
pub trait PeerSink<T>: Send {
    /// Hand one message to the peer.
    fn deliver(&mut self, item: T) -> Result<(), SinkError>;

    /// Signal successful end of stream.
    fn complete(self)
    where
        Self: Sized;

    /// Signal a failed stream.
    fn fail(self, status: Status)
    where
        Self: Sized;

    /// End the session without reporting success. The peer must not be able
    /// to mistake this for [`complete`](Self::complete).
    fn abandon(self)
    where
        Self: Sized,
    {
    }
}

/// Which terminal transition a session took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Completed,
    Failed,
    Abandoned,
}

/// Outbound half of a session with an at-most-once terminal signal.
///
/// Once any of [`complete`](Self::complete), [`fail`](Self::fail) or
/// [`abandon`](Self::abandon) succeeds the peer handle is released, later
/// terminal calls return `false` and later sends return
/// [`SinkError::Terminated`].
///
/// The sink itself is not synchronized; sessions keep it behind the same lock
/// that guards the rest of their state.
pub struct OutboundSink<T, S> {
    peer: Option<S>,
    terminal: Option<Terminal>,
    sent: u64,
    _marker: PhantomData<fn(T)>,
}

impl<T, S> OutboundSink<T, S>
where
    S: PeerSink<T>,
{
    pub fn new(peer: S) -> Self {
        Self {
            peer: Some(peer),
            terminal: None,
            sent: 0,
            _marker: PhantomData,
        }
    }

    /// True until a terminal signal has been taken.
    pub fn is_active(&self) -> bool {
        self.peer.is_some()
    }

    pub fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    /// Number of messages delivered to the peer so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn send(&mut self, item: T) -> Result<(), SinkError> {
        let peer = self.peer.as_mut().ok_or(SinkError::Terminated)?;
        peer.deliver(item)?;
        self.sent += 1;
        Ok(())
    }

    pub fn complete(&mut self) -> bool {
        self.finish(Terminal::Completed, |peer| peer.complete())
    }

    pub fn fail(&mut self, status: Status) -> bool {
        self.finish(Terminal::Failed, |peer| peer.fail(status))
    }

    pub fn abandon(&mut self) -> bool {
        self.finish(Terminal::Abandoned, |peer| peer.abandon())
    }

    fn finish(&mut self, terminal: Terminal, signal: impl FnOnce(S)) -> bool {
        match self.peer.take() {
            Some(peer) => {
                signal(peer);
                self.terminal = Some(terminal);
                true
            }
            None => false,
        }
    }
}

impl<T> OutboundSink<T, ChannelSink<T>>
where
    T: Send,
{
    /// A sink feeding a streamed response.
    pub fn channel() -> (Self, ResponseStream<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self::new(ChannelSink { tx }),
            UnboundedReceiverStream::new(rx),
        )
    }

    /// Resolves once the peer stops receiving, or immediately if the session
    /// is already terminated.
    pub async fn peer_closed(&self) {
        if let Some(peer) = &self.peer {
            peer.tx.closed().await;
        }
    }
}

impl<T> OutboundSink<T, UnaryReply<T>>
where
    T: Send,
{
    /// A sink producing exactly one response message.
    pub fn unary() -> (Self, oneshot::Receiver<Result<T, Status>>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(UnaryReply { tx, value: None }), rx)
    }
}

/// Streams responses through an unbounded channel. Completion closes the
/// channel; failure pushes the status as the final item.
///
/// A gRPC stream cannot end without a status, and a bare close reads as OK on
/// the wire, so abandoning ends the stream with `CANCELLED` instead.
pub struct ChannelSink<T> {
    tx: mpsc::UnboundedSender<Result<T, Status>>,
}

impl<T> PeerSink<T> for ChannelSink<T>
where
    T: Send,
{
    fn deliver(&mut self, item: T) -> Result<(), SinkError> {
        self.tx.send(Ok(item)).map_err(|_| SinkError::PeerGone)
    }

    fn complete(self) {}

    fn fail(self, status: Status) {
        let _ = self.tx.send(Err(status));
    }

    fn abandon(self) {
        let _ = self.tx.send(Err(Status::cancelled(ABANDONED)));
    }
}

/// Status message of a stream closed by [`OutboundSink::abandon`].
pub const ABANDONED: &str = "session abandoned after peer failure";

/// Holds the single response of a client-streaming call until completion.
pub struct UnaryReply<T> {
    tx: oneshot::Sender<Result<T, Status>>,
    value: Option<T>,
}

impl<T> PeerSink<T> for UnaryReply<T>
where
    T: Send,
{
    fn deliver(&mut self, item: T) -> Result<(), SinkError> {
        if self.tx.is_closed() {
            return Err(SinkError::PeerGone);
        }
        if self.value.is_some() {
            return Err(SinkError::UnaryOverflow);
        }
        self.value = Some(item);
        Ok(())
    }

    fn complete(self) {
        let reply = self
            .value
            .ok_or_else(|| Status::internal("stream completed without a response"));
        let _ = self.tx.send(reply);
    }

    fn fail(self, status: Status) {
        let _ = self.tx.send(Err(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_channel_sink_completes_once() {
        let (mut sink, mut stream) = OutboundSink::<u32, _>::channel();

        sink.send(1).unwrap();
        sink.send(2).unwrap();
        assert!(sink.complete());
        assert!(!sink.complete());
        assert!(!sink.fail(Status::internal("late")));
        assert_eq!(sink.send(3), Err(SinkError::Terminated));
        assert_eq!(sink.terminal(), Some(Terminal::Completed));
        assert_eq!(sink.sent(), 2);

        let items: Vec<_> = (&mut stream).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.is_ok()));
    }

    #[tokio::test]
    async fn test_channel_sink_fail_is_last_item() {
        let (mut sink, stream) = OutboundSink::<u32, _>::channel();

        sink.send(7).unwrap();
        assert!(sink.fail(Status::aborted("stop")));
        assert!(!sink.complete());

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_ref().unwrap_err().code(), tonic::Code::Aborted);
    }

    #[tokio::test]
    async fn test_channel_sink_peer_gone() {
        let (mut sink, stream) = OutboundSink::<u32, _>::channel();
        drop(stream);

        assert_eq!(sink.send(1), Err(SinkError::PeerGone));
        assert!(sink.is_active());
        sink.peer_closed().await;
        assert!(sink.abandon());
        assert_eq!(sink.terminal(), Some(Terminal::Abandoned));
    }

    #[tokio::test]
    async fn test_channel_sink_abandon_is_not_a_clean_end() {
        let (mut sink, stream) = OutboundSink::<u32, _>::channel();

        sink.send(1).unwrap();
        assert!(sink.abandon());
        assert!(!sink.complete());
        assert_eq!(sink.terminal(), Some(Terminal::Abandoned));

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(*items[0].as_ref().unwrap(), 1);
        let status = items[1].as_ref().unwrap_err();
        assert_eq!(status.code(), tonic::Code::Cancelled);
        assert_eq!(status.message(), ABANDONED);
    }

    #[tokio::test]
    async fn test_unary_reply() {
        let (mut sink, rx) = OutboundSink::<String, _>::unary();

        sink.send("only".to_string()).unwrap();
        assert_eq!(
            sink.send("second".to_string()),
            Err(SinkError::UnaryOverflow)
        );
        assert!(sink.complete());

        assert_eq!(rx.await.unwrap().unwrap(), "only");
    }

    #[tokio::test]
    async fn test_unary_reply_without_value() {
        let (mut sink, rx) = OutboundSink::<String, _>::unary();
        assert!(sink.complete());

        let status = rx.await.unwrap().unwrap_err();
        assert_eq!(status.code(), tonic::Code::Internal);
    }

    #[tokio::test]
    async fn test_unary_reply_abandoned() {
        let (mut sink, rx) = OutboundSink::<String, _>::unary();
        sink.send("dropped".to_string()).unwrap();
        assert!(sink.abandon());

        assert!(rx.await.is_err());
    }
}
