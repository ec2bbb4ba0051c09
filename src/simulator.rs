//! A driving client that exercises the SayHi streaming RPCs end to end.

use std::time::Duration;

use async_stream::stream;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, timeout};
use tonic::transport::{Channel, Endpoint};
use tracing::{info, warn};

use crate::error::SimulatorError;
use crate::sayhi_proto::say_hi_service_client::SayHiServiceClient;
use crate::sayhi_proto::{HiCountRequest, HiCountResponse, HiRequest, HiResponse};

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Sender name on every client message.
    pub sender: String,

    /// Gap between client-streamed messages.
    pub message_delay: Duration,

    /// Upper bound of the random client-stream message count.
    pub client_stream_max: u32,

    /// How long the bidirectional exercise keeps sending.
    pub bidi_duration: Duration,

    pub bidi_message_interval: Duration,

    /// Bounded wait for the server to resolve a session.
    pub response_timeout: Duration,

    /// Period of [`Simulator::run_periodically`].
    pub interval: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            sender: "David client".to_string(),
            message_delay: Duration::from_millis(200),
            client_stream_max: 5,
            bidi_duration: Duration::from_secs(2),
            bidi_message_interval: Duration::from_millis(800),
            response_timeout: Duration::from_secs(10),
            interval: Duration::from_secs(60),
        }
    }
}

/// Outcome of one client-streaming exercise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientStreamResult {
    pub success: bool,
    pub received_count: i32,
    pub message: String,
    pub error: Option<String>,
}

impl ClientStreamResult {
    fn failed(err: SimulatorError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Self::default()
        }
    }
}

/// Outcome of one bidirectional exercise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BidirectionalStreamResult {
    pub success: bool,
    pub messages_sent: u32,
    pub sent: Vec<String>,
    pub received: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Simulator {
    client: SayHiServiceClient<Channel>,
    config: SimulatorConfig,
}

impl Simulator {
    pub async fn connect(endpoint: String, config: SimulatorConfig) -> Result<Self, SimulatorError> {
        let channel = Endpoint::from_shared(endpoint)?.connect().await?;
        Ok(Self::new(channel, config))
    }

    pub fn new(channel: Channel, config: SimulatorConfig) -> Self {
        Self {
            client: SayHiServiceClient::new(channel),
            config,
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub async fn say_hi(&self, message: &str) -> Result<HiResponse, SimulatorError> {
        let mut client = self.client.clone();
        let response = client
            .say_hi(HiRequest {
                message: message.to_string(),
                sender: self.config.sender.clone(),
            })
            .await?;
        Ok(response.into_inner())
    }

    /// Ask for `count` server-streamed greetings and collect them.
    pub async fn server_streaming(&self, count: i32) -> Result<Vec<HiResponse>, SimulatorError> {
        let mut client = self.client.clone();
        let request = HiCountRequest {
            sender: self.config.sender.clone(),
            count,
        };

        let collect = async {
            let mut inbound = client.server_stream_hi(request).await?.into_inner();
            let mut replies = Vec::new();
            while let Some(reply) = inbound.message().await? {
                replies.push(reply);
            }
            Ok::<_, SimulatorError>(replies)
        };

        timeout(self.config.response_timeout, collect)
            .await
            .map_err(|_| SimulatorError::Timeout("server stream"))?
    }

    /// Stream a random number of greetings, then wait for the server's count.
    pub async fn client_streaming(&self) -> ClientStreamResult {
        let count = rand::rng().random_range(1..=self.config.client_stream_max.max(1));
        self.client_streaming_with(count).await
    }

    pub async fn client_streaming_with(&self, count: u32) -> ClientStreamResult {
        info!(count, "Starting client streaming");
        match self.try_client_streaming(count).await {
            Ok(response) => {
                info!(
                    received = response.received_count,
                    message = %response.message,
                    "Client streaming completed"
                );
                ClientStreamResult {
                    success: true,
                    received_count: response.received_count,
                    message: response.message,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Client streaming failed");
                ClientStreamResult::failed(e)
            }
        }
    }

    async fn try_client_streaming(&self, count: u32) -> Result<HiCountResponse, SimulatorError> {
        let sender = self.config.sender.clone();
        let delay = self.config.message_delay;

        let outbound = stream! {
            for i in 1..=count {
                yield HiRequest {
                    message: format!("hi from client #{i}"),
                    sender: sender.clone(),
                };
                if i < count {
                    tokio::time::sleep(delay).await;
                }
            }
        };

        let mut client = self.client.clone();
        let response = timeout(
            self.config.response_timeout,
            client.client_stream_hi(outbound),
        )
        .await
        .map_err(|_| SimulatorError::Timeout("client stream response"))??;

        Ok(response.into_inner())
    }

    /// Send greetings on a fixed interval for the configured duration, then
    /// complete and wait for the server to close its half.
    pub async fn bidirectional(&self) -> BidirectionalStreamResult {
        let (sent_tx, mut sent_rx) = mpsc::unbounded_channel();
        let sender = self.config.sender.clone();
        let duration = self.config.bidi_duration;
        let every = self.config.bidi_message_interval;

        let outbound = stream! {
            let started = Instant::now();
            let mut n = 0u32;
            while started.elapsed() < duration {
                n += 1;
                let message = format!("hi from client #{n}");
                let _ = sent_tx.send(message.clone());
                yield HiRequest {
                    message,
                    sender: sender.clone(),
                };
                tokio::time::sleep(every).await;
            }
        };

        info!("Starting bidirectional streaming");
        let mut client = self.client.clone();
        let mut received = Vec::new();
        let exchange = async {
            let mut inbound = client.bidirectional_hi(outbound).await?.into_inner();
            while let Some(reply) = inbound.message().await? {
                info!(message = %reply.message, "Received from server");
                received.push(reply.message);
            }
            Ok::<_, SimulatorError>(())
        };

        let outcome = timeout(duration + self.config.response_timeout, exchange)
            .await
            .map_err(|_| SimulatorError::Timeout("bidirectional stream"))
            .and_then(|r| r);

        let mut sent = Vec::new();
        while let Ok(message) = sent_rx.try_recv() {
            sent.push(message);
        }

        let error = match outcome {
            Ok(()) => {
                info!(
                    sent = sent.len(),
                    received = received.len(),
                    "Bidirectional streaming completed"
                );
                None
            }
            Err(e) => {
                warn!(error = %e, "Bidirectional streaming failed");
                Some(e.to_string())
            }
        };

        BidirectionalStreamResult {
            success: error.is_none(),
            messages_sent: sent.len() as u32,
            sent,
            received,
            error,
        }
    }

    /// One round of both streaming exercises.
    pub async fn run_once(&self) -> (ClientStreamResult, BidirectionalStreamResult) {
        let client_stream = self.client_streaming().await;
        let bidirectional = self.bidirectional().await;
        (client_stream, bidirectional)
    }

    /// Run a round every `interval` until the future is dropped.
    pub async fn run_periodically(&self) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let (client_stream, bidirectional) = self.run_once().await;
            info!(
                client_stream_ok = client_stream.success,
                bidirectional_ok = bidirectional.success,
                "Simulator round finished"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulatorConfig::default();
        assert_eq!(config.sender, "David client");
        assert_eq!(config.message_delay, Duration::from_millis(200));
        assert_eq!(config.client_stream_max, 5);
        assert_eq!(config.response_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_failed_result_carries_error() {
        let result = ClientStreamResult::failed(SimulatorError::Timeout("client stream response"));
        assert!(!result.success);
        assert_eq!(result.received_count, 0);
        assert_eq!(
            result.error.as_deref(),
            Some("timeout waiting for client stream response")
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_failed_result() {
        // Nothing listens on port 1; the lazy channel fails on first use.
        let channel = Endpoint::from_static("http://127.0.0.1:1").connect_lazy();
        let simulator = Simulator::new(
            channel,
            SimulatorConfig {
                message_delay: Duration::ZERO,
                response_timeout: Duration::from_secs(5),
                ..SimulatorConfig::default()
            },
        );

        let result = simulator.client_streaming_with(2).await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }
}
