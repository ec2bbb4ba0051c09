use std::time::Duration;

use stream_session::{ChannelSink, OutboundSink};
use tracing::info;

use crate::sayhi::server_message;
use crate::sayhi_proto::HiResponse;

/// Stream `hi #1` .. `hi #{count}` to the peer, `pacing` apart, then complete.
///
/// If the peer stops receiving mid-way the loop stops early and the stream is
/// still completed rather than failed. Returns how many messages went out.
pub async fn stream_hi(
    sender: String,
    count: u32,
    pacing: Duration,
    mut sink: OutboundSink<HiResponse, ChannelSink<HiResponse>>,
) -> u32 {
    info!(peer = %sender, count, "Streaming hi messages");

    let mut sent = 0;
    for i in 1..=count {
        if let Err(e) = sink.send(server_message(format!("hi #{i}"))) {
            info!(peer = %sender, sent, error = %e, "Stopping early");
            break;
        }
        sent = i;

        if i == count {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(pacing) => {}
            _ = sink.peer_closed() => {
                info!(peer = %sender, sent, "Peer went away during pacing, stopping early");
                break;
            }
        }
    }

    sink.complete();
    info!(peer = %sender, sent, "Server stream completed");
    sent
}
