pub mod config;
pub mod error;
pub mod grpc;
pub mod http;
pub mod quotation;
pub mod sayhi;
pub mod simulator;

use tracing_subscriber::EnvFilter;

pub mod sayhi_proto {
    include!(concat!(env!("OUT_DIR"), "/sayhi.rs"));
}

pub mod quotation_proto {
    include!(concat!(env!("OUT_DIR"), "/quotation.rs"));
}

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`).
/// Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
