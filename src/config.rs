use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use stream_session::SessionConfig;

use crate::error::ConfigError;
use crate::simulator::SimulatorConfig;

pub const DEFAULT_GRPC_ADDR: &str = "[::1]:50051";
pub const DEFAULT_QUOTATION_GRPC_ADDR: &str = "[::1]:50052";
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8081";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:4200";

/// Process configuration, read from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `GRPC_ADDR`: where the SayHi service listens.
    pub grpc_addr: SocketAddr,

    /// `QUOTATION_GRPC_ADDR`: where the quotation service listens.
    pub quotation_grpc_addr: SocketAddr,

    /// `HTTP_ADDR`: where the HTTP bridge listens.
    pub http_addr: SocketAddr,

    /// `CORS_ORIGIN`: the single origin allowed to call the HTTP bridge.
    pub cors_origin: String,

    /// `BIDI_WINDOW_MS`, `SERVER_STREAM_PACING_MS`.
    pub session: SessionConfig,

    /// `SIMULATOR_SENDER`, `SIMULATOR_INTERVAL_SECS`.
    pub simulator: SimulatorConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Unset keys fall back to
    /// defaults; set but malformed keys are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let mut session = SessionConfig::default();
        if let Some(ms) = env.parse::<u64>("BIDI_WINDOW_MS")? {
            session = session.with_bidi_window(Duration::from_millis(ms));
        }
        if let Some(ms) = env.parse::<u64>("SERVER_STREAM_PACING_MS")? {
            session = session.with_server_stream_pacing(Duration::from_millis(ms));
        }

        let mut simulator = SimulatorConfig::default();
        if let Some(sender) = env.get("SIMULATOR_SENDER") {
            simulator.sender = sender;
        }
        if let Some(secs) = env.parse::<u64>("SIMULATOR_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(ConfigError::invalid(
                    "SIMULATOR_INTERVAL_SECS",
                    "0",
                    "interval must be positive",
                ));
            }
            simulator.interval = Duration::from_secs(secs);
        }

        Ok(Self {
            grpc_addr: env.addr("GRPC_ADDR", DEFAULT_GRPC_ADDR)?,
            quotation_grpc_addr: env.addr("QUOTATION_GRPC_ADDR", DEFAULT_QUOTATION_GRPC_ADDR)?,
            http_addr: env.addr("HTTP_ADDR", DEFAULT_HTTP_ADDR)?,
            cors_origin: env
                .get("CORS_ORIGIN")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            session,
            simulator,
        })
    }

    /// The URL a client uses to reach the SayHi service.
    pub fn grpc_endpoint(&self) -> String {
        format!("http://{}", self.grpc_addr)
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn parse<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|e| ConfigError::invalid(key, &raw, e))
            })
            .transpose()
    }

    fn addr(&self, key: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
        let raw = self.get(key).unwrap_or_else(|| default.to_string());
        raw.trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid(key, &raw, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.grpc_addr, DEFAULT_GRPC_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.http_addr, DEFAULT_HTTP_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.cors_origin, "http://localhost:4200");
        assert_eq!(config.session.bidi_window, Duration::from_secs(2));
        assert_eq!(config.session.server_stream_pacing, Duration::from_millis(500));
        assert_eq!(config.simulator.sender, "David client");
        assert_eq!(config.simulator.interval, Duration::from_secs(60));
        assert_eq!(config.grpc_endpoint(), "http://[::1]:50051");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GRPC_ADDR", "0.0.0.0:9000"),
            ("BIDI_WINDOW_MS", "750"),
            ("SERVER_STREAM_PACING_MS", " 0 "),
            ("SIMULATOR_SENDER", "tester"),
            ("SIMULATOR_INTERVAL_SECS", "5"),
            ("CORS_ORIGIN", "https://quotes.example.com"),
        ])
        .unwrap();

        assert_eq!(config.grpc_addr, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.session.bidi_window, Duration::from_millis(750));
        assert_eq!(config.session.server_stream_pacing, Duration::ZERO);
        assert_eq!(config.simulator.sender, "tester");
        assert_eq!(config.simulator.interval, Duration::from_secs(5));
        assert_eq!(config.cors_origin, "https://quotes.example.com");
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[("GRPC_ADDR", "  "), ("BIDI_WINDOW_MS", "")]).unwrap();

        assert_eq!(config.grpc_addr, DEFAULT_GRPC_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.session.bidi_window, Duration::from_secs(2));
    }

    #[test]
    fn test_malformed_values_are_errors() {
        let err = config_from(&[("BIDI_WINDOW_MS", "two seconds")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "BIDI_WINDOW_MS", .. }
        ));

        let err = config_from(&[("HTTP_ADDR", "localhost")]).unwrap_err();
        assert!(err.to_string().contains("HTTP_ADDR"));

        assert!(config_from(&[("SIMULATOR_INTERVAL_SECS", "0")]).is_err());
    }
}
