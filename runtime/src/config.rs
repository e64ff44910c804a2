//! Configuration for the bridge process.

use std::time::Duration;

/// Configuration for a bridge run.
///
/// The defaults describe the production deployment: the Wikimedia
/// recent-changes stream into a local broker, for ten minutes. There are
/// no command-line flags and no environment surface; callers that need
/// different values use the `with_*` methods.
///
/// # Example
///
/// ```
/// use wikibridge_runtime::BridgeConfig;
/// use std::time::Duration;
///
/// let config = BridgeConfig::default()
///     .with_brokers("broker-1:9092,broker-2:9092")
///     .with_run_duration(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Broker addresses, comma-separated.
    pub brokers: String,
    /// Destination topic for every record.
    pub topic: String,
    /// URL of the change stream.
    pub source_url: String,
    /// User-Agent sent with every stream connection.
    pub user_agent: String,
    /// How long the bridge runs before shutting down.
    pub run_duration: Duration,
    /// How long shutdown waits for in-flight deliveries to resolve.
    pub drain_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            brokers: "127.0.0.1:9092".to_string(),
            topic: "wikimedia.recentchange".to_string(),
            source_url: "https://stream.wikimedia.org/v2/stream/recentchange".to_string(),
            user_agent: "WikimediaKafkaProducer/1.0".to_string(),
            run_duration: Duration::from_secs(10 * 60),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl BridgeConfig {
    /// Set the broker addresses.
    #[must_use]
    pub fn with_brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = brokers.into();
        self
    }

    /// Set the destination topic.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set the change stream URL.
    #[must_use]
    pub fn with_source_url(mut self, source_url: impl Into<String>) -> Self {
        self.source_url = source_url.into();
        self
    }

    /// Set the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set how long the bridge runs before shutting down.
    #[must_use]
    pub const fn with_run_duration(mut self, run_duration: Duration) -> Self {
        self.run_duration = run_duration;
        self
    }

    /// Set the shutdown drain timeout.
    #[must_use]
    pub const fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_production_deployment() {
        let config = BridgeConfig::default();
        assert_eq!(config.brokers, "127.0.0.1:9092");
        assert_eq!(config.topic, "wikimedia.recentchange");
        assert_eq!(
            config.source_url,
            "https://stream.wikimedia.org/v2/stream/recentchange"
        );
        assert_eq!(config.run_duration, Duration::from_secs(600));
    }

    #[test]
    fn with_methods_override_fields() {
        let config = BridgeConfig::default()
            .with_topic("other.topic")
            .with_run_duration(Duration::from_secs(1));
        assert_eq!(config.topic, "other.topic");
        assert_eq!(config.run_duration, Duration::from_secs(1));
        assert_eq!(config.brokers, "127.0.0.1:9092");
    }
}
