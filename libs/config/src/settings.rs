//! Bridge configuration: broker identity, topic wiring, reply policy, and
//! runtime tuning. Loaded from a TOML file at startup; every section has
//! workable defaults so a partial file is enough.
//!
//! ```toml
//! [broker]
//! servers = ["broker-1:9092"]
//! group_id = "reply-bridge"
//!
//! [topics]
//! input = "requests.incoming"
//! output = "replies.outgoing"
//!
//! [reply]
//! undeliverable = "redirect"
//! undeliverable_topic = "replies.dead-letter"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors surfaced at startup, before any message flows.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main bridge configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub broker: BrokerSettings,
    pub topics: TopicSettings,
    pub reply: ReplySettings,
    pub runtime: RuntimeSettings,
}

/// Identity of the externally owned broker connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerSettings {
    /// Broker endpoints, host:port
    pub servers: Vec<String>,
    /// Consumer-group identifier for the inbound subscription
    pub group_id: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            servers: vec!["localhost:9092".to_string()],
            group_id: "reply-bridge".to_string(),
        }
    }
}

/// Topic wiring for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TopicSettings {
    /// Topic the subscription consumes request envelopes from
    pub input: String,
    /// Static default destination for replies published without an
    /// explicit destination
    pub output: String,
    /// Observer push channel that mirrors each correlated pair
    pub notification_channel: String,
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            input: "requests.incoming".to_string(),
            output: "replies.outgoing".to_string(),
            notification_channel: "messaging-bridge".to_string(),
        }
    }
}

/// What to do with a reply whose request named no return topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndeliverablePolicy {
    /// Drop the reply, log a warning, count it
    Drop,
    /// Publish the reply to `undeliverable_topic` instead
    Redirect,
}

/// Reply-handling policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplySettings {
    pub undeliverable: UndeliverablePolicy,
    /// Destination for redirected undeliverable replies; required when
    /// `undeliverable = "redirect"`
    pub undeliverable_topic: Option<String>,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            undeliverable: UndeliverablePolicy::Drop,
            undeliverable_topic: None,
        }
    }
}

/// Runtime tuning parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Queue depth of each per-shard worker; pulls block once a shard
    /// falls this far behind
    pub shard_buffer: usize,
    /// Seconds between periodic metrics reports
    pub metrics_interval_secs: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            shard_buffer: 64,
            metrics_interval_secs: 60,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would fail at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.servers.is_empty() {
            return Err(ConfigError::Invalid(
                "broker.servers must name at least one endpoint".to_string(),
            ));
        }
        if self.broker.group_id.is_empty() {
            return Err(ConfigError::Invalid(
                "broker.group_id must not be empty".to_string(),
            ));
        }
        if self.topics.input.is_empty() || self.topics.output.is_empty() {
            return Err(ConfigError::Invalid(
                "topics.input and topics.output must not be empty".to_string(),
            ));
        }
        if self.reply.undeliverable == UndeliverablePolicy::Redirect
            && self
                .reply
                .undeliverable_topic
                .as_deref()
                .map(str::is_empty)
                .unwrap_or(true)
        {
            return Err(ConfigError::Invalid(
                "reply.undeliverable_topic is required when reply.undeliverable = \"redirect\""
                    .to_string(),
            ));
        }
        if self.runtime.shard_buffer == 0 {
            return Err(ConfigError::Invalid(
                "runtime.shard_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_valid() {
        let config = BridgeConfig::default();
        config.validate().unwrap();

        assert_eq!(config.topics.input, "requests.incoming");
        assert_eq!(config.reply.undeliverable, UndeliverablePolicy::Drop);
        assert_eq!(config.runtime.shard_buffer, 64);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        fs::write(
            &path,
            r#"
[broker]
group_id = "bridge-test"

[topics]
input = "orders.requests"
"#,
        )
        .unwrap();

        let config = BridgeConfig::from_file(&path).unwrap();
        assert_eq!(config.broker.group_id, "bridge-test");
        assert_eq!(config.topics.input, "orders.requests");
        assert_eq!(config.topics.output, "replies.outgoing");
    }

    #[test]
    fn redirect_policy_requires_a_topic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        fs::write(
            &path,
            r#"
[reply]
undeliverable = "redirect"
"#,
        )
        .unwrap();

        let err = BridgeConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn redirect_policy_parses_with_topic() {
        let config: BridgeConfig = toml::from_str(
            r#"
[reply]
undeliverable = "redirect"
undeliverable_topic = "replies.dead-letter"
"#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.reply.undeliverable, UndeliverablePolicy::Redirect);
        assert_eq!(
            config.reply.undeliverable_topic.as_deref(),
            Some("replies.dead-letter")
        );
    }

    #[test]
    fn empty_shard_buffer_is_rejected() {
        let config: BridgeConfig = toml::from_str(
            r#"
[runtime]
shard_buffer = 0
"#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }
}
