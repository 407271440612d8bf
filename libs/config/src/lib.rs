//! # Reply Bridge Configuration
//!
//! Centralized configuration for the bridge service: broker identity,
//! topic wiring, the undeliverable-reply policy, and runtime tuning.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use config::BridgeConfig;
//!
//! let config = BridgeConfig::from_file("config/bridge.toml")?;
//! println!("consuming from {}", config.topics.input);
//! # Ok::<(), config::ConfigError>(())
//! ```

pub mod settings;

pub use settings::{
    BridgeConfig, BrokerSettings, ConfigError, ReplySettings, RuntimeSettings, TopicSettings,
    UndeliverablePolicy,
};
