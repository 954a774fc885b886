use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 6667;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Settings for a [`Client`](crate::Client).
///
/// Build one with [`Options::builder`], or load it from TOML:
///
/// ```toml
/// host = "irc.chat.twitch.tv"
/// channels = ["somechannel"]
/// read_timeout_secs = 600
///
/// [rate_limit]
/// capacity = 19
/// per_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Options {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Joined right after the handshake, `#` optional.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Log every line sent and received.
    #[serde(default)]
    pub debug: bool,
    #[serde(rename = "read_timeout_secs", default = "default_read_timeout", deserialize_with = "seconds")]
    pub read_timeout: Duration,
    #[serde(default)]
    pub rate_limit: RateLimit,
}

/// Token bucket settings for outbound lines: at most `capacity` lines in a
/// burst, refilled at `capacity` per `per`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RateLimit {
    #[serde(default = "default_capacity")]
    pub capacity: f64,
    #[serde(rename = "per_secs", default = "default_per", deserialize_with = "seconds")]
    pub per: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            per: default_per(),
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub(crate) fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub struct OptionsBuilder {
    host: Option<String>,
    port: u16,
    channels: Vec<String>,
    debug: bool,
    read_timeout: Duration,
    rate_limit: RateLimit,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        OptionsBuilder {
            host: None,
            port: DEFAULT_PORT,
            channels: Vec::new(),
            debug: false,
            read_timeout: DEFAULT_READ_TIMEOUT,
            rate_limit: RateLimit::default(),
        }
    }

    pub fn build(self) -> Result<Options, ConfigError> {
        let host = match self.host {
            Some(host) => host,
            None => return Err(ConfigError::HostMissing),
        };

        Ok(Options {
            host,
            port: self.port,
            channels: self.channels,
            debug: self.debug,
            read_timeout: self.read_timeout,
            rate_limit: self.rate_limit,
        })
    }

    pub fn host<T: Into<String>>(mut self, host: T) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn channel<T: Into<String>>(mut self, channel: T) -> Self {
        self.channels.push(channel.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn rate_limit(mut self, capacity: f64, per: Duration) -> Self {
        self.rate_limit = RateLimit { capacity, per };
        self
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_read_timeout() -> Duration {
    DEFAULT_READ_TIMEOUT
}

fn default_capacity() -> f64 {
    19.0
}

fn default_per() -> Duration {
    Duration::from_secs(30)
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}
