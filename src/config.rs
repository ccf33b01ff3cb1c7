//! Configuration types for one authenticated identity.
//!
//! A [`SessionConfig`] carries the transport credentials for one identity
//! together with the numeric knobs that shape the humanized pacing of its
//! outgoing messages.  It is constructed once, validated before any network
//! activity, and shared by reference across every component of that
//! identity.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default connection timeout, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Optional proxy descriptor, passed through opaquely to the transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy scheme, e.g. "socks5" or "http".
    pub scheme: String,
    /// Proxy host address.
    pub address: String,
    /// Proxy port.
    pub port: u16,
    /// Optional proxy username.
    pub username: Option<String>,
    /// Optional proxy password.
    pub password: Option<String>,
    /// Whether hostnames are resolved by the proxy rather than locally.
    pub remote_dns: bool,
}

/// Immutable configuration for one authenticated identity.
///
/// Credentials identify the account; the remaining fields parameterize the
/// pacing engine.  Every `min`/`max` pair must satisfy `min <= max` and the
/// phone number must be in international form (`+` followed by country code
/// and digits).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name under which the transport persists this session.
    pub session_name: String,
    /// Opaque application id issued by the backend.
    pub api_id: i32,
    /// Opaque application hash issued by the backend.
    pub api_hash: String,
    /// Phone number in international format, e.g. "+15551234567".
    pub phone_number: String,
    /// Optional proxy descriptor.
    pub proxy: Option<ProxyConfig>,
    /// Transport connect timeout, in seconds.
    pub timeout_secs: u64,

    /// Whether to emit the typing indicator before each burst.
    pub set_typing: bool,
    /// Minimum think time between chunks, in seconds.
    pub inter_chunk_delay_min: f64,
    /// Maximum think time between chunks, in seconds.
    pub inter_chunk_delay_max: f64,
    /// Minimum number of messages one text is split into.
    pub min_messages: usize,
    /// Maximum number of messages one text is split into.
    pub max_messages: usize,
    /// Minimum simulated typing speed, in words per minute.
    pub min_typing_speed: f64,
    /// Maximum simulated typing speed, in words per minute.
    pub max_typing_speed: f64,
    /// Minimum words typed without pausing.
    pub min_burst_length: usize,
    /// Maximum words typed without pausing.
    pub max_burst_length: usize,
    /// Minimum pause between bursts, in seconds.
    pub min_pause_duration: f64,
    /// Maximum pause between bursts, in seconds.
    pub max_pause_duration: f64,
    /// Seconds of read delay per character of incoming text.
    pub read_delay_factor: f64,
    /// Minimum additive read delay, in seconds.
    pub min_read_delay: f64,
    /// Maximum additive read delay, in seconds.
    pub max_read_delay: f64,
    /// How many recent messages to replay when reconstructing chat history.
    pub chat_history_limit: usize,
}

impl SessionConfig {
    /// Creates a configuration with the given credentials and default pacing.
    ///
    /// Defaults match the reference behavior: 30s connect timeout, typing
    /// indicator on, 1.5-4.0s think time, 1-3 messages per text, 100-200 wpm,
    /// 5-15 word bursts, 0.5-2.0s pauses, read delay 0.05s/char plus
    /// 0.5-2.0s, 100-message history window.
    pub fn new(
        session_name: impl Into<String>,
        api_id: i32,
        api_hash: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            session_name: session_name.into(),
            api_id,
            api_hash: api_hash.into(),
            phone_number: phone_number.into(),
            proxy: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            set_typing: true,
            inter_chunk_delay_min: 1.5,
            inter_chunk_delay_max: 4.0,
            min_messages: 1,
            max_messages: 3,
            min_typing_speed: 100.0,
            max_typing_speed: 200.0,
            min_burst_length: 5,
            max_burst_length: 15,
            min_pause_duration: 0.5,
            max_pause_duration: 2.0,
            read_delay_factor: 0.05,
            min_read_delay: 0.5,
            max_read_delay: 2.0,
            chat_history_limit: 100,
        }
    }

    /// Sets the proxy descriptor.
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets the connect timeout, in seconds.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Enables or disables the typing indicator.  Pacing delays apply either
    /// way; this controls only the visible indicator.
    pub fn with_typing_indicator(mut self, set_typing: bool) -> Self {
        self.set_typing = set_typing;
        self
    }

    /// Sets the range of messages one text is split into.
    pub fn with_message_range(mut self, min_messages: usize, max_messages: usize) -> Self {
        self.min_messages = min_messages;
        self.max_messages = max_messages;
        self
    }

    /// Sets the simulated typing speed range, in words per minute.
    pub fn with_typing_speed(mut self, min_wpm: f64, max_wpm: f64) -> Self {
        self.min_typing_speed = min_wpm;
        self.max_typing_speed = max_wpm;
        self
    }

    /// Sets the burst length range, in words.
    pub fn with_burst_length(mut self, min_words: usize, max_words: usize) -> Self {
        self.min_burst_length = min_words;
        self.max_burst_length = max_words;
        self
    }

    /// Sets the inter-burst pause range, in seconds.
    pub fn with_pause_duration(mut self, min_secs: f64, max_secs: f64) -> Self {
        self.min_pause_duration = min_secs;
        self.max_pause_duration = max_secs;
        self
    }

    /// Sets the inter-chunk think-time range, in seconds.
    pub fn with_inter_chunk_delay(mut self, min_secs: f64, max_secs: f64) -> Self {
        self.inter_chunk_delay_min = min_secs;
        self.inter_chunk_delay_max = max_secs;
        self
    }

    /// Sets the read-delay parameters.
    pub fn with_read_delay(mut self, factor: f64, min_secs: f64, max_secs: f64) -> Self {
        self.read_delay_factor = factor;
        self.min_read_delay = min_secs;
        self.max_read_delay = max_secs;
        self
    }

    /// Sets the chat history window.
    pub fn with_chat_history_limit(mut self, limit: usize) -> Self {
        self.chat_history_limit = limit;
        self
    }

    /// Validates the configuration.
    ///
    /// Runs before any network activity; a failure here is fatal and never
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.session_name.is_empty() {
            return Err(Error::invalid_config(
                "session_name is required",
                Some("session_name".to_string()),
            ));
        }
        if self.api_id == 0 {
            return Err(Error::invalid_config(
                "api_id is required and must be a non-zero integer",
                Some("api_id".to_string()),
            ));
        }
        if self.api_hash.is_empty() {
            return Err(Error::invalid_config(
                "api_hash is required",
                Some("api_hash".to_string()),
            ));
        }
        if self.phone_number.is_empty() {
            return Err(Error::invalid_config(
                "phone_number is required",
                Some("phone_number".to_string()),
            ));
        }
        if !self.phone_number.starts_with('+') {
            return Err(Error::invalid_config(
                "phone_number must start with '+'",
                Some("phone_number".to_string()),
            ));
        }
        if self
            .phone_number
            .chars()
            .skip(1)
            .any(|c| !c.is_ascii_digit())
        {
            return Err(Error::invalid_config(
                "phone_number must be '+' followed by digits",
                Some("phone_number".to_string()),
            ));
        }

        self.check_range(
            "messages",
            self.min_messages as f64,
            self.max_messages as f64,
        )?;
        if self.min_messages == 0 {
            return Err(Error::invalid_config(
                "min_messages must be at least 1",
                Some("min_messages".to_string()),
            ));
        }
        self.check_range("typing_speed", self.min_typing_speed, self.max_typing_speed)?;
        if self.min_typing_speed <= 0.0 {
            return Err(Error::invalid_config(
                "min_typing_speed must be positive",
                Some("min_typing_speed".to_string()),
            ));
        }
        self.check_range(
            "burst_length",
            self.min_burst_length as f64,
            self.max_burst_length as f64,
        )?;
        if self.min_burst_length == 0 {
            return Err(Error::invalid_config(
                "min_burst_length must be at least 1",
                Some("min_burst_length".to_string()),
            ));
        }
        self.check_range(
            "pause_duration",
            self.min_pause_duration,
            self.max_pause_duration,
        )?;
        self.check_range(
            "inter_chunk_delay",
            self.inter_chunk_delay_min,
            self.inter_chunk_delay_max,
        )?;
        self.check_range("read_delay", self.min_read_delay, self.max_read_delay)?;
        for (name, value) in [
            ("min_pause_duration", self.min_pause_duration),
            ("inter_chunk_delay_min", self.inter_chunk_delay_min),
            ("read_delay_factor", self.read_delay_factor),
            ("min_read_delay", self.min_read_delay),
        ] {
            if value < 0.0 {
                return Err(Error::invalid_config(
                    format!("{name} must be non-negative"),
                    Some(name.to_string()),
                ));
            }
        }
        Ok(())
    }

    fn check_range(&self, name: &str, min: f64, max: f64) -> Result<()> {
        if min > max {
            return Err(Error::invalid_config(
                format!("min_{name} exceeds max_{name}"),
                Some(format!("min_{name}")),
            ));
        }
        Ok(())
    }

    /// Returns the connect timeout as a [`std::time::Duration`].
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig::new("test_session", 12345, "test_hash", "+1234567890")
    }

    #[test]
    fn default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn default_pacing_values() {
        let config = config();
        assert_eq!(config.timeout_secs, 30);
        assert!(config.set_typing);
        assert_eq!(config.min_messages, 1);
        assert_eq!(config.max_messages, 3);
        assert_eq!(config.min_typing_speed, 100.0);
        assert_eq!(config.max_typing_speed, 200.0);
        assert_eq!(config.min_burst_length, 5);
        assert_eq!(config.max_burst_length, 15);
        assert_eq!(config.read_delay_factor, 0.05);
        assert_eq!(config.chat_history_limit, 100);
    }

    #[test]
    fn phone_without_plus_rejected() {
        let mut config = config();
        config.phone_number = "1234567890".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.is_invalid_config());
        assert!(err.to_string().contains("phone_number"));
    }

    #[test]
    fn phone_with_letters_rejected() {
        let mut config = config();
        config.phone_number = "+1abc".to_string();
        assert!(config.validate().unwrap_err().is_invalid_config());
    }

    #[test]
    fn zero_api_id_rejected() {
        let mut config = config();
        config.api_id = 0;
        let err = config.validate().unwrap_err();
        assert!(err.is_invalid_config());
        assert!(err.to_string().contains("api_id"));
    }

    #[test]
    fn empty_api_hash_rejected() {
        let mut config = config();
        config.api_hash = String::new();
        assert!(config.validate().unwrap_err().is_invalid_config());
    }

    #[test]
    fn empty_session_name_rejected() {
        let mut config = config();
        config.session_name = String::new();
        assert!(config.validate().unwrap_err().is_invalid_config());
    }

    #[test]
    fn inverted_range_rejected() {
        let mut config = config();
        config.min_typing_speed = 300.0;
        assert!(config.validate().unwrap_err().is_invalid_config());

        let mut config = self::config();
        config.min_messages = 5;
        config.max_messages = 2;
        assert!(config.validate().unwrap_err().is_invalid_config());
    }

    #[test]
    fn builder_pattern() {
        let config = config()
            .with_timeout_secs(10)
            .with_typing_indicator(false)
            .with_message_range(2, 4)
            .with_typing_speed(80.0, 120.0)
            .with_burst_length(3, 8)
            .with_pause_duration(0.1, 0.4)
            .with_inter_chunk_delay(0.5, 1.0)
            .with_read_delay(0.02, 0.2, 0.8)
            .with_chat_history_limit(50);
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout_secs, 10);
        assert!(!config.set_typing);
        assert_eq!(config.max_messages, 4);
        assert_eq!(config.min_typing_speed, 80.0);
        assert_eq!(config.chat_history_limit, 50);
    }

    #[test]
    fn proxy_roundtrips_through_serde() {
        let config = config().with_proxy(ProxyConfig {
            scheme: "socks5".to_string(),
            address: "127.0.0.1".to_string(),
            port: 9050,
            username: None,
            password: None,
            remote_dns: true,
        });
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
