//! TOML configuration for the client, read from `cellfetch.toml`.
//!
//! Every field has a default equal to the value compiled into the binary, so
//! a device with no config file behaves exactly like the firmware build.
//! Server host, port and TLS use can also be overridden at build time through
//! the `CELLFETCH_SERVER_HOST`, `CELLFETCH_SERVER_PORT` and
//! `CELLFETCH_TLS_ENABLED` environment variables.
//!
//! ```toml
//! [server]
//! host = "139.162.251.115"
//! port = 42512
//! host_header = "139.162.251.115:42512"
//! tls_enabled = false
//! security_tag = 42
//!
//! [timing]
//! retry_delay_ms = 1000
//! connect_timeout_ms = 30000
//! io_timeout_ms = 30000
//!
//! [exchange]
//! receive_buffer_size = 8192
//! dispatch_commands = false
//!
//! [logging]
//! log_level = "info"
//! ```
//!
//! Missing sections and fields fall back to their defaults through
//! `#[serde(default = "...")]`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cellfetch_core::{SecurityTag, DEFAULT_RECEIVE_CAPACITY, DEFAULT_SECURITY_TAG};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::exchange::ExchangeConfig;
use crate::application::session::SessionConfig;
use crate::application::startup::StartupPlan;
use crate::application::supervisor::SupervisorConfig;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "cellfetch.toml";

/// Server host compiled into the binary.
pub const DEFAULT_SERVER_HOST: &str = match option_env!("CELLFETCH_SERVER_HOST") {
    Some(host) => host,
    None => "139.162.251.115",
};

const FALLBACK_SERVER_PORT: u16 = 42512;

/// Root CA provisioned under the security tag at startup.
pub static EMBEDDED_ROOT_CA: &[u8] = include_bytes!("../../certs/root_ca.pem");

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub exchange: ExchangeSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where to connect and how.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Hostname or dotted IPv4 address, resolved once at startup.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Value of the request's `Host` header.
    #[serde(default = "default_host_header")]
    pub host_header: String,
    #[serde(default = "default_tls_enabled")]
    pub tls_enabled: bool,
    /// Security tag the root certificate is provisioned under.
    #[serde(default = "default_security_tag")]
    pub security_tag: u32,
}

/// Delays and timeouts, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub io_timeout_ms: u64,
}

/// Request/response exchange settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeSettings {
    #[serde(default = "default_receive_buffer_size")]
    pub receive_buffer_size: usize,
    /// Decode the response body into a device command and apply it.
    #[serde(default)]
    pub dispatch_commands: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    DEFAULT_SERVER_HOST.to_string()
}
fn default_port() -> u16 {
    option_env!("CELLFETCH_SERVER_PORT")
        .and_then(|p| p.parse().ok())
        .unwrap_or(FALLBACK_SERVER_PORT)
}
fn default_host_header() -> String {
    format!("{}:{}", default_host(), default_port())
}
fn default_tls_enabled() -> bool {
    matches!(option_env!("CELLFETCH_TLS_ENABLED"), Some("1" | "true" | "yes"))
}
fn default_security_tag() -> u32 {
    DEFAULT_SECURITY_TAG.value()
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_receive_buffer_size() -> usize {
    DEFAULT_RECEIVE_CAPACITY
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            host_header: default_host_header(),
            tls_enabled: default_tls_enabled(),
            security_tag: default_security_tag(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            connect_timeout_ms: default_timeout_ms(),
            io_timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            receive_buffer_size: default_receive_buffer_size(),
            dispatch_commands: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ── Loading and conversion ────────────────────────────────────────────────────

impl ClientConfig {
    /// Parses and validates config text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for values the client cannot run with.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the client cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".into()));
        }
        if self.server.host_header.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "server.host_header must not be empty".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".into()));
        }
        if self.exchange.receive_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "exchange.receive_buffer_size must be greater than 0".into(),
            ));
        }
        for (name, value) in [
            ("timing.retry_delay_ms", self.timing.retry_delay_ms),
            ("timing.connect_timeout_ms", self.timing.connect_timeout_ms),
            ("timing.io_timeout_ms", self.timing.io_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be greater than 0"
                )));
            }
        }
        Ok(())
    }

    pub fn security_tag(&self) -> SecurityTag {
        SecurityTag(self.server.security_tag)
    }

    /// The startup sequence for this configuration.
    pub fn startup_plan(&self, root_certificate: &[u8]) -> StartupPlan {
        StartupPlan {
            server_host: self.server.host.clone(),
            server_port: self.server.port,
            security_tag: self.security_tag(),
            root_certificate: root_certificate.to_vec(),
        }
    }
}

impl From<&ClientConfig> for SupervisorConfig {
    fn from(config: &ClientConfig) -> Self {
        SupervisorConfig {
            session: SessionConfig {
                secure: config.server.tls_enabled,
                security_tag: config.security_tag(),
                connect_timeout: Duration::from_millis(config.timing.connect_timeout_ms),
            },
            exchange: ExchangeConfig {
                io_timeout: Duration::from_millis(config.timing.io_timeout_ms),
                receive_capacity: config.exchange.receive_buffer_size,
            },
            retry_delay: Duration::from_millis(config.timing.retry_delay_ms),
            host_header: config.server.host_header.clone(),
            dispatch_commands: config.exchange.dispatch_commands,
        }
    }
}

/// Loads `ClientConfig` from `path`, returning the compiled-in defaults if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::Invalid`] if a value fails validation.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => ClientConfig::from_toml(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_compiled_in_values() {
        // Arrange / Act
        let cfg = ClientConfig::default();

        // Assert
        assert_eq!(cfg.server.security_tag, 42);
        assert_eq!(cfg.timing.retry_delay_ms, 1000);
        assert_eq!(cfg.exchange.receive_buffer_size, 8192);
        assert!(!cfg.exchange.dispatch_commands);
        assert_eq!(cfg.logging.log_level, "info");
        assert_eq!(
            cfg.server.host_header,
            format!("{}:{}", cfg.server.host, cfg.server.port)
        );
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let cfg = ClientConfig::from_toml("").unwrap();
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        // Arrange
        let text = r#"
            [server]
            host = "device-api.example"
            tls_enabled = true

            [exchange]
            dispatch_commands = true
        "#;

        // Act
        let cfg = ClientConfig::from_toml(text).unwrap();

        // Assert
        assert_eq!(cfg.server.host, "device-api.example");
        assert!(cfg.server.tls_enabled);
        assert!(cfg.exchange.dispatch_commands);
        assert_eq!(cfg.exchange.receive_buffer_size, 8192);
        assert_eq!(cfg.timing, TimingConfig::default());
    }

    #[test]
    fn test_zero_buffer_size_is_rejected() {
        let text = "[exchange]\nreceive_buffer_size = 0\n";
        let err = ClientConfig::from_toml(text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_host_is_rejected() {
        let text = "[server]\nhost = \"  \"\n";
        let err = ClientConfig::from_toml(text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = ClientConfig::from_toml("[server\nport = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("cellfetch-does-not-exist/cellfetch.toml");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_supervisor_config_carries_timing_and_tls() {
        // Arrange
        let mut cfg = ClientConfig::default();
        cfg.server.tls_enabled = true;
        cfg.timing.retry_delay_ms = 250;
        cfg.timing.io_timeout_ms = 1500;

        // Act
        let sup = SupervisorConfig::from(&cfg);

        // Assert
        assert!(sup.session.secure);
        assert_eq!(sup.session.security_tag, SecurityTag(42));
        assert_eq!(sup.retry_delay, Duration::from_millis(250));
        assert_eq!(sup.exchange.io_timeout, Duration::from_millis(1500));
        assert_eq!(sup.host_header, cfg.server.host_header);
    }

    #[test]
    fn test_zero_retry_delay_is_rejected() {
        let text = "[timing]\nretry_delay_ms = 0\n";
        let err = ClientConfig::from_toml(text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("retry_delay_ms")));
    }

    #[test]
    fn test_zero_connect_timeout_is_rejected() {
        let text = "[timing]\nconnect_timeout_ms = 0\n";
        let err = ClientConfig::from_toml(text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("connect_timeout_ms")));
    }

    #[test]
    fn test_zero_io_timeout_is_rejected() {
        let text = "[timing]\nio_timeout_ms = 0\n";
        let err = ClientConfig::from_toml(text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("io_timeout_ms")));
    }

    #[test]
    fn test_embedded_root_ca_is_a_pem_certificate() {
        // Arrange
        let text = std::str::from_utf8(EMBEDDED_ROOT_CA).unwrap();
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();

        // Act
        let begin = lines
            .iter()
            .position(|l| *l == "-----BEGIN CERTIFICATE-----")
            .expect("no BEGIN CERTIFICATE line");
        let end = lines
            .iter()
            .position(|l| *l == "-----END CERTIFICATE-----")
            .expect("no END CERTIFICATE line");

        // Assert – a non-empty base64 body between the markers
        assert!(begin + 1 < end);
        assert!(lines[begin + 1..end].iter().all(|l| {
            !l.is_empty()
                && l.bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
        }));
    }
}
