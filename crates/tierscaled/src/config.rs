//! tierscale.toml configuration.
//!
//! Every table and key is optional; missing values keep their defaults.
//!
//! ```toml
//! [simulation]
//! tick_interval_ms = 1000
//! seed = 42
//! initial_traffic = 100.0
//! auto_scaling = true
//! start_playing = true
//!
//! [autoscale]
//! server_scale_up = 0.8
//!
//! [advisor]
//! endpoint = "127.0.0.1:8085"
//! path = "/v1/generate"
//! timeout_ms = 10000
//! token_env = "TIERSCALE_ADVISOR_TOKEN"
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 8080
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use tierscale_advisor::AdvisorConfig;
use tierscale_autoscale::AutoscalePolicy;
use tierscale_engine::{ConfigError, SimulationConfig};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tierscale.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierscaleConfig {
    pub simulation: SimulationConfig,
    pub autoscale: AutoscalePolicy,
    pub advisor: AdvisorConfig,
    pub server: ServerConfig,
}

impl TierscaleConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: TierscaleConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load `path` if given, else `tierscale.toml` if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.autoscale
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("autoscale: {e}")))?;
        if self.advisor.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "advisor.timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_is_default() {
        let config = TierscaleConfig::parse("").unwrap();
        assert_eq!(config, TierscaleConfig::default());
        assert_eq!(config.server.addr().port(), 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_file() {
        let config = TierscaleConfig::parse(
            r#"
[simulation]
tick_interval_ms = 250
seed = 42
initial_traffic = 600.0
auto_scaling = false

[autoscale]
server_scale_up = 0.9

[advisor]
endpoint = "127.0.0.1:8085"
timeout_ms = 3000

[server]
bind = "127.0.0.1"
port = 9090
"#,
        )
        .unwrap();

        assert_eq!(config.simulation.tick_interval_ms, 250);
        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.simulation.initial_traffic, 600.0);
        assert!(!config.simulation.auto_scaling);
        assert!(config.simulation.start_playing);
        assert_eq!(config.autoscale.server_scale_up, 0.9);
        assert_eq!(config.autoscale.server_scale_down, 0.3);
        assert_eq!(config.advisor.endpoint.as_deref(), Some("127.0.0.1:8085"));
        assert_eq!(config.advisor.path, "/v1/generate");
        assert_eq!(config.server.addr().to_string(), "127.0.0.1:9090");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_thresholds_rejected() {
        let config = TierscaleConfig::parse(
            "[autoscale]\nserver_scale_up = 0.2\nserver_scale_down = 0.5\n",
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_tick_interval_rejected() {
        let config = TierscaleConfig::parse("[simulation]\ntick_interval_ms = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            TierscaleConfig::parse("[simulation\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn from_file_reads_and_reports_missing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 7000").unwrap();
        let config = TierscaleConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 7000);

        let missing = TierscaleConfig::from_file(Path::new("/nonexistent/tierscale.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
