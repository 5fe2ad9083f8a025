use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Deployment stage, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    #[default]
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Settings for the marketplace service, assembled from `APP_*` variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub uploads: UploadConfig,
}

impl AppConfig {
    /// Read the process environment, after merging any `.env` file.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let environment = read("APP_ENV")
            .map(|value| AppEnvironment::parse(&value))
            .unwrap_or_default();

        let port = match read("APP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort { value: raw })?,
            None => DEFAULT_PORT,
        };

        let server = ServerConfig {
            host: read("APP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        };
        let telemetry = TelemetryConfig {
            log_level: read("APP_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        };
        let uploads = UploadConfig {
            directory: read("APP_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(UploadConfig::default_directory),
        };

        Ok(Self {
            environment,
            server,
            telemetry,
            uploads,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = self.host.trim();
        let ip = if host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            host.parse().map_err(|source| ConfigError::InvalidHost {
                value: host.to_string(),
                source,
            })?
        };

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where listing images are written and served from.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub directory: PathBuf,
}

impl UploadConfig {
    fn default_directory() -> PathBuf {
        PathBuf::from("static").join("uploads")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort {
        value: String,
    },
    InvalidHost {
        value: String,
        source: std::net::AddrParseError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort { value } => {
                write!(f, "APP_PORT must be a port number, got '{value}'")
            }
            ConfigError::InvalidHost { value, .. } => {
                write!(f, "APP_HOST must be localhost or an IP address, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort { .. } => None,
            ConfigError::InvalidHost { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Mutex, OnceLock};

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = from_pairs(&[]).expect("defaults load");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(
            config.uploads.directory,
            PathBuf::from("static").join("uploads")
        );
    }

    #[test]
    fn reads_every_variable() {
        let config = from_pairs(&[
            ("APP_ENV", "Production"),
            ("APP_HOST", "0.0.0.0"),
            ("APP_PORT", "8080"),
            ("APP_LOG_LEVEL", "estate_hub=debug"),
            ("APP_UPLOAD_DIR", "/var/lib/estate-hub/images"),
        ])
        .expect("config loads");

        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.telemetry.log_level, "estate_hub=debug");
        assert_eq!(
            config.uploads.directory,
            PathBuf::from("/var/lib/estate-hub/images")
        );
        assert_eq!(
            config.server.socket_addr().expect("address"),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080)
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = from_pairs(&[("APP_PORT", "  "), ("APP_UPLOAD_DIR", "")]).expect("loads");
        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.uploads.directory,
            PathBuf::from("static").join("uploads")
        );
    }

    #[test]
    fn rejects_out_of_range_port() {
        match from_pairs(&[("APP_PORT", "70000")]) {
            Err(ConfigError::InvalidPort { value }) => assert_eq!(value, "70000"),
            other => panic!("expected invalid port, got {other:?}"),
        }
    }

    #[test]
    fn localhost_resolves_and_hostnames_are_rejected() {
        let config = from_pairs(&[("APP_HOST", "LocalHost")]).expect("loads");
        assert_eq!(
            config.server.socket_addr().expect("localhost resolves"),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000)
        );

        let config = from_pairs(&[("APP_HOST", "estate.example")]).expect("loads");
        assert!(matches!(
            config.server.socket_addr(),
            Err(ConfigError::InvalidHost { .. })
        ));
    }

    #[test]
    fn load_reads_process_environment() {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        let _lock = GUARD
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env mutex poisoned");

        env::set_var("APP_UPLOAD_DIR", "/srv/estate-hub/uploads");
        let config = AppConfig::load().expect("config loads");
        env::remove_var("APP_UPLOAD_DIR");

        assert_eq!(
            config.uploads.directory,
            PathBuf::from("/srv/estate-hub/uploads")
        );
    }
}
