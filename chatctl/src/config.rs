//! Configuration management for chatctl and the relay server

use crate::cli::{Cli, OutputFormat};
use chatrelay_connector_groq::GroqConfig;
use chatrelay_core::errors::CoreError;
use chatrelay_http::HttpBridgeConfig;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Configuration for the chatctl client commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatctlConfig {
    /// chatrelay API endpoint
    pub endpoint: String,
    /// Default output format
    pub default_format: OutputFormat,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for ChatctlConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            default_format: OutputFormat::Table,
            timeout: 30,
        }
    }
}

/// Merge the first existing file of `candidates` and then the explicit path
fn merge_files(mut figment: Figment, candidates: &[&str], config_path: &Option<PathBuf>) -> Result<Figment, CoreError> {
    if let Some(path) = candidates.iter().find(|path| Path::new(path).exists()) {
        figment = figment.merge(Yaml::file(path));
    }

    if let Some(path) = config_path {
        if !path.exists() {
            return Err(CoreError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        figment = figment.merge(Yaml::file(path));
    }

    Ok(figment)
}

impl ChatctlConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: &Option<PathBuf>) -> Result<Self, CoreError> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let figment = merge_files(
            figment,
            &["chatctl.yaml", "chatctl.yml", ".chatctl.yaml", ".chatctl.yml"],
            config_path,
        )?;

        figment
            .merge(Env::prefixed("CHATCTL_"))
            .extract()
            .map_err(|e| CoreError::Configuration(format!("Failed to parse configuration: {}", e)))
    }

    /// Apply CLI argument overrides to the configuration
    pub fn with_overrides(mut self, args: &Cli) -> Self {
        if let Some(ref endpoint) = args.endpoint {
            self.endpoint = endpoint.clone();
        }

        if let Some(format) = args.format {
            self.default_format = format;
        }

        self
    }

    /// Get the full URL for an API path
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }
}

/// Deployment environment of the relay server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Test,
}

/// Listener and middleware settings of the relay server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: IpAddr,
    pub port: u16,
    pub cors_origin: Option<String>,
    pub enable_cors: bool,
    pub request_timeout: u64,
    pub body_limit_bytes: usize,
    pub rate_limit_per_minute: u32,
}

impl Default for ServerSection {
    fn default() -> Self {
        let bridge = HttpBridgeConfig::default();
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: bridge.bind_address.port(),
            cors_origin: bridge.cors_origin,
            enable_cors: bridge.enable_cors,
            request_timeout: bridge.request_timeout,
            body_limit_bytes: bridge.body_limit_bytes,
            rate_limit_per_minute: bridge.rate_limit_per_minute,
        }
    }
}

/// Everything `chatctl serve` needs to run the relay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub environment: Environment,
    pub server: ServerSection,
    pub groq: GroqConfig,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerSection::default(),
            groq: GroqConfig::default(),
        }
    }
}

impl ServerSettings {
    /// Load server settings.
    ///
    /// Later sources win: defaults, `chatrelay.yaml`, `--config`,
    /// `CHATRELAY_*` variables, then `PORT`, `GROQ_API_KEY`, `CORS_ORIGIN`
    /// and `NODE_ENV`.
    pub fn load(config_path: &Option<PathBuf>) -> Result<Self, CoreError> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let figment = merge_files(figment, &["chatrelay.yaml", "chatrelay.yml"], config_path)?;

        let settings: Self = figment
            .merge(Env::prefixed("CHATRELAY_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
            .merge(Env::raw().only(&["GROQ_API_KEY"]).map(|_| "groq.api_key".into()))
            .merge(Env::raw().only(&["CORS_ORIGIN"]).map(|_| "server.cors_origin".into()))
            .merge(Env::raw().only(&["NODE_ENV"]).map(|_| "environment".into()))
            .extract()
            .map_err(|e| CoreError::Configuration(format!("Failed to parse server configuration: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.groq.api_key.trim().is_empty() {
            return Err(CoreError::Configuration(
                "GROQ_API_KEY is required (or set groq.api_key in chatrelay.yaml)".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply `serve` flag overrides
    pub fn with_overrides(mut self, bind: Option<IpAddr>, port: Option<u16>) -> Self {
        if let Some(bind) = bind {
            self.server.host = bind;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Listener settings, with the request timeout raised past the
    /// connector's retry budget when needed
    pub fn bridge_config(&self) -> HttpBridgeConfig {
        let provider_budget = self.groq.call_budget().as_secs() + 1;
        HttpBridgeConfig {
            bind_address: SocketAddr::new(self.server.host, self.server.port),
            cors_origin: self.server.cors_origin.clone(),
            enable_cors: self.server.enable_cors,
            request_timeout: self.server.request_timeout.max(provider_budget),
            body_limit_bytes: self.server.body_limit_bytes,
            rate_limit_per_minute: self.server.rate_limit_per_minute,
            expose_internal_errors: !self.is_production(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ChatctlConfig::default();
        assert_eq!(config.endpoint, "http://localhost:8080");
        assert_eq!(config.default_format, OutputFormat::Table);
        assert_eq!(config.timeout, 30);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "endpoint: http://example.com:9000").unwrap();
        writeln!(temp_file, "timeout: 60").unwrap();

        let config = ChatctlConfig::load(&Some(temp_file.path().to_path_buf())).unwrap();
        assert_eq!(config.endpoint, "http://example.com:9000");
        assert_eq!(config.timeout, 60);
        assert_eq!(config.default_format, OutputFormat::Table);
    }

    #[test]
    fn test_missing_config_file() {
        let result = ChatctlConfig::load(&Some(PathBuf::from("/nonexistent/chatctl.yaml")));
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_api_url_generation() {
        let config = ChatctlConfig::default();
        assert_eq!(config.api_url("/chat"), "http://localhost:8080/chat");

        let config = ChatctlConfig {
            endpoint: "http://example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.api_url("/health"), "http://example.com/health");
    }

    #[test]
    fn test_server_settings_require_api_key() {
        Jail::expect_with(|_jail| {
            let result = ServerSettings::load(&None);
            assert!(matches!(result, Err(CoreError::Configuration(_))));
            Ok(())
        });
    }

    #[test]
    fn test_server_settings_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "chatrelay.yaml",
                "server:\n  port: 9000\n  rate_limit_per_minute: 10\ngroq:\n  api_key: from-file\n  model: llama-3.1-8b-instant\n",
            )?;
            jail.set_env("CHATRELAY_SERVER__RATE_LIMIT_PER_MINUTE", "20");

            let settings = ServerSettings::load(&None).map_err(|e| e.to_string())?;
            assert_eq!(settings.server.port, 9000);
            assert_eq!(settings.server.rate_limit_per_minute, 20);
            assert_eq!(settings.groq.api_key, "from-file");
            assert_eq!(settings.groq.model, "llama-3.1-8b-instant");
            assert_eq!(settings.environment, Environment::Development);
            Ok(())
        });
    }

    #[test]
    fn test_legacy_environment_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("GROQ_API_KEY", "gsk_test");
            jail.set_env("PORT", "3001");
            jail.set_env("CORS_ORIGIN", "http://localhost:3000");
            jail.set_env("NODE_ENV", "production");

            let settings = ServerSettings::load(&None).map_err(|e| e.to_string())?;
            assert_eq!(settings.groq.api_key, "gsk_test");
            assert_eq!(settings.server.port, 3001);
            assert_eq!(settings.server.cors_origin.as_deref(), Some("http://localhost:3000"));
            assert!(settings.is_production());

            let bridge = settings.bridge_config();
            assert_eq!(bridge.bind_address.port(), 3001);
            assert!(!bridge.expose_internal_errors);
            Ok(())
        });
    }

    #[test]
    fn test_serve_overrides() {
        let settings = ServerSettings::default().with_overrides(Some("127.0.0.1".parse().unwrap()), Some(9999));
        let bridge = settings.bridge_config();
        assert_eq!(bridge.bind_address, "127.0.0.1:9999".parse().unwrap());
        assert!(bridge.expose_internal_errors);
    }

    #[test]
    fn test_request_timeout_outlasts_provider_retries() {
        let mut settings = ServerSettings::default();
        assert!(settings.bridge_config().request_timeout > settings.groq.call_budget().as_secs());

        settings.server.request_timeout = 10;
        settings.groq.timeout_ms = 60_000;
        let bridge = settings.bridge_config();
        assert!(bridge.request_timeout > settings.groq.call_budget().as_secs());
        assert_eq!(bridge.request_timeout, 4 * 60 + 3 * 30 + 1);
    }
}
