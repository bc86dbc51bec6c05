// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! This module provides configuration structures and logic for the analyze server,
//! supporting different environments and validation of configuration parameters.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use config::{
    Config, ConfigBuilder, ConfigError, Environment as ConfigEnv, File, builder::DefaultState,
};
use external_apis::{DEFAULT_MORALIS_BASE_URL, MoralisConfig, ScoringConfig};
use serde::{Deserialize, Deserializer, Serialize, de};
use url::Url;

use crate::error::{ServerError, ServerResult};

/// Environment variable holding the Moralis API key
pub const MORALIS_API_KEY_ENV: &str = "MORALIS_API_KEY";

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 in non-testing environments
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Create a safe default port for development
    pub const fn default_development() -> Self {
        Self {
            port: 8080,
            environment: Environment::Development,
        }
    }

    /// Create a safe testing port (port 0)
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Get the port value
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // Re-validated in `load` once the environment is known
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Create a safe default timeout (60 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(60))
    }

    /// Create a safe testing timeout (5 seconds)
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    const fn from_secs_unchecked(seconds: u64) -> Self {
        Self(Duration::from_secs(seconds))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }

    /// Get the timeout value in whole seconds
    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

/// Moralis provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoralisSettings {
    /// Base URL of the Moralis REST API
    pub base_url: Url,
    /// API key sent as `X-API-Key`
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Request timeout
    pub timeout_seconds: TimeoutSeconds,
    /// Health probe timeout
    pub health_check_timeout_seconds: TimeoutSeconds,
}

impl MoralisSettings {
    /// Client configuration for these settings
    pub fn client_config(&self) -> MoralisConfig {
        MoralisConfig {
            base_url: self.base_url.to_string(),
            api_key: self.api_key.clone(),
            timeout_seconds: self.timeout_seconds.as_secs(),
            health_check_timeout_seconds: self.health_check_timeout_seconds.as_secs(),
        }
    }
}

/// ML scoring service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    /// Whether transactions are forwarded for scoring at all
    pub enabled: bool,
    /// Scoring endpoint; required when `enabled`
    #[serde(default)]
    pub url: Option<Url>,
    /// Health probe URL; defaults to `health` next to `url`
    #[serde(default)]
    pub health_url: Option<Url>,
    /// Request timeout, independent of the Moralis timeout
    pub timeout_seconds: TimeoutSeconds,
}

impl ScoringSettings {
    /// Client configuration, or `None` when scoring is disabled
    pub fn client_config(&self) -> Option<ScoringConfig> {
        if !self.enabled {
            return None;
        }
        let url = self.url.as_ref()?;
        Some(ScoringConfig {
            url: url.to_string(),
            health_url: self.health_url.as_ref().map(ToString::to_string),
            timeout_seconds: self.timeout_seconds.as_secs(),
        })
    }
}

/// Cross-origin resource sharing policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins, `*` for any
    pub allowed_origins: Vec<String>,
    /// Allowed request methods
    pub allowed_methods: Vec<String>,
    /// Allowed request headers, `*` for any
    pub allowed_headers: Vec<String>,
    /// Response headers exposed to the browser
    #[serde(default)]
    pub exposed_headers: Vec<String>,
    /// Whether credentials may be sent
    #[serde(default)]
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allowed_headers: ["Content-Type", "Authorization"].map(String::from).to_vec(),
            exposed_headers: Vec::new(),
            allow_credentials: false,
        }
    }
}

/// Server configuration for different environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: IpAddr,
    /// Server port (validated for environment compatibility)
    pub port: ServerPort,
    /// Request timeout in seconds (validated range: 1-300)
    pub timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// Moralis provider settings
    pub moralis: MoralisSettings,
    /// Scoring service settings
    pub scoring: ScoringSettings,
    /// CORS policy
    #[serde(default)]
    pub cors: CorsConfig,
}

#[allow(clippy::expect_used)]
fn default_moralis_base_url() -> Url {
    Url::parse(DEFAULT_MORALIS_BASE_URL).expect("default Moralis URL should parse")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::default_development(),
            timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            moralis: MoralisSettings {
                base_url: default_moralis_base_url(),
                api_key: String::new(),
                timeout_seconds: TimeoutSeconds::from_secs_unchecked(30),
                health_check_timeout_seconds: TimeoutSeconds::from_secs_unchecked(5),
            },
            scoring: ScoringSettings {
                enabled: false,
                url: None,
                health_url: None,
                timeout_seconds: TimeoutSeconds::from_secs_unchecked(10),
            },
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        let config = Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })?;
        config.validate().map_err(|e| ServerError::Config {
            message: format!("invalid configuration: {e}"),
        })?;
        Ok(config)
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific files (config.{env}.json)
    /// 4. Environment variables with `SERVER_` prefix, `__` between nested keys
    ///    (e.g. `SERVER_SCORING__URL`)
    /// 5. `MORALIS_API_KEY`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Self::with_defaults(Config::builder())?
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(
                ConfigEnv::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("cors.allowed_methods")
                    .with_list_parse_key("cors.allowed_headers")
                    .with_list_parse_key("cors.exposed_headers")
                    .try_parsing(true),
            );

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        if let Ok(api_key) = std::env::var(MORALIS_API_KEY_ENV) {
            config_builder = config_builder.set_override("moralis.api_key", api_key)?;
        }

        Self::finish(config_builder)
    }

    /// Default values for every key
    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let cors = CorsConfig::default();
        builder
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("timeout_seconds", 60)?
            .set_default("environment", "development")?
            .set_default("moralis.base_url", DEFAULT_MORALIS_BASE_URL)?
            .set_default("moralis.api_key", "")?
            .set_default("moralis.timeout_seconds", 30)?
            .set_default("moralis.health_check_timeout_seconds", 5)?
            .set_default("scoring.enabled", false)?
            .set_default("scoring.timeout_seconds", 10)?
            .set_default("cors.allowed_origins", cors.allowed_origins)?
            .set_default("cors.allowed_methods", cors.allowed_methods)?
            .set_default("cors.allowed_headers", cors.allowed_headers)?
            .set_default("cors.exposed_headers", cors.exposed_headers)?
            .set_default("cors.allow_credentials", cors.allow_credentials)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config = builder.build()?;
        let mut server_config: Self = config.try_deserialize()?;

        // Fix the ServerPort to have the correct environment context
        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;

        Ok(server_config)
    }

    /// Check cross-field constraints the types cannot express
    ///
    /// # Errors
    ///
    /// Returns an error if the Moralis API key is missing, scoring is enabled
    /// without a URL, or the request timeout does not outlast the upstream calls
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.moralis.api_key.trim().is_empty(),
            "Moralis API key is not set (use {MORALIS_API_KEY_ENV} or moralis.api_key)"
        );
        ensure!(
            !self.scoring.enabled || self.scoring.url.is_some(),
            "scoring.url is required when scoring is enabled"
        );

        // A request that times out inside the server layer bypasses the
        // enrichment fallback and the upstream error mapping.
        let upstream_budget = self.upstream_budget_seconds();
        ensure!(
            self.timeout_seconds.as_secs() > upstream_budget,
            "timeout_seconds ({}) must exceed the upstream budget of {upstream_budget}s \
             (moralis.timeout_seconds plus scoring.timeout_seconds when scoring is enabled)",
            self.timeout_seconds.as_secs()
        );
        Ok(())
    }

    /// Worst-case time spent in the sequential Moralis and scoring calls
    pub fn upstream_budget_seconds(&self) -> u64 {
        let scoring = if self.scoring.enabled {
            self.scoring.timeout_seconds.as_secs()
        } else {
            0
        };
        self.moralis.timeout_seconds.as_secs() + scoring
    }

    /// Create configuration optimized for testing
    ///
    /// Moralis points at `moralis_base_url` with a fixed test key and scoring
    /// is disabled. Upstream timeouts are short enough that both calls fit
    /// inside the request timeout.
    pub fn for_testing(moralis_base_url: Url) -> Self {
        let defaults = Self::default();
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(), // let OS choose available port
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            moralis: MoralisSettings {
                base_url: moralis_base_url,
                api_key: "test-api-key".to_string(),
                timeout_seconds: TimeoutSeconds::from_secs_unchecked(2),
                health_check_timeout_seconds: TimeoutSeconds::from_secs_unchecked(1),
            },
            scoring: ScoringSettings {
                timeout_seconds: TimeoutSeconds::from_secs_unchecked(2),
                ..defaults.scoring
            },
            ..defaults
        }
    }

    /// Enable scoring against `url`
    #[must_use]
    pub fn with_scoring(mut self, url: Url) -> Self {
        self.scoring.enabled = true;
        self.scoring.url = Some(url);
        self
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}
