//! CLI configuration loader for the weather agent
//!
//! Sources are layered, lowest priority first:
//! 1. Built-in defaults
//! 2. Config file: `--config <file>`, else `./weather-agent.toml` when present
//! 3. Environment: `WEATHER_AGENT__<SECTION>__<KEY>`
//! 4. Well-known variables: `AWS_REGION` / `AWS_DEFAULT_REGION`,
//!    `AWS_BEARER_TOKEN_BEDROCK`, `OTEL_EXPORTER_OTLP_ENDPOINT`
//! 5. Flag overrides

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use weather_agent_core::{
    AgentConfig, InvokeConfig, ModelConfig, RuntimeConfig, TelemetryConfig,
};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "weather-agent.toml";

const ENV_PREFIX: &str = "WEATHER_AGENT";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub agent: AgentConfig,
    pub telemetry: TelemetryConfig,
    pub runtime: RuntimeConfig,
    pub invoke: InvokeConfig,
}

/// CLI configuration loader
#[derive(Default)]
pub struct CliConfigLoader {
    /// Explicit config file path
    config_override: Option<PathBuf>,
    /// Flag overrides
    model_override: Option<String>,
    region_override: Option<String>,
    /// Directory searched for the default config file
    working_dir: Option<PathBuf>,
    /// Environment snapshot; the process environment when unset
    env: Option<config::Map<String, String>>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Set region override
    pub fn with_region_override(mut self, region: String) -> Self {
        self.region_override = Some(region);
        self
    }

    /// Look for the default config file in `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Read variables from `env` instead of the process environment
    pub fn with_env(mut self, env: config::Map<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Load and resolve configuration
    pub fn load(&self) -> Result<AppConfig> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to encode default configuration")?;

        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = &self.config_override {
            if !is_supported_config_file(path) {
                anyhow::bail!(
                    "Unsupported config file format: {} (expected .toml, .json or .yaml)",
                    path.display()
                );
            }
            builder = builder.add_source(File::from(path.as_path()).required(true));
        } else if let Some(path) = self.default_config_file()? {
            tracing::debug!("Using config file {}", path.display());
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(self.env.clone()),
        );

        let mut config: AppConfig = builder
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        self.apply_well_known_env(&mut config);
        self.apply_flag_overrides(&mut config);

        config
            .model
            .validate()
            .context("Invalid model configuration")?;

        Ok(config)
    }

    fn default_config_file(&self) -> Result<Option<PathBuf>> {
        let dir = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let path = dir.join(DEFAULT_CONFIG_FILE);
        Ok(path.exists().then_some(path))
    }

    fn env_var(&self, key: &str) -> Option<String> {
        let value = match &self.env {
            Some(env) => env.get(key).cloned(),
            None => std::env::var(key).ok(),
        };
        value.filter(|v| !v.is_empty())
    }

    fn apply_well_known_env(&self, config: &mut AppConfig) {
        if let Some(region) = self
            .env_var("AWS_REGION")
            .or_else(|| self.env_var("AWS_DEFAULT_REGION"))
        {
            config.model.region = region.clone();
            config.invoke.region = region;
        }
        if let Some(token) = self.env_var("AWS_BEARER_TOKEN_BEDROCK") {
            config.model.bearer_token = Some(token);
        }
        if let Some(endpoint) = self.env_var("OTEL_EXPORTER_OTLP_ENDPOINT") {
            config.telemetry.otlp_endpoint = Some(endpoint);
        }
    }

    fn apply_flag_overrides(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model_override {
            config.model.model_id = model.clone();
        }
        if let Some(region) = &self.region_override {
            config.model.region = region.clone();
            config.invoke.region = region.clone();
        }
    }
}

/// Whether `path` looks like a config file the loader can read
pub fn is_supported_config_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("toml" | "json" | "yaml" | "yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use weather_agent_core::config::{DEFAULT_MODEL_ID, DEFAULT_REGION};

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn loader_in(dir: &TempDir, vars: &[(&str, &str)]) -> CliConfigLoader {
        CliConfigLoader::new()
            .with_working_dir(dir.path().to_path_buf())
            .with_env(env(vars))
    }

    #[test]
    fn test_defaults_without_sources() {
        let dir = TempDir::new().unwrap();
        let config = loader_in(&dir, &[]).load().unwrap();

        assert_eq!(config.model.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.model.region, DEFAULT_REGION);
        assert_eq!(config.model.bearer_token, None);
        assert_eq!(config.agent.tools, vec!["http_request"]);
        assert_eq!(config.agent.trace_attributes.user_id, "demo-123");
        assert_eq!(config.runtime.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.invoke.qualifier, "DEFAULT");
        assert_eq!(config.telemetry.otlp_endpoint, None);
    }

    #[test]
    fn test_default_file_in_working_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"
[model]
model_id = "us.anthropic.claude-3-7-sonnet-20250219-v1:0"

[model.params]
max_tokens = 2048

[agent]
max_cycles = 5

[agent.trace_attributes]
user_email = "ops@example.com"

[runtime]
port = 9000
"#,
        )
        .unwrap();

        let config = loader_in(&dir, &[]).load().unwrap();

        assert_eq!(
            config.model.model_id,
            "us.anthropic.claude-3-7-sonnet-20250219-v1:0"
        );
        assert_eq!(config.model.region, DEFAULT_REGION);
        assert_eq!(config.model.params.max_tokens, Some(2048));
        assert_eq!(config.agent.max_cycles, 5);
        assert_eq!(config.agent.name, "weather_agent");
        assert_eq!(config.agent.trace_attributes.user_email, "ops@example.com");
        assert_eq!(config.agent.trace_attributes.user_id, "demo-123");
        assert_eq!(config.runtime.port, 9000);
        assert_eq!(config.runtime.host, "0.0.0.0");
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[invoke]\nagent_runtime_arn = \"arn:aws:bedrock-agentcore:us-west-2:1:runtime/x\"\n")
            .unwrap();

        let config = loader_in(&dir, &[])
            .with_config_override(path)
            .load()
            .unwrap();
        assert_eq!(
            config.invoke.agent_runtime_arn.as_deref(),
            Some("arn:aws:bedrock-agentcore:us-west-2:1:runtime/x")
        );
    }

    #[test]
    fn test_missing_explicit_config_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = loader_in(&dir, &[])
            .with_config_override(dir.path().join("absent.toml"))
            .load();
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_config_extension_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.conf");
        fs::write(&path, "[runtime]\nport = 9000\n").unwrap();

        let err = loader_in(&dir, &[])
            .with_config_override(path)
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format"));
    }

    #[test]
    fn test_environment_beats_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[runtime]\nport = 9000\n").unwrap();

        let config = loader_in(
            &dir,
            &[
                ("WEATHER_AGENT__RUNTIME__PORT", "9100"),
                ("WEATHER_AGENT__TELEMETRY__SERVICE_NAME", "weather-agent-dev"),
            ],
        )
        .load()
        .unwrap();

        assert_eq!(config.runtime.port, 9100);
        assert_eq!(config.telemetry.service_name, "weather-agent-dev");
    }

    #[test]
    fn test_well_known_environment() {
        let dir = TempDir::new().unwrap();
        let config = loader_in(
            &dir,
            &[
                ("AWS_DEFAULT_REGION", "eu-west-1"),
                ("AWS_BEARER_TOKEN_BEDROCK", "bedrock-key"),
                ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4318"),
            ],
        )
        .load()
        .unwrap();

        assert_eq!(config.model.region, "eu-west-1");
        assert_eq!(config.invoke.region, "eu-west-1");
        assert_eq!(config.model.bearer_token.as_deref(), Some("bedrock-key"));
        assert_eq!(
            config.telemetry.otlp_endpoint.as_deref(),
            Some("http://localhost:4318")
        );

        let config = loader_in(
            &dir,
            &[("AWS_REGION", "us-west-2"), ("AWS_DEFAULT_REGION", "eu-west-1")],
        )
        .load()
        .unwrap();
        assert_eq!(config.model.region, "us-west-2");
    }

    #[test]
    fn test_flags_beat_environment() {
        let dir = TempDir::new().unwrap();
        let config = loader_in(&dir, &[("AWS_REGION", "us-west-2")])
            .with_model_override("us.amazon.nova-pro-v1:0".to_string())
            .with_region_override("ap-southeast-2".to_string())
            .load()
            .unwrap();

        assert_eq!(config.model.model_id, "us.amazon.nova-pro-v1:0");
        assert_eq!(config.model.region, "ap-southeast-2");
        assert_eq!(config.invoke.region, "ap-southeast-2");
    }

    #[test]
    fn test_invalid_model_params_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[model.params]\ntemperature = 1.5\n",
        )
        .unwrap();

        assert!(loader_in(&dir, &[]).load().is_err());
    }

    #[test]
    fn test_supported_config_file() {
        assert!(is_supported_config_file(Path::new("weather-agent.toml")));
        assert!(is_supported_config_file(Path::new("conf/agent.json")));
        assert!(!is_supported_config_file(Path::new("agent.conf")));
    }
}
