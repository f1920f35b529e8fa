use super::{InitialStateConfig, OrchestratorConfig, PolicyConfig, TelemetryConfig};
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed on load, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub state: InitialStateConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.state.validate()?;
        self.policy.validate()?;
        self.telemetry.validate()?;
        self.orchestrator.validate()?;
        Ok(())
    }

    /// `~/.cyclegate/config.toml`, written with defaults on first use.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let cyclegate_dir = home.join(".cyclegate");
        let config_path = cyclegate_dir.join("config.toml");

        if !cyclegate_dir.exists() {
            fs::create_dir_all(&cyclegate_dir).context("Failed to create .cyclegate directory")?;
        }

        if config_path.exists() {
            let mut config = load_from_path(&config_path)?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        } else {
            let mut config = Self {
                config_path,
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load an explicit config file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = load_from_path(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(lock) = env_flag("CYCLEGATE_POLICY_LOCK") {
            self.policy.lock = lock;
        }

        if let Some(force) = env_flag("CYCLEGATE_POLICY_OVERRIDE") {
            self.policy.override_authorize = force;
        }

        if let Ok(backend) = std::env::var("CYCLEGATE_TELEMETRY_BACKEND") {
            match backend.parse() {
                Ok(parsed) => self.telemetry.backend = parsed,
                Err(_) => {
                    tracing::warn!(backend = %backend, "ignoring unknown CYCLEGATE_TELEMETRY_BACKEND");
                }
            }
        }

        if let Ok(ttl) = std::env::var("CYCLEGATE_INTENT_TTL_SECS") {
            match ttl.trim().parse::<u64>() {
                Ok(secs) => self.orchestrator.intent_ttl_secs = Some(secs),
                Err(_) => tracing::warn!(ttl = %ttl, "ignoring invalid CYCLEGATE_INTENT_TTL_SECS"),
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}

/// Parse and validate `path` without touching the environment.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let mut config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
    config.config_path = path.to_path_buf();
    config.validate()?;
    Ok(config)
}

fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key, value = %value, "ignoring non-boolean override");
            None
        }
    }
}
