// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::core::{AppConfig, ChecksConfig};
use super::validation::ConfigValidator;

pub const ENV_LOG_LEVEL: &str = "VULCHECK_LOG_LEVEL";
pub const ENV_PROBE_TIMEOUT: &str = "VULCHECK_PROBE_TIMEOUT";
pub const ENV_ENABLE_ALL: &str = "VULCHECK_ENABLE_ALL";

pub struct ConfigLoader {
    config_path: PathBuf,
    format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref().to_path_buf();
        let format = Self::detect_format(&path)?;

        Ok(Self {
            config_path: path,
            format,
        })
    }

    pub fn with_format<P: AsRef<Path>>(config_path: P, format: ConfigFormat) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            format,
        }
    }

    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config file format"))?;

        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(anyhow::anyhow!("Unsupported config file format: {}", extension)),
        }
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        let config = self.load_unvalidated()?;
        ConfigValidator::validate_app_config(&config)?;
        Ok(config)
    }

    /// Read, parse and apply env overrides, leaving range checks to the caller
    pub fn load_unvalidated(&self) -> Result<AppConfig> {
        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;

        let mut config = self.parse(&content)?;
        Self::apply_overrides(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn parse(&self, content: &str) -> Result<AppConfig> {
        let config = match self.format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .context("Failed to parse YAML config")?,
            ConfigFormat::Toml => toml::from_str(content)
                .context("Failed to parse TOML config")?,
            ConfigFormat::Json => serde_json::from_str(content)
                .context("Failed to parse JSON config")?,
        };
        Ok(config)
    }

    /// Apply `VULCHECK_*` overrides read through `lookup`
    pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            config.observability.log_level = log_level;
        }

        if let Some(timeout) = lookup(ENV_PROBE_TIMEOUT) {
            config.probe.timeout_secs = timeout
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}", ENV_PROBE_TIMEOUT))?;
        }

        if let Some(flag) = lookup(ENV_ENABLE_ALL) {
            if matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes") {
                config.checks = ChecksConfig::all_enabled();
            }
        }

        Ok(())
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        ConfigValidator::validate_app_config(config)?;

        let content = match self.format {
            ConfigFormat::Yaml => serde_yaml::to_string(config)?,
            ConfigFormat::Toml => toml::to_string_pretty(config)?,
            ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        };

        std::fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", self.config_path))?;

        Ok(())
    }
}

/// Load from `path` if given and present, otherwise defaults; env overrides always apply
pub fn load_config_with_overrides(path: Option<&Path>) -> Result<AppConfig> {
    let config = load_unvalidated_config(path)?;
    ConfigValidator::validate_app_config(&config)?;
    Ok(config)
}

/// Same sources as [`load_config_with_overrides`] without validation, for
/// reporting on a config that may be out of range
pub fn load_unvalidated_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(p) if p.exists() => ConfigLoader::new(p)?.load_unvalidated(),
        _ => {
            let mut config = AppConfig::default();
            ConfigLoader::apply_overrides(&mut config, |key| std::env::var(key).ok())?;
            Ok(config)
        }
    }
}
