// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use validator::Validate;

use super::core::AppConfig;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_app_config(config: &AppConfig) -> Result<()> {
        config.validate()
            .context("Configuration validation failed")?;

        Self::validate_whitelist(config)?;
        Self::validate_scope(config)?;
        Self::validate_observability(config)?;

        Ok(())
    }

    fn validate_whitelist(config: &AppConfig) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &config.whitelist {
            let domain = entry.domain.trim().to_lowercase();
            if domain.is_empty() {
                return Err(anyhow::anyhow!("Whitelist domain cannot be empty"));
            }
            if !seen.insert(domain.clone()) {
                return Err(anyhow::anyhow!("Duplicate whitelist domain: {}", domain));
            }
        }
        Ok(())
    }

    fn validate_scope(config: &AppConfig) -> Result<()> {
        if config.scope.enforce && config.scope.hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(anyhow::anyhow!(
                "Scope enforcement requires at least one host"
            ));
        }
        Ok(())
    }

    fn validate_observability(config: &AppConfig) -> Result<()> {
        let level = config.observability.log_level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}",
                config.observability.log_level
            ));
        }
        Ok(())
    }

    pub fn generate_validation_report(config: &AppConfig) -> ValidationReport {
        let mut report = ValidationReport::new();

        if let Err(e) = Self::validate_app_config(config) {
            report.add_error("app_config", &format!("{:#}", e));
        }

        let checks = &config.checks;
        if !(checks.reverse_tabnabbing || checks.xssi || checks.clickjacking || checks.cross_site_flashing) {
            report.add_warning("checks", "All checks are disabled, nothing will be analyzed");
        }

        if checks.xssi && !config.probe.enabled {
            report.add_info(
                "probe.enabled",
                "XSSI is enabled without the dynamic content probe and will never report",
            );
        }

        if config.http.accept_invalid_certs {
            report.add_warning(
                "http.accept_invalid_certs",
                "TLS certificate validation is disabled for probe requests",
            );
        }

        if config.probe.timeout_secs.saturating_mul(1000) < config.probe.temporal_delay_ms {
            report.add_warning(
                "probe.timeout_secs",
                "Probe timeout is shorter than the temporal delay; time-based probing will always time out",
            );
        }

        report
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: HashMap<String, Vec<String>>,
    pub warnings: HashMap<String, Vec<String>>,
    pub info: HashMap<String, Vec<String>>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn add_info(&mut self, field: &str, message: &str) {
        self.info
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Emit every entry through tracing at the matching level
    pub fn log(&self) {
        for (field, messages) in &self.errors {
            for message in messages {
                tracing::error!("[Config] {}: {}", field, message);
            }
        }
        for (field, messages) in &self.warnings {
            for message in messages {
                tracing::warn!("[Config] {}: {}", field, message);
            }
        }
        for (field, messages) in &self.info {
            for message in messages {
                tracing::info!("[Config] {}: {}", field, message);
            }
        }
    }
}
