// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::types::CheckType;
use crate::whitelist::WhitelistEntry;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    pub checks: ChecksConfig,

    #[serde(default)]
    pub whitelist: Vec<WhitelistEntryConfig>,

    #[serde(default)]
    #[validate(nested)]
    pub scope: ScopeConfig,

    #[serde(default)]
    #[validate(nested)]
    pub probe: ProbeConfig,

    #[serde(default)]
    #[validate(nested)]
    pub http: HttpConfig,

    #[serde(default)]
    #[validate(nested)]
    pub flash: FlashConfig,

    #[serde(default)]
    #[validate(nested)]
    pub retest: RetestConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Per-check enable flags. Every check starts disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksConfig {
    #[serde(default)]
    pub reverse_tabnabbing: bool,

    #[serde(default)]
    pub xssi: bool,

    #[serde(default)]
    pub clickjacking: bool,

    #[serde(default)]
    pub cross_site_flashing: bool,
}

impl ChecksConfig {
    pub fn all_enabled() -> Self {
        Self {
            reverse_tabnabbing: true,
            xssi: true,
            clickjacking: true,
            cross_site_flashing: true,
        }
    }

    pub fn is_enabled(&self, check: CheckType) -> bool {
        match check {
            CheckType::ReverseTabnabbing => self.reverse_tabnabbing,
            CheckType::Xssi => self.xssi,
            CheckType::Clickjacking => self.clickjacking,
            CheckType::CrossSiteFlashing => self.cross_site_flashing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntryConfig {
    pub domain: String,

    #[serde(default)]
    pub include_subdomains: bool,
}

impl From<&WhitelistEntryConfig> for WhitelistEntry {
    fn from(config: &WhitelistEntryConfig) -> Self {
        WhitelistEntry::new(&config.domain, config.include_subdomains)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ScopeConfig {
    #[serde(default)]
    pub enforce: bool,

    #[serde(default)]
    pub hosts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProbeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,

    #[validate(range(min = 1000))]
    #[serde(default = "default_temporal_delay")]
    pub temporal_delay_ms: u64,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn temporal_delay(&self) -> Duration {
        Duration::from_millis(self.temporal_delay_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_probe_timeout(),
            temporal_delay_ms: default_temporal_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HttpConfig {
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    #[validate(range(max = 10))]
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[validate(range(min = 1024))]
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            max_retries: 0,
            accept_invalid_certs: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FlashConfig {
    #[validate(range(min = 1))]
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetestConfig {
    /// Exchanges analyzed at the same time during a bulk retest
    #[validate(range(min = 1, max = 256))]
    #[serde(default = "default_retest_concurrency")]
    pub concurrency: usize,
}

impl Default for RetestConfig {
    fn default() -> Self {
        Self {
            concurrency: default_retest_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_temporal_delay() -> u64 {
    1000
}

fn default_http_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_retest_concurrency() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}
