// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod core;
pub mod loader;
pub mod validation;

pub use core::{
    AppConfig, ChecksConfig, FlashConfig, HttpConfig, ObservabilityConfig, ProbeConfig,
    RetestConfig, ScopeConfig, WhitelistEntryConfig,
};

pub use loader::{load_config_with_overrides, load_unvalidated_config, ConfigFormat, ConfigLoader};

pub use validation::{ConfigValidator, ValidationReport};
