// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - VulCheck Library
 * Passive client-side vulnerability checks over observed HTTP traffic
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod capture;
pub mod checks;
pub mod config;
pub mod errors;
pub mod exchange;
pub mod gating;
pub mod host;
pub mod http_client;
pub mod pipeline;
pub mod reporting;
pub mod state;
pub mod types;
pub mod whitelist;

pub use checks::{CheckResult, PassiveCheck};
pub use errors::{ScannerError, ScannerResult};
pub use exchange::{HttpExchange, HttpRequest, HttpResponse};
pub use pipeline::{PassiveScanEngine, RetestSummary};
pub use reporting::{ReportSink, ReportStore};
pub use types::{CheckType, Finding, ScanOutcome};
