// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Passive Checks
 * Common check contract and the runner that wraps every check in
 * gating, counter bookkeeping and reporting
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod clickjacking;
pub mod cross_site_flashing;
pub mod dynamic_probe;
pub mod reverse_tabnabbing;
pub mod xssi;

pub use clickjacking::ClickjackingCheck;
pub use cross_site_flashing::CrossSiteFlashingCheck;
pub use dynamic_probe::{DynamicContentProbe, ProbeTracker, ProbeVerdict};
pub use reverse_tabnabbing::ReverseTabnabbingCheck;
pub use xssi::XssiCheck;

use crate::errors::ScannerResult;
use crate::exchange::HttpExchange;
use crate::gating::{GateDecision, GatingPolicy, SkipReason};
use crate::reporting::{LogEntry, ReportSink, StatsUpdate};
use crate::state::{CheckState, CheckStats};
use crate::types::{new_id, CheckType, Confidence, ConsolidationAction, Finding, ScanOutcome, Severity};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Static description of the issue a check raises
#[derive(Debug, Clone)]
pub struct RuleConfig {
    pub check_type: CheckType,
    pub rule_name: &'static str,
    pub severity: Severity,
    pub confidence: Confidence,
    pub remediation: &'static str,
    pub background: Option<&'static str>,
}

impl RuleConfig {
    /// Build a finding for `exchange` with this rule's fixed metadata
    pub fn finding(&self, exchange: &HttpExchange, detail: impl Into<String>) -> Finding {
        Finding {
            id: new_id("finding"),
            rule_name: self.rule_name.to_string(),
            check_type: self.check_type,
            url: exchange.url().to_string(),
            severity: self.severity,
            confidence: self.confidence,
            detail: detail.into(),
            remediation: self.remediation.to_string(),
            background: self.background.map(str::to_string),
            evidence_ref: exchange.evidence_ref(),
            discovered_at: Utc::now().to_rfc3339(),
        }
    }
}

/// A single passive vulnerability check
#[async_trait::async_trait]
pub trait PassiveCheck: Send + Sync {
    fn rule(&self) -> &RuleConfig;

    fn check_type(&self) -> CheckType {
        self.rule().check_type
    }

    /// Whether the response type is something this check inspects
    fn is_relevant(&self, exchange: &HttpExchange) -> bool;

    /// Inspect an exchange that passed gating. Errors are logged by the
    /// runner and reported as a clean pass.
    async fn analyze(&self, exchange: &HttpExchange) -> ScannerResult<Vec<Finding>>;

    /// Duplicates are always retained
    fn consolidate(&self, _existing: &Finding, _new: &Finding) -> ConsolidationAction {
        ConsolidationAction::KeepBoth
    }
}

/// What happened to one exchange in one check
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    Skipped(SkipReason),
    Scanned(ScanOutcome),
}

impl CheckResult {
    pub fn outcome(&self) -> Option<&ScanOutcome> {
        match self {
            CheckResult::Scanned(outcome) => Some(outcome),
            CheckResult::Skipped(_) => None,
        }
    }

    pub fn findings(&self) -> &[Finding] {
        self.outcome().map(|o| o.findings()).unwrap_or(&[])
    }
}

/// Runs one check: gate, analyze, settle counters, report
pub struct CheckRunner {
    check: Arc<dyn PassiveCheck>,
    state: Arc<CheckState>,
    gating: GatingPolicy,
    sink: Arc<dyn ReportSink>,
}

impl CheckRunner {
    pub fn new(
        check: Arc<dyn PassiveCheck>,
        enabled: bool,
        gating: GatingPolicy,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        let state = CheckState::new(check.check_type(), enabled);
        Self {
            check,
            state,
            gating,
            sink,
        }
    }

    pub fn check_type(&self) -> CheckType {
        self.check.check_type()
    }

    pub fn check(&self) -> &Arc<dyn PassiveCheck> {
        &self.check
    }

    pub fn state(&self) -> &Arc<CheckState> {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.set_enabled(enabled);
    }

    pub fn stats(&self) -> CheckStats {
        self.state.stats()
    }

    pub async fn run(&self, exchange: &HttpExchange) -> CheckResult {
        let check_type = self.check_type();
        let mut guard = self.state.begin();

        let decision = self
            .gating
            .should_analyze(exchange, &mut guard, |e| self.check.is_relevant(e));

        if let GateDecision::Skip(reason) = decision {
            let stats = guard.skip(reason);
            self.push_stats(&stats);
            return CheckResult::Skipped(reason);
        }

        let findings = match self.check.analyze(exchange).await {
            Ok(findings) => findings,
            Err(e) => {
                warn!("[{}] Analysis failed, reporting pass: {}", check_type, e);
                Vec::new()
            }
        };

        info!(
            "[{}] {} finding(s) for {}",
            check_type,
            findings.len(),
            exchange.url()
        );

        let outcome = ScanOutcome::from_findings(findings);
        let stats = guard.complete(outcome.findings().len());

        self.sink.log_finding(LogEntry {
            id: new_id("log"),
            host: exchange.host(),
            url: exchange.url().to_string(),
            check_type,
            outcome: outcome.clone(),
            timestamp: Utc::now(),
            exchange_ref: exchange.evidence_ref(),
        });
        self.push_stats(&stats);

        CheckResult::Scanned(outcome)
    }

    fn push_stats(&self, stats: &CheckStats) {
        self.sink.update_stats(StatsUpdate {
            check_type: stats.check_type,
            in_flight: stats.in_flight,
            completed: stats.completed,
            findings_count: stats.findings_total,
            timestamp: stats.last_updated_at.unwrap_or_else(Utc::now),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScannerError;
    use crate::exchange::{HttpRequest, HttpResponse};
    use crate::reporting::ReportStore;
    use crate::whitelist::WhitelistStore;

    struct FailingCheck {
        rule: RuleConfig,
    }

    #[async_trait::async_trait]
    impl PassiveCheck for FailingCheck {
        fn rule(&self) -> &RuleConfig {
            &self.rule
        }

        fn is_relevant(&self, _exchange: &HttpExchange) -> bool {
            true
        }

        async fn analyze(&self, exchange: &HttpExchange) -> ScannerResult<Vec<Finding>> {
            Err(ScannerError::Analysis {
                url: exchange.url().to_string(),
                reason: "boom".to_string(),
            })
        }
    }

    fn failing_runner(store: Arc<ReportStore>) -> CheckRunner {
        let check = FailingCheck {
            rule: RuleConfig {
                check_type: CheckType::CrossSiteFlashing,
                rule_name: "Failing",
                severity: Severity::Medium,
                confidence: Confidence::Tentative,
                remediation: "none",
                background: None,
            },
        };
        CheckRunner::new(
            Arc::new(check),
            true,
            GatingPolicy::new(Arc::new(WhitelistStore::new())),
            store,
        )
    }

    #[tokio::test]
    async fn test_analysis_error_fails_open() {
        let store = Arc::new(ReportStore::new());
        let runner = failing_runner(store.clone());
        let exchange = HttpExchange::new(
            HttpRequest::get("https://a.com/movie.swf"),
            HttpResponse::new(200, b"FWS".to_vec()),
        );

        let result = runner.run(&exchange).await;
        assert_eq!(result, CheckResult::Scanned(ScanOutcome::Pass));
        assert_eq!(runner.stats().completed, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_skip_pushes_stats_without_log_entry() {
        let store = Arc::new(ReportStore::new());
        let runner = failing_runner(store.clone());
        runner.set_enabled(false);
        let exchange = HttpExchange::new(
            HttpRequest::get("https://a.com/movie.swf"),
            HttpResponse::new(200, Vec::new()),
        );

        assert_eq!(
            runner.run(&exchange).await,
            CheckResult::Skipped(SkipReason::Disabled)
        );
        assert!(store.is_empty());
        let row = store.stats(CheckType::CrossSiteFlashing).unwrap();
        assert_eq!(row.status_line(), "0 scanning, 0 scanned");
    }
}
