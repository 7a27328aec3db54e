// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Passive Scan Engine
 * Fans every observed exchange out to the four checks and drives bulk
 * retests over the host's site map
 *
 * Checks run concurrently and independently: one check's probe never
 * delays another check's gating or counters.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::checks::{
    CheckResult, CheckRunner, ClickjackingCheck, CrossSiteFlashingCheck, DynamicContentProbe,
    PassiveCheck, ProbeTracker, ReverseTabnabbingCheck, XssiCheck,
};
use crate::config::AppConfig;
use crate::exchange::{extract_domain, HttpExchange};
use crate::gating::GatingPolicy;
use crate::host::{HostScope, RequestSender, ScopeOracle, SiteMap};
use crate::reporting::ReportSink;
use crate::state::CheckStats;
use crate::types::CheckType;
use crate::whitelist::{WhitelistEntry, WhitelistStore};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_RETEST_CONCURRENCY: usize = 8;

/// Counts from one bulk retest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetestSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped_no_response: usize,
    pub skipped_host: usize,
}

pub struct PassiveScanEngine {
    runners: Vec<CheckRunner>,
    whitelist: Arc<WhitelistStore>,
    probe_tracker: ProbeTracker,
    retest_concurrency: usize,
}

impl PassiveScanEngine {
    pub fn builder(sink: Arc<dyn ReportSink>) -> PassiveScanEngineBuilder {
        PassiveScanEngineBuilder::new(sink)
    }

    /// Engine configured from `config`; `sender` backs the XSSI probe
    pub fn from_config(
        config: &AppConfig,
        sink: Arc<dyn ReportSink>,
        sender: Option<Arc<dyn RequestSender>>,
    ) -> Self {
        let whitelist = WhitelistStore::from_entries(config.whitelist.iter().map(WhitelistEntry::from));

        let mut builder = Self::builder(sink)
            .whitelist(Arc::new(whitelist))
            .enabled(CheckType::ALL.iter().copied().filter(|c| config.checks.is_enabled(*c)))
            .probe_timeout(config.probe.timeout())
            .temporal_delay(config.probe.temporal_delay())
            .flash_max_body_bytes(config.flash.max_body_bytes)
            .retest_concurrency(config.retest.concurrency);

        if config.scope.enforce {
            builder = builder.scope(Arc::new(HostScope::new(&config.scope.hosts)));
        }
        if config.probe.enabled {
            if let Some(sender) = sender {
                builder = builder.request_sender(sender);
            }
        }

        builder.build()
    }

    pub fn runner(&self, check: CheckType) -> Option<&CheckRunner> {
        self.runners.iter().find(|r| r.check_type() == check)
    }

    pub fn is_check_enabled(&self, check: CheckType) -> bool {
        self.runner(check).map(|r| r.is_enabled()).unwrap_or(false)
    }

    pub fn set_enabled(&self, check: CheckType, enabled: bool) {
        if let Some(runner) = self.runner(check) {
            info!("[Engine] {} {}", check, if enabled { "enabled" } else { "disabled" });
            runner.set_enabled(enabled);
        }
    }

    /// Select-all toggle
    pub fn set_all_enabled(&self, enabled: bool) {
        for runner in &self.runners {
            runner.set_enabled(enabled);
        }
        info!("[Engine] All checks {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn whitelist(&self) -> &Arc<WhitelistStore> {
        &self.whitelist
    }

    pub fn is_domain_whitelisted(&self, domain: &str) -> bool {
        self.whitelist.is_whitelisted(domain)
    }

    pub fn stats(&self) -> Vec<CheckStats> {
        self.runners.iter().map(|r| r.stats()).collect()
    }

    pub fn probe_tracker(&self) -> &ProbeTracker {
        &self.probe_tracker
    }

    /// Deliver one observed exchange to every check, enabled or not
    pub async fn process(&self, exchange: &HttpExchange) -> Vec<(CheckType, CheckResult)> {
        self.run_checks(exchange, &self.runners.iter().collect::<Vec<_>>()).await
    }

    async fn run_checks(
        &self,
        exchange: &HttpExchange,
        runners: &[&CheckRunner],
    ) -> Vec<(CheckType, CheckResult)> {
        futures::future::join_all(runners.iter().map(|runner| async move {
            (runner.check_type(), runner.run(exchange).await)
        }))
        .await
    }

    /// Re-run the enabled checks over everything in `site_map`.
    /// A non-empty `host_filter` keeps exchanges whose domain equals it or
    /// is a subdomain of it.
    pub async fn retest(&self, site_map: &dyn SiteMap, host_filter: &str) -> RetestSummary {
        let host_filter = host_filter.trim().to_lowercase();
        let enabled: Vec<&CheckRunner> = self.runners.iter().filter(|r| r.is_enabled()).collect();
        let exchanges = site_map.all_known_exchanges();

        let mut summary = RetestSummary {
            total: exchanges.len(),
            ..RetestSummary::default()
        };

        let mut selected = Vec::with_capacity(exchanges.len());
        for exchange in exchanges {
            if !exchange.has_response() {
                summary.skipped_no_response += 1;
                continue;
            }
            if !host_filter.is_empty() && !Self::host_matches(&exchange, &host_filter) {
                summary.skipped_host += 1;
                continue;
            }
            selected.push(exchange);
        }

        info!(
            "[Engine] Retesting {} of {} exchanges with {} check(s)",
            selected.len(),
            summary.total,
            enabled.len()
        );

        let processed = AtomicUsize::new(0);
        stream::iter(selected)
            .for_each_concurrent(self.retest_concurrency, |exchange| {
                let enabled = &enabled;
                let processed = &processed;
                async move {
                    self.run_checks(&exchange, enabled).await;
                    processed.fetch_add(1, Ordering::Relaxed);
                }
            })
            .await;

        summary.processed = processed.into_inner();
        debug!("[Engine] Retest finished: {:?}", summary);
        summary
    }

    fn host_matches(exchange: &HttpExchange, filter: &str) -> bool {
        let domain = extract_domain(exchange.url());
        domain == filter || domain.ends_with(&format!(".{}", filter))
    }

    /// Cancel running probes and wait up to `grace` for them to unwind
    pub async fn shutdown(&self, grace: Duration) -> bool {
        info!("[Engine] Shutting down, {} probe(s) active", self.probe_tracker.active());
        self.probe_tracker.cancel_all();
        let drained = self.probe_tracker.drain(grace).await;
        if !drained {
            warn!("[Engine] Probes did not drain within {:?}", grace);
        }
        drained
    }
}

pub struct PassiveScanEngineBuilder {
    sink: Arc<dyn ReportSink>,
    whitelist: Arc<WhitelistStore>,
    scope: Option<Arc<dyn ScopeOracle>>,
    sender: Option<Arc<dyn RequestSender>>,
    enabled: Vec<CheckType>,
    probe_timeout: Option<Duration>,
    temporal_delay: Option<Duration>,
    flash_max_body_bytes: Option<usize>,
    retest_concurrency: usize,
}

impl PassiveScanEngineBuilder {
    fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self {
            sink,
            whitelist: Arc::new(WhitelistStore::new()),
            scope: None,
            sender: None,
            enabled: Vec::new(),
            probe_timeout: None,
            temporal_delay: None,
            flash_max_body_bytes: None,
            retest_concurrency: DEFAULT_RETEST_CONCURRENCY,
        }
    }

    pub fn whitelist(mut self, whitelist: Arc<WhitelistStore>) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn scope(mut self, scope: Arc<dyn ScopeOracle>) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Without a sender the XSSI probe is off and XSSI never reports
    pub fn request_sender(mut self, sender: Arc<dyn RequestSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn enabled(mut self, checks: impl IntoIterator<Item = CheckType>) -> Self {
        self.enabled = checks.into_iter().collect();
        self
    }

    pub fn enable_all(self) -> Self {
        self.enabled(CheckType::ALL)
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    pub fn temporal_delay(mut self, delay: Duration) -> Self {
        self.temporal_delay = Some(delay);
        self
    }

    pub fn flash_max_body_bytes(mut self, max: usize) -> Self {
        self.flash_max_body_bytes = Some(max);
        self
    }

    pub fn retest_concurrency(mut self, concurrency: usize) -> Self {
        self.retest_concurrency = concurrency.max(1);
        self
    }

    pub fn build(self) -> PassiveScanEngine {
        let tracker = ProbeTracker::new();

        let probe = self.sender.map(|sender| {
            let mut probe = DynamicContentProbe::new(sender, tracker.clone());
            if let Some(timeout) = self.probe_timeout {
                probe = probe.with_timeout(timeout);
            }
            if let Some(delay) = self.temporal_delay {
                probe = probe.with_temporal_delay(delay);
            }
            Arc::new(probe)
        });

        let flash = match self.flash_max_body_bytes {
            Some(max) => CrossSiteFlashingCheck::with_max_body_bytes(max),
            None => CrossSiteFlashingCheck::new(),
        };

        let checks: Vec<Arc<dyn PassiveCheck>> = vec![
            Arc::new(ReverseTabnabbingCheck::new()),
            Arc::new(XssiCheck::new(probe)),
            Arc::new(ClickjackingCheck::new()),
            Arc::new(flash),
        ];

        let mut gating = GatingPolicy::new(self.whitelist.clone());
        if let Some(scope) = self.scope {
            gating = gating.with_scope(scope);
        }

        let runners = checks
            .into_iter()
            .map(|check| {
                let enabled = self.enabled.contains(&check.check_type());
                CheckRunner::new(check, enabled, gating.clone(), self.sink.clone())
            })
            .collect();

        PassiveScanEngine {
            runners,
            whitelist: self.whitelist,
            probe_tracker: tracker,
            retest_concurrency: self.retest_concurrency,
        }
    }
}
