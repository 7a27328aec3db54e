// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Passive Pipeline Tests
 * Gating order, counter accounting, retest and shutdown across all checks
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;
use std::time::Duration;
use vulcheck_scanner::config::{AppConfig, WhitelistEntryConfig};
use vulcheck_scanner::errors::{ScannerResult, WhitelistError};
use vulcheck_scanner::exchange::{HttpExchange, HttpRequest, HttpResponse};
use vulcheck_scanner::gating::SkipReason;
use vulcheck_scanner::host::RequestSender;
use vulcheck_scanner::pipeline::{PassiveScanEngine, RetestSummary};
use vulcheck_scanner::reporting::{LogColumn, ReportStore};
use vulcheck_scanner::types::{CheckType, Confidence, ConsolidationAction, ScanOutcome, Severity};
use vulcheck_scanner::CheckResult;

/// Never answers; only cancellation or timeout ends a probe
struct HangingSender;

#[async_trait::async_trait]
impl RequestSender for HangingSender {
    async fn send_request(&self, _request: &HttpRequest) -> ScannerResult<HttpExchange> {
        futures::future::pending().await
    }
}

fn html_page(url: &str, body: &str) -> HttpExchange {
    HttpExchange::new(
        HttpRequest::get(url),
        HttpResponse::new(200, body.as_bytes().to_vec())
            .with_header("Content-Type", "text/html; charset=utf-8"),
    )
}

fn image(url: &str) -> HttpExchange {
    HttpExchange::new(
        HttpRequest::get(url),
        HttpResponse::new(200, vec![0x89, b'P', b'N', b'G']).with_header("Content-Type", "image/png"),
    )
}

fn result_for(results: &[(CheckType, CheckResult)], check: CheckType) -> CheckResult {
    results
        .iter()
        .find(|(c, _)| *c == check)
        .map(|(_, r)| r.clone())
        .unwrap()
}

fn engine_with(store: &Arc<ReportStore>, checks: &[CheckType]) -> PassiveScanEngine {
    PassiveScanEngine::builder(store.clone())
        .enabled(checks.iter().copied())
        .build()
}

#[tokio::test]
async fn test_unprotected_page_reports_clickjacking_and_tabnabbing() {
    let store = Arc::new(ReportStore::new());
    let engine = PassiveScanEngine::builder(store.clone()).enable_all().build();

    let page = html_page(
        "https://www.shop.example.com/",
        r#"<a href="https://evil.com" target="_blank">deal</a>"#,
    );
    let results = engine.process(&page).await;

    let clickjacking = result_for(&results, CheckType::Clickjacking);
    assert_eq!(clickjacking.findings().len(), 1);
    assert_eq!(clickjacking.findings()[0].severity, Severity::Medium);

    let tabnabbing = result_for(&results, CheckType::ReverseTabnabbing);
    assert_eq!(tabnabbing.findings()[0].confidence, Confidence::Certain);

    assert_eq!(
        result_for(&results, CheckType::CrossSiteFlashing),
        CheckResult::Skipped(SkipReason::IrrelevantType)
    );
    assert_eq!(
        result_for(&results, CheckType::Xssi),
        CheckResult::Skipped(SkipReason::IrrelevantType)
    );

    // Two scanned rows; the host column drops "www."
    assert_eq!(store.len(), 2);
    assert_eq!(store.filter(LogColumn::Host, "shop.example.com").len(), 2);
    assert_eq!(store.filter(LogColumn::Result, "Issues").len(), 2);
}

#[tokio::test]
async fn test_protected_page_passes() {
    let store = Arc::new(ReportStore::new());
    let engine = engine_with(&store, &[CheckType::Clickjacking]);

    let page = HttpExchange::new(
        HttpRequest::get("https://a.com/"),
        HttpResponse::new(200, b"<html></html>".to_vec())
            .with_header("Content-Type", "text/html")
            .with_header("X-Frame-Options", "deny"),
    );
    let results = engine.process(&page).await;

    assert_eq!(
        result_for(&results, CheckType::Clickjacking),
        CheckResult::Scanned(ScanOutcome::Pass)
    );
    assert_eq!(store.entries()[0].analysis_text(), "No issues found");
}

#[tokio::test]
async fn test_skip_accounting() {
    let store = Arc::new(ReportStore::new());
    let engine = engine_with(&store, &[CheckType::Clickjacking]);
    let counters = || engine.runner(CheckType::Clickjacking).unwrap().stats();

    // irrelevant type: counted as scanned
    engine.process(&image("https://a.com/logo.png")).await;
    assert_eq!(counters().completed, 1);

    // first sight of the page
    engine.process(&html_page("https://a.com/", "")).await;
    assert_eq!(counters().completed, 2);
    assert_eq!(counters().findings_total, 1);

    // duplicate: not counted
    let results = engine.process(&html_page("https://a.com/", "")).await;
    assert_eq!(
        result_for(&results, CheckType::Clickjacking),
        CheckResult::Skipped(SkipReason::Duplicate)
    );
    assert_eq!(counters().completed, 2);

    // whitelisted: not counted
    engine.whitelist().add("b.com", true).unwrap();
    let results = engine.process(&html_page("https://x.b.com/", "")).await;
    assert_eq!(
        result_for(&results, CheckType::Clickjacking),
        CheckResult::Skipped(SkipReason::Whitelisted)
    );
    assert_eq!(counters().completed, 2);

    // no response: not counted
    let results = engine
        .process(&HttpExchange::without_response(HttpRequest::get("https://c.com/")))
        .await;
    assert_eq!(
        result_for(&results, CheckType::Clickjacking),
        CheckResult::Skipped(SkipReason::NoResponse)
    );

    // disabled checks skip without counting
    assert_eq!(
        result_for(&results, CheckType::Xssi),
        CheckResult::Skipped(SkipReason::Disabled)
    );
    let xssi = engine.runner(CheckType::Xssi).unwrap().stats();
    assert_eq!((xssi.in_flight, xssi.completed), (0, 0));

    let stats = counters();
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.completed, 2);
    assert_eq!(
        store.stats(CheckType::Clickjacking).unwrap().status_line(),
        "0 scanning, 2 scanned"
    );
}

#[tokio::test]
async fn test_whitelist_checked_before_dedup() {
    let store = Arc::new(ReportStore::new());
    let engine = engine_with(&store, &[CheckType::Clickjacking]);

    engine.whitelist().add("a.com", false).unwrap();
    engine.process(&html_page("https://a.com/", "")).await;
    assert!(!engine.runner(CheckType::Clickjacking).unwrap().state().has_seen("https://a.com/"));

    engine.whitelist().remove("a.com").unwrap();
    let results = engine.process(&html_page("https://a.com/", "")).await;
    assert_eq!(result_for(&results, CheckType::Clickjacking).findings().len(), 1);
}

#[tokio::test]
async fn test_concurrent_duplicates_analyzed_once() {
    let store = Arc::new(ReportStore::new());
    let engine = engine_with(&store, &[CheckType::Clickjacking]);
    let page = html_page("https://a.com/race", "");

    let all = futures::future::join_all((0..32).map(|_| engine.process(&page))).await;
    let scanned = all
        .iter()
        .filter(|results| matches!(result_for(results, CheckType::Clickjacking), CheckResult::Scanned(_)))
        .count();

    assert_eq!(scanned, 1);
    let stats = engine.runner(CheckType::Clickjacking).unwrap().stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.in_flight, 0);
}

#[tokio::test]
async fn test_counter_sum_is_monotone() {
    let store = Arc::new(ReportStore::new());
    let engine = PassiveScanEngine::builder(store.clone()).enable_all().build();
    let exchanges = vec![
        html_page("https://a.com/", ""),
        image("https://a.com/logo.png"),
        html_page("https://a.com/", ""),
        html_page("https://b.com/", r#"<a href="/x" target="_blank">x</a>"#),
        HttpExchange::without_response(HttpRequest::get("https://c.com/")),
    ];

    let mut previous = vec![0u64; CheckType::ALL.len()];
    for exchange in &exchanges {
        engine.process(exchange).await;
        for (i, stats) in engine.stats().iter().enumerate() {
            let sum = stats.completed + stats.in_flight;
            assert!(sum >= previous[i]);
            previous[i] = sum;
        }
    }
}

#[tokio::test]
async fn test_retest_with_host_filter() {
    let store = Arc::new(ReportStore::new());
    let engine = engine_with(&store, &[CheckType::Clickjacking]);

    let site_map = vec![
        html_page("https://example.com/", ""),
        html_page("https://api.example.com/", ""),
        html_page("https://notexample.com/", ""),
        html_page("https://other.org/", ""),
        HttpExchange::without_response(HttpRequest::get("https://example.com/pending")),
    ];

    let summary = engine.retest(&site_map, " Example.com ").await;
    assert_eq!(
        summary,
        RetestSummary {
            total: 5,
            processed: 2,
            skipped_no_response: 1,
            skipped_host: 2,
        }
    );
    assert_eq!(store.findings().len(), 2);

    // Only enabled checks run on retest
    assert_eq!(engine.runner(CheckType::Xssi).unwrap().stats().completed, 0);
    assert!(store.stats(CheckType::Xssi).is_none());

    let summary = engine.retest(&site_map, "").await;
    assert_eq!(summary.processed, 4);
    assert_eq!(store.findings().len(), 4);
}

#[tokio::test]
async fn test_toggles_and_whitelist_admin() {
    let store = Arc::new(ReportStore::new());
    let engine = engine_with(&store, &[]);

    assert!(!engine.is_check_enabled(CheckType::Xssi));
    engine.set_all_enabled(true);
    assert!(CheckType::ALL.iter().all(|c| engine.is_check_enabled(*c)));
    engine.set_enabled(CheckType::Xssi, false);
    assert!(!engine.is_check_enabled(CheckType::Xssi));

    assert_eq!(engine.whitelist().add("  ", false), Err(WhitelistError::Empty));
    engine.whitelist().add("Example.com", true).unwrap();
    assert!(matches!(
        engine.whitelist().add("example.com", false),
        Err(WhitelistError::Duplicate(_))
    ));
    assert!(engine.is_domain_whitelisted("cdn.example.com"));
    assert!(!engine.is_domain_whitelisted("badexample.com"));
}

#[tokio::test]
async fn test_from_config_scope_and_whitelist() {
    let mut config = AppConfig::default();
    config.checks.clickjacking = true;
    config.scope.enforce = true;
    config.scope.hosts = vec!["target.com".to_string()];
    config.whitelist = vec![WhitelistEntryConfig {
        domain: "cdn.target.com".to_string(),
        include_subdomains: false,
    }];

    let store = Arc::new(ReportStore::new());
    let engine = PassiveScanEngine::from_config(&config, store.clone(), None);

    let out = engine.process(&html_page("https://elsewhere.com/", "")).await;
    assert_eq!(
        result_for(&out, CheckType::Clickjacking),
        CheckResult::Skipped(SkipReason::OutOfScope)
    );

    let out = engine.process(&html_page("https://cdn.target.com/", "")).await;
    assert_eq!(
        result_for(&out, CheckType::Clickjacking),
        CheckResult::Skipped(SkipReason::Whitelisted)
    );

    let out = engine.process(&html_page("https://app.target.com/", "")).await;
    assert_eq!(result_for(&out, CheckType::Clickjacking).findings().len(), 1);
}

#[tokio::test]
async fn test_shutdown_cancels_running_probe() {
    let store = Arc::new(ReportStore::new());
    let engine = PassiveScanEngine::builder(store.clone())
        .request_sender(Arc::new(HangingSender))
        .probe_timeout(Duration::from_secs(120))
        .enabled([CheckType::Xssi])
        .build();

    let exchange = HttpExchange::new(
        HttpRequest::get("https://a.com/me.json").with_header("Authorization", "Bearer abcdefghijkl"),
        HttpResponse::new(200, br#"{"token": "abcdef"}"#.to_vec())
            .with_header("Content-Type", "application/json"),
    );

    let (results, drained) = tokio::join!(engine.process(&exchange), async {
        while engine.probe_tracker().active() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        engine.shutdown(Duration::from_secs(5)).await
    });

    assert!(drained);
    assert_eq!(
        result_for(&results, CheckType::Xssi),
        CheckResult::Scanned(ScanOutcome::Pass)
    );
    let stats = engine.runner(CheckType::Xssi).unwrap().stats();
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.completed, 1);
}

#[tokio::test]
async fn test_abandoned_analysis_releases_reservation() {
    let store = Arc::new(ReportStore::new());
    let engine = PassiveScanEngine::builder(store.clone())
        .request_sender(Arc::new(HangingSender))
        .enabled([CheckType::Xssi])
        .build();

    let exchange = HttpExchange::new(
        HttpRequest::get("https://a.com/me.json").with_header("Cookie", "sid=1"),
        HttpResponse::new(200, b"{}".to_vec()).with_header("Content-Type", "application/json"),
    );

    let abandoned = tokio::time::timeout(Duration::from_millis(50), engine.process(&exchange)).await;
    assert!(abandoned.is_err());

    let runner = engine.runner(CheckType::Xssi).unwrap();
    assert_eq!(runner.stats().in_flight, 0);
    assert!(!runner.state().has_seen("https://a.com/me.json"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_every_check_keeps_duplicate_findings() {
    let store = Arc::new(ReportStore::new());
    let engine = engine_with(&store, &[CheckType::Clickjacking]);

    engine.process(&html_page("https://a.com/one", "")).await;
    engine.process(&html_page("https://a.com/one?x=1", "")).await;

    let findings = store.findings();
    assert_eq!(findings.len(), 2);
    assert_eq!(store.deduplicated_findings().len(), 1);

    for check in CheckType::ALL {
        let runner = engine.runner(check).unwrap();
        assert_eq!(
            runner.check().consolidate(&findings[0], &findings[1]),
            ConsolidationAction::KeepBoth
        );
    }
}
