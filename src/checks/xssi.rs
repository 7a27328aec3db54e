// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - XSSI Check
 * Cross-site script inclusion on script and JSON responses
 *
 * Pipeline:
 * 1. Responses starting with an anti-XSSI guard are safe
 * 2. Scan the body for credentials and personal data
 * 3. Inspect X-Content-Type-Options and Access-Control-Allow-Origin
 * 4. Probe whether the content depends on the session or on time
 *
 * Only dynamic content is reported, and only when at least one of the
 * exposure signals from steps 2-3 holds.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::dynamic_probe::DynamicContentProbe;
use super::{PassiveCheck, RuleConfig};
use crate::errors::ScannerResult;
use crate::exchange::HttpExchange;
use crate::types::{CheckType, Confidence, Finding, Severity};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

const UTF8_BOM: char = '\u{feff}';

static GUARD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^throw\s+'[^']*'\s*;?",
        r"^\)\]\}'",
        r"^while\s*\(\s*1\s*\)\s*;",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid guard regex"))
    .collect()
});

/// First match of each is reported
static SENSITIVE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("API key", r#"api_key=["']?([a-zA-Z0-9_-]{10,})["']?"#),
        ("Session", r#"session=["']?([a-zA-Z0-9_-]{10,})["']?"#),
        ("Email", r#"email=["']?([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})["']?"#),
        ("Token", r#"token=["']?([a-zA-Z0-9_-]{10,})["']?"#),
        ("Password", r#"password=["']?([a-zA-Z0-9_-]{8,})["']?"#),
        ("Bearer token", r"Bearer\s+([A-Za-z0-9._~+/-]{10,}=*)"),
    ]
    .iter()
    .map(|(label, p)| (*label, Regex::new(p).expect("valid sensitive-data regex")))
    .collect()
});

/// Every match is reported
static JSON_SECRET_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(api_key|token|password)":\s*"([^"]+)""#).expect("valid json field regex")
});

/// Header-level exposure signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSignals {
    pub nosniff: bool,
    pub wildcard_cors: bool,
}

pub struct XssiCheck {
    rule: RuleConfig,
    probe: Option<Arc<DynamicContentProbe>>,
}

impl XssiCheck {
    /// Without a probe every response is treated as static and never reported
    pub fn new(probe: Option<Arc<DynamicContentProbe>>) -> Self {
        Self {
            rule: RuleConfig {
                check_type: CheckType::Xssi,
                rule_name: "XSSI Vulnerability",
                severity: Severity::Medium,
                confidence: Confidence::Certain,
                remediation: "1. Add X-Content-Type-Options: nosniff header.\n\
                              2. Avoid exposing sensitive data in scripts or JSON.\n\
                              3. Restrict CORS headers to specific origins.",
                background: Some(
                    "A script or JSON response whose content depends on the visitor's \
                     session can be included cross-origin with a <script> tag, leaking \
                     the data it contains to the including page.",
                ),
            },
            probe,
        }
    }

    pub fn is_protected(body: &str) -> bool {
        let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
        GUARD_PATTERNS.iter().any(|re| re.is_match(body))
    }

    /// Human-readable matches, in pattern order
    pub fn find_sensitive_data(body: &str) -> Vec<String> {
        let mut found: Vec<String> = SENSITIVE_PATTERNS
            .iter()
            .filter_map(|(label, re)| re.find(body).map(|m| format!("{}: {}", label, m.as_str())))
            .collect();

        found.extend(
            JSON_SECRET_FIELD
                .captures_iter(body)
                .map(|caps| format!("JSON field {}: {}", &caps[1], &caps[2])),
        );
        found
    }

    pub fn header_signals(exchange: &HttpExchange) -> HeaderSignals {
        HeaderSignals {
            nosniff: exchange
                .response_header("x-content-type-options")
                .map(|v| v.eq_ignore_ascii_case("nosniff"))
                .unwrap_or(false),
            wildcard_cors: exchange.response_header("access-control-allow-origin") == Some("*"),
        }
    }

    fn describe(sensitive: &[String], signals: HeaderSignals) -> String {
        let mut detail = String::new();
        if !sensitive.is_empty() {
            detail.push_str(&format!("Sensitive data found: {}.", sensitive.join(", ")));
        }
        if !signals.nosniff {
            detail.push_str(" Missing X-Content-Type-Options: nosniff.");
        }
        if signals.wildcard_cors {
            detail.push_str(" Wildcard CORS header detected: Access-Control-Allow-Origin: *.");
        }
        detail.push_str(" Dynamic JS files may allow attackers to include scripts and steal data.");
        detail.trim_start().to_string()
    }
}

#[async_trait::async_trait]
impl PassiveCheck for XssiCheck {
    fn rule(&self) -> &RuleConfig {
        &self.rule
    }

    fn is_relevant(&self, exchange: &HttpExchange) -> bool {
        let mime = exchange.declared_mime_type();
        if mime.contains("javascript") || mime.contains("json") {
            return true;
        }
        let path = exchange.url_path_lower();
        path.ends_with(".js") || path.ends_with(".json")
    }

    async fn analyze(&self, exchange: &HttpExchange) -> ScannerResult<Vec<Finding>> {
        let body = exchange.body_text();
        if Self::is_protected(&body) {
            debug!("[XSSI] Anti-XSSI guard present: {}", exchange.url());
            return Ok(Vec::new());
        }

        let sensitive = Self::find_sensitive_data(&body);
        let signals = Self::header_signals(exchange);
        let exposed = !sensitive.is_empty() || !signals.nosniff || signals.wildcard_cors;
        if !exposed {
            return Ok(Vec::new());
        }

        let Some(probe) = &self.probe else {
            debug!("[XSSI] Probe disabled, treating {} as static", exchange.url());
            return Ok(Vec::new());
        };

        let verdict = probe.classify(exchange).await;
        if !verdict.is_dynamic() {
            return Ok(Vec::new());
        }

        info!("[XSSI] Dynamic resource exposed ({:?}): {}", verdict, exchange.url());
        Ok(vec![self.rule.finding(exchange, Self::describe(&sensitive, signals))])
    }
}
