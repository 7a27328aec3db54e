// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Reverse Tabnabbing Check
 * Flags links that open a new browsing context without severing
 * window.opener
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::{PassiveCheck, RuleConfig};
use crate::errors::ScannerResult;
use crate::exchange::HttpExchange;
use crate::types::{CheckType, Confidence, Finding, Severity};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static ANCHOR_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<a\s[^>]*>"#).expect("valid anchor regex"));

// "blank" without the underscore is a common typo that browsers also
// treat as a new named context
static TARGET_BLANK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\btarget\s*=\s*(?:"_?blank"|'_?blank'|_blank\b)"#)
        .expect("valid target regex")
});

static REL_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\brel\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid rel regex")
});

pub struct ReverseTabnabbingCheck {
    rule: RuleConfig,
}

impl ReverseTabnabbingCheck {
    pub fn new() -> Self {
        Self {
            rule: RuleConfig {
                check_type: CheckType::ReverseTabnabbing,
                rule_name: "Reverse Tabnabbing Vulnerability",
                severity: Severity::Low,
                confidence: Confidence::Certain,
                remediation: "Add rel=\"noopener noreferrer\" to all target=\"_blank\" links.",
                background: Some(
                    "A page opened with target=\"_blank\" gets a reference to the opening \
                     window through window.opener and can navigate it to a phishing page.",
                ),
            },
        }
    }

    /// First anchor tag that opens a new context without noopener/noreferrer
    pub fn find_unsafe_link<'a>(&self, body: &'a str) -> Option<&'a str> {
        ANCHOR_TAG
            .find_iter(body)
            .map(|m| m.as_str())
            .find(|tag| TARGET_BLANK.is_match(tag) && !Self::has_opener_protection(tag))
    }

    fn has_opener_protection(tag: &str) -> bool {
        REL_ATTR.captures_iter(tag).any(|caps| {
            let value = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or("");
            value.split_whitespace().any(|token| {
                token.eq_ignore_ascii_case("noopener") || token.eq_ignore_ascii_case("noreferrer")
            })
        })
    }
}

impl Default for ReverseTabnabbingCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PassiveCheck for ReverseTabnabbingCheck {
    fn rule(&self) -> &RuleConfig {
        &self.rule
    }

    fn is_relevant(&self, exchange: &HttpExchange) -> bool {
        let mime = exchange.declared_mime_type();
        mime.is_empty() || mime.contains("html") || mime.contains("text")
    }

    async fn analyze(&self, exchange: &HttpExchange) -> ScannerResult<Vec<Finding>> {
        let body = exchange.body_text();
        let Some(tag) = self.find_unsafe_link(&body) else {
            return Ok(Vec::new());
        };

        debug!("[Tabnabbing] Unsafe link on {}: {}", exchange.url(), tag);
        let detail = format!(
            "Found link with target=\"_blank\" without rel=\"noopener\" or \"noreferrer\". Evidence: {}",
            tag
        );
        Ok(vec![self.rule.finding(exchange, detail)])
    }
}
