// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Clickjacking Check
 * Detects HTML responses that can be framed by any origin
 *
 * A response is protected when it carries X-Frame-Options DENY/SAMEORIGIN
 * or a Content-Security-Policy with a frame-ancestors directive. Invalid
 * X-Frame-Options values and JavaScript framebusters do not count as
 * protection; they are only mentioned in the finding detail.
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

static FRAME_ANCESTORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)frame-ancestors\s*([^;]*)").expect("valid csp regex"));

static FRAMEBUSTER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"if\s*\(\s*top\s*!==?\s*self\s*\)",
        r"if\s*\(\s*top\.location\s*!==?\s*self\.location\s*\)",
        r"if\s*\(\s*parent\s*!==?\s*self\s*\)",
        r"top\.location\s*=\s*self\.location",
        r"parent\.location\s*=\s*self\.location",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).expect("valid framebuster regex"))
    .collect()
});

const BASE_DETAIL: &str = "Missing X-Frame-Options header and no valid Content-Security-Policy \
                           frame-ancestors directive. This makes the page vulnerable to Clickjacking.";

/// Framing protection observed in one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameProtection {
    pub x_frame_options: Option<String>,
    pub frame_ancestors: Option<String>,
    pub has_framebuster: bool,
}

impl FrameProtection {
    pub fn has_valid_x_frame_options(&self) -> bool {
        self.x_frame_options
            .as_deref()
            .map(|xfo| xfo.eq_ignore_ascii_case("DENY") || xfo.eq_ignore_ascii_case("SAMEORIGIN"))
            .unwrap_or(false)
    }

    pub fn is_protected(&self) -> bool {
        self.has_valid_x_frame_options() || self.frame_ancestors.is_some()
    }
}

pub struct ClickjackingCheck {
    rule: RuleConfig,
}

impl ClickjackingCheck {
    pub fn new() -> Self {
        Self {
            rule: RuleConfig {
                check_type: CheckType::Clickjacking,
                rule_name: "Clickjacking Vulnerability",
                severity: Severity::Medium,
                confidence: Confidence::Certain,
                remediation: "1. Add X-Frame-Options: DENY or SAMEORIGIN header.\n\
                              2. Configure Content-Security-Policy with frame-ancestors directive to restrict framing.",
                background: Some(
                    "Clickjacking tricks a user into clicking on content of a framed page \
                     that is hidden beneath an attacker-controlled interface.",
                ),
            },
        }
    }

    pub fn inspect(&self, exchange: &HttpExchange) -> FrameProtection {
        let x_frame_options = exchange
            .response_header("x-frame-options")
            .map(str::to_string);

        let frame_ancestors = exchange
            .response_header("content-security-policy")
            .and_then(Self::extract_frame_ancestors);

        FrameProtection {
            x_frame_options,
            frame_ancestors,
            has_framebuster: Self::check_for_framebuster(&exchange.body_text()),
        }
    }

    /// Value of the frame-ancestors directive, if the policy has one
    fn extract_frame_ancestors(csp: &str) -> Option<String> {
        FRAME_ANCESTORS
            .captures(csp)
            .map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()).unwrap_or_default())
    }

    fn check_for_framebuster(body: &str) -> bool {
        FRAMEBUSTER_PATTERNS.iter().any(|re| re.is_match(body))
    }

    fn describe(protection: &FrameProtection) -> String {
        let mut detail = BASE_DETAIL.to_string();
        if let Some(xfo) = &protection.x_frame_options {
            detail.push_str(&format!(
                " X-Frame-Options is present with an unsupported value: {}.",
                xfo
            ));
        }
        if protection.has_framebuster {
            detail.push_str(
                " A JavaScript framebuster was found; it can be bypassed and is not a substitute for headers.",
            );
        }
        detail
    }
}

impl Default for ClickjackingCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PassiveCheck for ClickjackingCheck {
    fn rule(&self) -> &RuleConfig {
        &self.rule
    }

    fn is_relevant(&self, exchange: &HttpExchange) -> bool {
        exchange.declared_mime_type().contains("html")
    }

    async fn analyze(&self, exchange: &HttpExchange) -> ScannerResult<Vec<Finding>> {
        let protection = self.inspect(exchange);
        if protection.is_protected() {
            return Ok(Vec::new());
        }

        debug!("[Clickjacking] No framing protection: {}", exchange.url());
        Ok(vec![self.rule.finding(exchange, Self::describe(&protection))])
    }
}
