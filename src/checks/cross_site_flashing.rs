// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Cross Site Flashing Check
 * Pattern scan of SWF movies for dangerous ActionScript constructs
 *
 * Bodies are read one byte per char so arbitrary binary never fails to
 * decode. zlib-compressed movies (CWS signature) are inflated first.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::{PassiveCheck, RuleConfig};
use crate::errors::{ScannerError, ScannerResult};
use crate::exchange::{latin1, HttpExchange, HttpResponse};
use crate::types::{CheckType, Confidence, Finding, Severity};
use flate2::read::ZlibDecoder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use tracing::{debug, info};

pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const SWF_HEADER_LEN: usize = 8;

static DANGEROUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\beval\s*\(",
        r"\bloadMovie\s*\(",
        r"\bgetURL\s*\(",
        r"\bExternalInterface\.call\s*\(",
        r#"\bSecurity\.allowDomain\s*\(\s*"\*"\s*\)"#,
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).expect("valid actionscript regex"))
    .collect()
});

pub struct CrossSiteFlashingCheck {
    rule: RuleConfig,
    max_body_bytes: usize,
}

impl CrossSiteFlashingCheck {
    pub fn new() -> Self {
        Self::with_max_body_bytes(DEFAULT_MAX_BODY_BYTES)
    }

    pub fn with_max_body_bytes(max_body_bytes: usize) -> Self {
        Self {
            rule: RuleConfig {
                check_type: CheckType::CrossSiteFlashing,
                rule_name: "Cross Site Flashing: Dangerous ActionScript Pattern",
                severity: Severity::Medium,
                confidence: Confidence::Tentative,
                remediation: "",
                background: Some(
                    "Cross Site Flashing occurs when a Flash movie passes untrusted input to \
                     functions that load content or execute script, or allows any domain to \
                     script it.",
                ),
            },
            max_body_bytes,
        }
    }

    /// Movie content as text, inflating CWS bodies
    fn decode(&self, exchange: &HttpExchange) -> ScannerResult<String> {
        let url = exchange.url();
        let body = exchange.body_bytes();
        if body.len() > SWF_HEADER_LEN && body.starts_with(b"CWS") {
            let mut inflated = Vec::new();
            ZlibDecoder::new(&body[SWF_HEADER_LEN..])
                .take(self.max_body_bytes as u64)
                .read_to_end(&mut inflated)
                .map_err(|e| ScannerError::Analysis {
                    url: url.to_string(),
                    reason: format!("failed to inflate CWS movie: {}", e),
                })?;
            debug!("[CrossSiteFlashing] Inflated {} -> {} bytes", body.len(), inflated.len());
            return Ok(latin1(&inflated));
        }
        Ok(exchange
            .response
            .as_ref()
            .map(HttpResponse::body_latin1)
            .unwrap_or_default())
    }

    /// Every match of every pattern, in pattern order
    pub fn find_dangerous_constructs(text: &str) -> Vec<String> {
        DANGEROUS_PATTERNS
            .iter()
            .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_string()))
            .collect()
    }

    fn finding_for(&self, exchange: &HttpExchange, construct: &str) -> Finding {
        let mut finding = self.rule.finding(
            exchange,
            format!(
                "Detected potentially dangerous ActionScript pattern: {} in SWF file.",
                construct
            ),
        );
        finding.remediation = format!(
            "1. Remove or sanitize calls to {}.\n\
             2. Ensure SWF files do not allow unsafe cross-domain access.\n\
             3. Validate and restrict external resource loading.",
            construct
        );
        finding
    }
}

impl Default for CrossSiteFlashingCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PassiveCheck for CrossSiteFlashingCheck {
    fn rule(&self) -> &RuleConfig {
        &self.rule
    }

    fn is_relevant(&self, exchange: &HttpExchange) -> bool {
        exchange.declared_mime_type().contains("shockwave-flash")
            || exchange.url_path_lower().ends_with(".swf")
    }

    async fn analyze(&self, exchange: &HttpExchange) -> ScannerResult<Vec<Finding>> {
        let body = exchange.body_bytes();
        if body.len() > self.max_body_bytes {
            debug!(
                "[CrossSiteFlashing] Skipping {} byte body (limit {}): {}",
                body.len(),
                self.max_body_bytes,
                exchange.url()
            );
            return Ok(Vec::new());
        }

        let text = self.decode(exchange)?;
        let constructs = Self::find_dangerous_constructs(&text);
        if !constructs.is_empty() {
            info!(
                "[CrossSiteFlashing] {} dangerous construct(s) in {}",
                constructs.len(),
                exchange.url()
            );
        }

        Ok(constructs
            .iter()
            .map(|construct| self.finding_for(exchange, construct))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{HttpRequest, HttpResponse};
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn movie(body: Vec<u8>) -> HttpExchange {
        HttpExchange::new(
            HttpRequest::get("https://cdn.example.com/player.swf"),
            HttpResponse::new(200, body).with_header("Content-Type", "application/x-shockwave-flash"),
        )
    }

    #[tokio::test]
    async fn test_every_match_is_a_finding() {
        let check = CrossSiteFlashingCheck::new();
        let mut body = b"FWS\x0a\x00\x00\x00\x00".to_vec();
        body.extend_from_slice(b"\xff\xfe getURL(a) ... getURL (b) ... Security.allowDomain(\"*\") \x00 EVAL(x)");

        let findings = check.analyze(&movie(body)).await.unwrap();
        assert_eq!(findings.len(), 4);
        assert!(findings.iter().all(|f| f.confidence == Confidence::Tentative));
        assert!(findings.iter().all(|f| f.severity == Severity::Medium));
        assert!(findings[0].detail.contains("EVAL("));
        assert!(findings[1].remediation.contains("getURL("));
    }

    #[tokio::test]
    async fn test_clean_movie_passes() {
        let check = CrossSiteFlashingCheck::new();
        let body = b"FWS\x0a\x00\x00\x00\x00 Security.allowDomain(\"trusted.com\") retrieval(x)".to_vec();
        assert!(check.analyze(&movie(body)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_body_not_analyzed() {
        let check = CrossSiteFlashingCheck::with_max_body_bytes(16);
        let body = b"FWS eval(x) eval(y) eval(z)".to_vec();
        assert!(check.analyze(&movie(body)).await.unwrap().is_empty());
    }

    fn padded_movie(len: usize) -> HttpExchange {
        let mut body = b"FWS\x0a\x00\x00\x00\x00ExternalInterface.call(".to_vec();
        body.resize(len, b' ');
        movie(body)
    }

    #[tokio::test]
    async fn test_body_above_default_limit_passes() {
        let check = CrossSiteFlashingCheck::new();
        let exchange = padded_movie(DEFAULT_MAX_BODY_BYTES + 1);
        assert!(check.analyze(&exchange).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_body_at_default_limit_is_analyzed() {
        let check = CrossSiteFlashingCheck::new();
        let exchange = padded_movie(10 * 1024 * 1024);
        let findings = check.analyze(&exchange).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].detail.contains("ExternalInterface.call("));
    }

    #[tokio::test]
    async fn test_compressed_movie_is_inflated() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"ExternalInterface.call('x')").unwrap();
        let mut body = b"CWS\x0a\x00\x00\x00\x00".to_vec();
        body.extend(encoder.finish().unwrap());

        let check = CrossSiteFlashingCheck::new();
        let findings = check.analyze(&movie(body)).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].detail.contains("ExternalInterface.call("));
    }

    #[tokio::test]
    async fn test_corrupt_compressed_movie_errors() {
        let check = CrossSiteFlashingCheck::new();
        let body = b"CWS\x0a\x00\x00\x00\x00not-zlib-data".to_vec();
        assert!(matches!(
            check.analyze(&movie(body)).await,
            Err(ScannerError::Analysis { .. })
        ));
    }

    #[test]
    fn test_relevance() {
        let check = CrossSiteFlashingCheck::new();
        assert!(check.is_relevant(&movie(Vec::new())));

        let by_extension = HttpExchange::new(
            HttpRequest::get("https://a.com/Intro.SWF?v=1"),
            HttpResponse::new(200, Vec::new()).with_header("Content-Type", "application/octet-stream"),
        );
        assert!(check.is_relevant(&by_extension));

        let page = HttpExchange::new(
            HttpRequest::get("https://a.com/index.html"),
            HttpResponse::new(200, Vec::new()).with_header("Content-Type", "text/html"),
        );
        assert!(!check.is_relevant(&page));
    }
}
