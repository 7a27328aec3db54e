// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP Exchange View
 * Read-only snapshot of an observed request/response pair
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::borrow::Cow;
use tracing::debug;

/// Request headers that carry authentication material
pub const AUTH_HEADERS: [&str; 2] = ["cookie", "authorization"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True when the request carries a Cookie or Authorization header
    pub fn has_auth_material(&self) -> bool {
        self.headers
            .iter()
            .any(|(k, _)| AUTH_HEADERS.iter().any(|h| k.eq_ignore_ascii_case(h)))
    }

    /// Copy of this request with Cookie/Authorization removed
    pub fn without_auth_headers(&self) -> HttpRequest {
        let headers = self
            .headers
            .iter()
            .filter(|(k, _)| !AUTH_HEADERS.iter().any(|h| k.eq_ignore_ascii_case(h)))
            .cloned()
            .collect();

        HttpRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers,
            body: self.body.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    /// MIME type stated by the host; falls back to Content-Type when absent
    pub stated_mime_type: Option<String>,
    pub body: Vec<u8>,
    /// Body was cut at the client's size limit
    pub truncated: bool,
}

impl HttpResponse {
    pub fn new(status_code: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code,
            headers: Vec::new(),
            stated_mime_type: None,
            body: body.into(),
            truncated: false,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.stated_mime_type = Some(mime.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Declared MIME type, lowercased, without parameters. Empty when unknown.
    pub fn declared_mime_type(&self) -> String {
        let raw = match &self.stated_mime_type {
            Some(mime) => mime.as_str(),
            None => self.header("content-type").unwrap_or(""),
        };
        raw.split(';').next().unwrap_or("").trim().to_lowercase()
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn body_latin1(&self) -> String {
        latin1(&self.body)
    }
}

/// One char per byte (ISO-8859-1), so binary bodies never fail to decode
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// An observed request with its response, if one was received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpExchange {
    pub request: HttpRequest,
    pub response: Option<HttpResponse>,
}

impl HttpExchange {
    pub fn new(request: HttpRequest, response: HttpResponse) -> Self {
        Self {
            request,
            response: Some(response),
        }
    }

    pub fn without_response(request: HttpRequest) -> Self {
        Self {
            request,
            response: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.request.url
    }

    pub fn host(&self) -> String {
        extract_domain(&self.request.url)
    }

    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    pub fn declared_mime_type(&self) -> String {
        self.response
            .as_ref()
            .map(|r| r.declared_mime_type())
            .unwrap_or_default()
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        self.response.as_ref().and_then(|r| r.header(name))
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        match &self.response {
            Some(r) => r.body_text(),
            None => Cow::Borrowed(""),
        }
    }

    pub fn body_bytes(&self) -> &[u8] {
        self.response.as_ref().map(|r| r.body.as_slice()).unwrap_or(&[])
    }

    /// Lowercased URL path, without query or fragment
    pub fn url_path_lower(&self) -> String {
        match url::Url::parse(&self.request.url) {
            Ok(parsed) => parsed.path().to_lowercase(),
            Err(_) => self
                .request
                .url
                .split(['?', '#'])
                .next()
                .unwrap_or("")
                .to_lowercase(),
        }
    }

    /// Stable reference used to tie findings and log entries to this exchange
    pub fn evidence_ref(&self) -> String {
        format!("{} {}", self.request.method, self.request.url)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim())
}

/// Host of the URL, lowercased, with a leading "www." removed.
/// Unparseable URLs yield an empty string, which matches nothing.
pub fn extract_domain(url: &str) -> String {
    let host = match url::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.to_lowercase(),
            None => {
                debug!("URL has no host: {}", url);
                return String::new();
            }
        },
        Err(e) => {
            debug!("Error extracting domain from URL: {}, Error: {}", url, e);
            return String::new();
        }
    };

    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://www.example.com/a?b=c"), "example.com");
        assert_eq!(extract_domain("https://API.Example.com:8443/"), "api.example.com");
        assert_eq!(extract_domain("http://wwwexample.com/"), "wwwexample.com");
    }

    #[test]
    fn test_extract_domain_malformed() {
        assert_eq!(extract_domain("not a url"), "");
        assert_eq!(extract_domain(""), "");
        assert_eq!(extract_domain("mailto:user@example.com"), "");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(200, "ok")
            .with_header("X-Frame-Options", " DENY ")
            .with_header("Content-Type", "text/html; charset=utf-8");

        assert_eq!(response.header("x-frame-options"), Some("DENY"));
        assert_eq!(response.declared_mime_type(), "text/html");
    }

    #[test]
    fn test_stated_mime_type_wins() {
        let response = HttpResponse::new(200, "")
            .with_header("Content-Type", "text/plain")
            .with_mime_type("application/x-shockwave-flash");
        assert_eq!(response.declared_mime_type(), "application/x-shockwave-flash");
    }

    #[test]
    fn test_strip_auth_headers() {
        let request = HttpRequest::get("https://example.com/data.json")
            .with_header("Cookie", "sid=abc")
            .with_header("authorization", "Bearer xyz")
            .with_header("Accept", "*/*");

        assert!(request.has_auth_material());
        let stripped = request.without_auth_headers();
        assert!(!stripped.has_auth_material());
        assert_eq!(stripped.headers, vec![("Accept".to_string(), "*/*".to_string())]);
    }

    #[test]
    fn test_latin1_preserves_bytes() {
        let response = HttpResponse::new(200, vec![0x46, 0x57, 0x53, 0xff, 0x00]);
        let text = response.body_latin1();
        assert_eq!(text.chars().count(), 5);
        assert_eq!(text.chars().nth(3), Some('\u{ff}'));
    }

    #[test]
    fn test_url_path_lower() {
        let exchange = HttpExchange::new(
            HttpRequest::get("https://cdn.example.com/App.JS?v=3"),
            HttpResponse::new(200, ""),
        );
        assert_eq!(exchange.url_path_lower(), "/app.js");
    }
}
