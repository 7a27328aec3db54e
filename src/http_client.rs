// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::errors::{NetworkError, ScannerError, ScannerResult};
use crate::exchange::{HttpExchange, HttpRequest, HttpResponse};
use crate::host::RequestSender;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Maximum response body size (10MB) to prevent memory exhaustion
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Hop-by-hop, framing and encoding headers reqwest negotiates itself.
/// Accept-Encoding stays with reqwest so every body it returns is decoded.
const SKIPPED_REPLAY_HEADERS: [&str; 5] = [
    "host",
    "content-length",
    "connection",
    "transfer-encoding",
    "accept-encoding",
];

#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    timeout: Duration,
    max_retries: u32,
    max_body_size: usize,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, max_retries: u32) -> ScannerResult<Self> {
        Self::with_config(timeout_secs, max_retries, false, MAX_BODY_SIZE)
    }

    pub fn with_config(
        timeout_secs: u64,
        max_retries: u32,
        accept_invalid_certs: bool,
        max_body_size: usize,
    ) -> ScannerResult<Self> {
        if accept_invalid_certs {
            warn!("Certificate validation is DISABLED for probe requests");
        }

        // Redirects are not followed: a replay must see the same response shape
        // the browser saw for this exact URL.
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(USER_AGENT)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ScannerError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            max_body_size: if max_body_size > 0 { max_body_size } else { MAX_BODY_SIZE },
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a captured request as-is and wrap the result as a new exchange
    pub async fn send(&self, request: &HttpRequest) -> ScannerResult<HttpExchange> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            NetworkError::InvalidRequest {
                url: request.url.clone(),
                reason: format!("invalid method {}", request.method),
            }
        })?;
        let url = url::Url::parse(&request.url).map_err(|_| NetworkError::InvalidUrl {
            url: request.url.clone(),
        })?;

        let mut attempts = 0;
        let mut last_error = None;

        while attempts <= self.max_retries {
            let mut builder = self.client.request(method.clone(), url.clone());
            for (name, value) in &request.headers {
                if SKIPPED_REPLAY_HEADERS
                    .iter()
                    .any(|h| name.eq_ignore_ascii_case(h))
                {
                    continue;
                }
                builder = builder.header(name.as_str(), value.as_str());
            }
            if !request.body.is_empty() {
                builder = builder.body(request.body.clone());
            }

            match builder.send().await {
                Ok(response) => {
                    let status_code = response.status().as_u16();
                    let headers: Vec<(String, String)> = response
                        .headers()
                        .iter()
                        .filter_map(|(k, v)| {
                            v.to_str()
                                .ok()
                                .map(|value| (k.as_str().to_string(), value.to_string()))
                        })
                        .collect();

                    let mut body = response.bytes().await.map_err(ScannerError::from)?.to_vec();
                    let truncated = body.len() > self.max_body_size;
                    if truncated {
                        debug!(
                            "Truncating {} byte response from {} to {}",
                            body.len(),
                            request.url,
                            self.max_body_size
                        );
                        body.truncate(self.max_body_size);
                    }

                    let http_response = HttpResponse {
                        status_code,
                        headers,
                        stated_mime_type: None,
                        body,
                        truncated,
                    };

                    return Ok(HttpExchange::new(request.clone(), http_response));
                }
                Err(e) => {
                    debug!("Request to {} failed (attempt {}): {}", request.url, attempts + 1, e);
                    last_error = Some(e);
                    attempts += 1;
                    if attempts <= self.max_retries {
                        tokio::time::sleep(Duration::from_millis(100 * attempts as u64)).await;
                    }
                }
            }
        }

        Err(match last_error {
            Some(e) => e.into(),
            None => NetworkError::Other(format!("no attempt made for {}", request.url)).into(),
        })
    }
}

#[async_trait::async_trait]
impl RequestSender for HttpClient {
    async fn send_request(&self, request: &HttpRequest) -> ScannerResult<HttpExchange> {
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_rejected_without_network() {
        let client = HttpClient::new(5, 0).unwrap();
        let err = client.send(&HttpRequest::get("not a url")).await.unwrap_err();
        assert!(matches!(
            err,
            ScannerError::Network(NetworkError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_method_rejected() {
        let client = HttpClient::new(5, 0).unwrap();
        let mut request = HttpRequest::get("https://example.com/");
        request.method = "BAD METHOD".to_string();
        let err = client.send(&request).await.unwrap_err();
        assert!(matches!(
            err,
            ScannerError::Network(NetworkError::InvalidRequest { .. })
        ));
    }
}
