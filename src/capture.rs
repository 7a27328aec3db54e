// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Recorded traffic loaded from a JSON capture file.
//!
//! ```json
//! [
//!   {
//!     "request":  { "method": "GET", "url": "https://a.com/app.js",
//!                   "headers": [["Cookie", "sid=1"]] },
//!     "response": { "status": 200, "headers": {"Content-Type": "text/javascript"},
//!                   "body": "var x = 1;" }
//!   }
//! ]
//! ```
//!
//! Binary bodies use `bodyBase64` instead of `body`. A missing `response`
//! records a request that never got an answer.

use crate::exchange::{HttpExchange, HttpRequest, HttpResponse};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CapturedHeaders {
    Pairs(Vec<(String, String)>),
    Map(BTreeMap<String, String>),
}

impl Default for CapturedHeaders {
    fn default() -> Self {
        CapturedHeaders::Pairs(Vec::new())
    }
}

impl CapturedHeaders {
    fn into_pairs(self) -> Vec<(String, String)> {
        match self {
            CapturedHeaders::Pairs(pairs) => pairs,
            CapturedHeaders::Map(map) => map.into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CapturedBody {
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    body_base64: Option<String>,
}

impl CapturedBody {
    fn decode(self) -> Result<Vec<u8>> {
        match (self.body_base64, self.body) {
            (Some(encoded), _) => BASE64
                .decode(encoded.trim())
                .context("Invalid bodyBase64"),
            (None, Some(text)) => Ok(text.into_bytes()),
            (None, None) => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CapturedRequest {
    #[serde(default = "default_method")]
    method: String,
    url: String,
    #[serde(default)]
    headers: CapturedHeaders,
    #[serde(flatten)]
    body: CapturedBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CapturedResponse {
    status: u16,
    #[serde(default)]
    headers: CapturedHeaders,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(flatten)]
    body: CapturedBody,
}

#[derive(Debug, Deserialize)]
struct CapturedExchange {
    request: CapturedRequest,
    #[serde(default)]
    response: Option<CapturedResponse>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl CapturedExchange {
    fn into_exchange(self) -> Result<HttpExchange> {
        let url = self.request.url.clone();
        let request = HttpRequest {
            method: self.request.method.to_uppercase(),
            url: self.request.url,
            headers: self.request.headers.into_pairs(),
            body: self.request.body.decode()
                .with_context(|| format!("Request body of {}", url))?,
        };

        let Some(captured) = self.response else {
            return Ok(HttpExchange::without_response(request));
        };

        let body = captured.body.decode()
            .with_context(|| format!("Response body of {}", url))?;
        let mut response = HttpResponse::new(captured.status, body);
        response.headers = captured.headers.into_pairs();
        if let Some(mime) = captured.mime_type {
            response = response.with_mime_type(mime);
        }

        Ok(HttpExchange::new(request, response))
    }
}

pub fn parse_capture(content: &str) -> Result<Vec<HttpExchange>> {
    let captured: Vec<CapturedExchange> =
        serde_json::from_str(content).context("Failed to parse capture file")?;

    captured
        .into_iter()
        .enumerate()
        .map(|(i, c)| c.into_exchange().with_context(|| format!("Capture entry #{}", i)))
        .collect()
}

pub fn load_capture<P: AsRef<Path>>(path: P) -> Result<Vec<HttpExchange>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read capture file: {:?}", path))?;
    parse_capture(&content)
}
