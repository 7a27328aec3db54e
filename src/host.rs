// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Capabilities the host provides to the passive checks.

use crate::errors::ScannerResult;
use crate::exchange::{HttpExchange, HttpRequest};
use std::collections::HashSet;

/// Re-issues a request over the network. Only the XSSI probe uses this.
#[async_trait::async_trait]
pub trait RequestSender: Send + Sync {
    async fn send_request(&self, request: &HttpRequest) -> ScannerResult<HttpExchange>;
}

/// Target scope membership
pub trait ScopeOracle: Send + Sync {
    fn is_in_scope(&self, url: &str) -> bool;
}

/// Every exchange the host has observed so far, for bulk retesting
pub trait SiteMap: Send + Sync {
    fn all_known_exchanges(&self) -> Vec<HttpExchange>;
}

impl SiteMap for Vec<HttpExchange> {
    fn all_known_exchanges(&self) -> Vec<HttpExchange> {
        self.clone()
    }
}

/// Scope defined by a set of hosts; subdomains of a listed host are in scope
#[derive(Debug, Clone, Default)]
pub struct HostScope {
    hosts: HashSet<String>,
}

impl HostScope {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }
}

impl ScopeOracle for HostScope {
    fn is_in_scope(&self, url: &str) -> bool {
        let domain = crate::exchange::extract_domain(url);
        if domain.is_empty() {
            return false;
        }
        self.hosts
            .iter()
            .any(|h| domain == *h || domain.ends_with(&format!(".{}", h)))
    }
}
