// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Dynamic Content Probe
 * Re-requests a script/JSON resource to tell session- or time-dependent
 * content apart from static assets
 *
 * Stage A: drop Cookie/Authorization and compare bodies.
 * Stage B: send the original request twice, at least one second apart,
 *          and compare bodies.
 *
 * Every probe runs under a timeout and a shared shutdown signal. A probe
 * that fails, times out or is cancelled is inconclusive, and inconclusive
 * means static.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{ProbeError, ScannerError, ScannerResult};
use crate::exchange::{HttpExchange, HttpRequest};
use crate::host::RequestSender;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Minimum gap between the two temporal samples
pub const MIN_TEMPORAL_DELAY: Duration = Duration::from_secs(1);

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeVerdict {
    /// Unauthenticated body differs from the original
    AuthDependent,
    /// Two samples taken apart in time differ
    TimeDependent,
    /// Both stages returned identical bodies
    Stable,
    /// No Cookie/Authorization on the request, nothing to compare against
    NoAuthMaterial,
    /// Probe failed, timed out or was cancelled
    Inconclusive,
}

impl ProbeVerdict {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ProbeVerdict::AuthDependent | ProbeVerdict::TimeDependent)
    }
}

struct TrackerInner {
    active: AtomicUsize,
    shutdown: watch::Sender<bool>,
}

/// Counts running probes and broadcasts cancellation to them
#[derive(Clone)]
pub struct ProbeTracker {
    inner: Arc<TrackerInner>,
}

impl ProbeTracker {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(TrackerInner {
                active: AtomicUsize::new(0),
                shutdown,
            }),
        }
    }

    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    /// Cancel every running and future probe
    pub fn cancel_all(&self) {
        self.inner.shutdown.send_replace(true);
    }

    /// Wait until no probe is running. Returns false if `grace` elapsed first.
    pub async fn drain(&self, grace: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + grace;
        while self.active() > 0 {
            if tokio::time::Instant::now() >= deadline {
                warn!("[Probe] {} probe(s) still running after {:?}", self.active(), grace);
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        true
    }

    fn enter(&self) -> ProbeTicket {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        ProbeTicket {
            tracker: self.clone(),
        }
    }

    async fn cancelled(&self) {
        let mut rx = self.inner.shutdown.subscribe();
        // Sender lives as long as the tracker, so this only ends on cancel
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for ProbeTracker {
    fn default() -> Self {
        Self::new()
    }
}

struct ProbeTicket {
    tracker: ProbeTracker,
}

impl Drop for ProbeTicket {
    fn drop(&mut self) {
        self.tracker.inner.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct DynamicContentProbe {
    sender: Arc<dyn RequestSender>,
    timeout: Duration,
    temporal_delay: Duration,
    tracker: ProbeTracker,
}

impl DynamicContentProbe {
    pub fn new(sender: Arc<dyn RequestSender>, tracker: ProbeTracker) -> Self {
        Self {
            sender,
            timeout: DEFAULT_PROBE_TIMEOUT,
            temporal_delay: MIN_TEMPORAL_DELAY,
            tracker,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delays below one second are raised to one second
    pub fn with_temporal_delay(mut self, delay: Duration) -> Self {
        self.temporal_delay = delay.max(MIN_TEMPORAL_DELAY);
        self
    }

    pub fn temporal_delay(&self) -> Duration {
        self.temporal_delay
    }

    pub fn tracker(&self) -> &ProbeTracker {
        &self.tracker
    }

    pub async fn classify(&self, exchange: &HttpExchange) -> ProbeVerdict {
        if !exchange.request.has_auth_material() {
            debug!("[Probe] No auth material on {}, treating as static", exchange.url());
            return ProbeVerdict::NoAuthMaterial;
        }

        let url = exchange.url().to_string();
        if self.tracker.is_cancelled() {
            debug!("[Probe] Shutting down, not probing {}", url);
            return ProbeVerdict::Inconclusive;
        }

        let _ticket = self.tracker.enter();
        let result: ScannerResult<ProbeVerdict> = tokio::select! {
            outcome = tokio::time::timeout(self.timeout, self.run_stages(exchange)) => match outcome {
                Ok(inner) => inner,
                Err(_) => Err(ProbeError::TimedOut { url: url.clone(), timeout: self.timeout }.into()),
            },
            _ = self.tracker.cancelled() => Err(ProbeError::Cancelled { url: url.clone() }.into()),
        };

        match result {
            Ok(verdict) => {
                info!("[Probe] {} classified as {:?}", url, verdict);
                verdict
            }
            Err(e) => {
                warn!("[Probe] Inconclusive for {}: {}", url, e);
                ProbeVerdict::Inconclusive
            }
        }
    }

    async fn run_stages(&self, exchange: &HttpExchange) -> ScannerResult<ProbeVerdict> {
        let original = exchange.body_bytes();

        let anonymous = self.fetch(&exchange.request.without_auth_headers()).await?;
        if anonymous.body_bytes() != original {
            return Ok(ProbeVerdict::AuthDependent);
        }

        let first = self.fetch(&exchange.request).await?;
        tokio::time::sleep(self.temporal_delay).await;
        let second = self.fetch(&exchange.request).await?;

        if first.body_bytes() != second.body_bytes() {
            Ok(ProbeVerdict::TimeDependent)
        } else {
            Ok(ProbeVerdict::Stable)
        }
    }

    async fn fetch(&self, request: &HttpRequest) -> ScannerResult<HttpExchange> {
        let exchange = self.sender.send_request(request).await.map_err(|e| match e {
            ScannerError::Probe(p) => ScannerError::Probe(p),
            other => ProbeError::RequestFailed {
                url: request.url.clone(),
                reason: other.to_string(),
            }
            .into(),
        })?;

        let reason = match exchange.response.as_ref().map(|r| r.truncated) {
            None => "no response received",
            Some(true) => "response body truncated",
            Some(false) => return Ok(exchange),
        };
        Err(ProbeError::RequestFailed {
            url: request.url.clone(),
            reason: reason.to_string(),
        }
        .into())
    }
}
