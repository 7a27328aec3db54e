// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Check State
 * Per-check bookkeeping: enable flag, processed URLs, running counters
 *
 * All mutation happens under one mutex per check. Network probing never
 * runs while the lock is held.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::gating::SkipReason;
use crate::types::CheckType;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Default)]
struct StateInner {
    enabled: bool,
    seen_urls: HashSet<String>,
    in_flight: u64,
    completed: u64,
    findings_total: u64,
    last_updated_at: Option<DateTime<Utc>>,
}

/// Point-in-time copy of a check's counters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckStats {
    pub check_type: CheckType,
    pub enabled: bool,
    pub in_flight: u64,
    pub completed: u64,
    pub findings_total: u64,
    pub seen_urls: usize,
    pub last_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct CheckState {
    check_type: CheckType,
    inner: Mutex<StateInner>,
}

impl CheckState {
    pub fn new(check_type: CheckType, enabled: bool) -> Arc<Self> {
        Arc::new(Self {
            check_type,
            inner: Mutex::new(StateInner {
                enabled,
                ..StateInner::default()
            }),
        })
    }

    pub fn check_type(&self) -> CheckType {
        self.check_type
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.lock().enabled = enabled;
    }

    pub fn has_seen(&self, url: &str) -> bool {
        self.inner.lock().seen_urls.contains(url)
    }

    pub fn stats(&self) -> CheckStats {
        let inner = self.inner.lock();
        self.snapshot(&inner)
    }

    /// Count a new exchange as in flight. The guard settles the count exactly once.
    pub fn begin(self: &Arc<Self>) -> InFlightGuard {
        let mut inner = self.inner.lock();
        inner.in_flight += 1;
        inner.last_updated_at = Some(Utc::now());
        drop(inner);

        InFlightGuard {
            state: Arc::clone(self),
            reserved_url: None,
            settled: false,
        }
    }

    fn snapshot(&self, inner: &StateInner) -> CheckStats {
        CheckStats {
            check_type: self.check_type,
            enabled: inner.enabled,
            in_flight: inner.in_flight,
            completed: inner.completed,
            findings_total: inner.findings_total,
            seen_urls: inner.seen_urls.len(),
            last_updated_at: inner.last_updated_at,
        }
    }

    /// Dedup and relevance decided in one critical section, so two
    /// concurrent exchanges for one URL can never both proceed.
    fn reserve(&self, url: &str, relevant: bool) -> Result<(), SkipReason> {
        let mut inner = self.inner.lock();
        if inner.seen_urls.contains(url) {
            return Err(SkipReason::Duplicate);
        }
        if !relevant {
            return Err(SkipReason::IrrelevantType);
        }
        inner.seen_urls.insert(url.to_string());
        Ok(())
    }

    fn settle(&self, completed: bool, findings: usize) -> CheckStats {
        let mut inner = self.inner.lock();
        debug_assert!(inner.in_flight > 0, "in_flight underflow");
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if completed {
            inner.completed += 1;
        }
        inner.findings_total += findings as u64;
        inner.last_updated_at = Some(Utc::now());
        self.snapshot(&inner)
    }

    fn abandon(&self, reserved_url: Option<&str>) {
        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if let Some(url) = reserved_url {
            inner.seen_urls.remove(url);
        }
        inner.last_updated_at = Some(Utc::now());
    }
}

/// Tracks one in-flight exchange. Dropping it without settling (task
/// cancelled, engine shut down) releases the count and the URL reservation.
#[derive(Debug)]
pub struct InFlightGuard {
    state: Arc<CheckState>,
    reserved_url: Option<String>,
    settled: bool,
}

impl InFlightGuard {
    pub fn check_type(&self) -> CheckType {
        self.state.check_type
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    pub(crate) fn reserve(&mut self, url: &str, relevant: bool) -> Result<(), SkipReason> {
        self.state.reserve(url, relevant)?;
        self.reserved_url = Some(url.to_string());
        Ok(())
    }

    /// Irrelevant-type skips count as scanned; the rest do not
    pub fn skip(mut self, reason: SkipReason) -> CheckStats {
        self.settled = true;
        self.state.settle(reason.counts_as_completed(), 0)
    }

    pub fn complete(mut self, findings: usize) -> CheckStats {
        self.settled = true;
        self.state.settle(true, findings)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.state.abandon(self.reserved_url.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_complete() {
        let state = CheckState::new(CheckType::Clickjacking, true);
        let mut guard = state.begin();
        assert_eq!(state.stats().in_flight, 1);
        guard.reserve("https://example.com/", true).unwrap();
        let stats = guard.complete(1);

        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.findings_total, 1);
        assert!(state.has_seen("https://example.com/"));
    }

    #[test]
    fn test_skip_accounting_asymmetry() {
        let state = CheckState::new(CheckType::Xssi, true);

        for reason in [SkipReason::Disabled, SkipReason::Whitelisted, SkipReason::Duplicate] {
            let stats = state.begin().skip(reason);
            assert_eq!(stats.completed, 0);
            assert_eq!(stats.in_flight, 0);
        }

        let stats = state.begin().skip(SkipReason::IrrelevantType);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_flight, 0);
    }

    #[test]
    fn test_duplicate_reservation() {
        let state = CheckState::new(CheckType::Xssi, true);
        let mut first = state.begin();
        let mut second = state.begin();
        first.reserve("https://a.com/x.js", true).unwrap();
        assert_eq!(
            second.reserve("https://a.com/x.js", true),
            Err(SkipReason::Duplicate)
        );
        second.skip(SkipReason::Duplicate);
        first.complete(0);
        assert_eq!(state.stats().completed, 1);
    }

    #[test]
    fn test_irrelevant_does_not_reserve() {
        let state = CheckState::new(CheckType::Clickjacking, true);
        let mut guard = state.begin();
        assert_eq!(
            guard.reserve("https://a.com/logo.png", false),
            Err(SkipReason::IrrelevantType)
        );
        guard.skip(SkipReason::IrrelevantType);
        assert!(!state.has_seen("https://a.com/logo.png"));
    }

    #[test]
    fn test_dropped_guard_releases_count_and_url() {
        let state = CheckState::new(CheckType::Xssi, true);
        {
            let mut guard = state.begin();
            guard.reserve("https://a.com/data.json", true).unwrap();
        }
        let stats = state.stats();
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.completed, 0);
        assert!(!state.has_seen("https://a.com/data.json"));
    }
}
