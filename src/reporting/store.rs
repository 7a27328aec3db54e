// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Report Store
 * Thread-safe in-memory aggregation of scan log rows and statistics
 *
 * Every event is recorded and then broadcast to subscribers (UI, exporters).
 * Nothing is persisted beyond process lifetime.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::deduplication::FindingDeduplicator;
use super::sink::{LogEntry, ReportSink, StatsUpdate};
use crate::types::{CheckType, Finding};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Default broadcast channel capacity
const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    Logged(LogEntry),
    Stats(StatsUpdate),
}

/// Column selector for log filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogColumn {
    Host,
    CheckType,
    Result,
    Time,
}

impl LogColumn {
    fn value_of(&self, entry: &LogEntry) -> String {
        match self {
            LogColumn::Host => entry.host.clone(),
            LogColumn::CheckType => entry.check_type.display_name().to_string(),
            LogColumn::Result => entry.outcome.label().to_string(),
            LogColumn::Time => entry.time_label(),
        }
    }
}

pub struct ReportStore {
    entries: RwLock<Vec<LogEntry>>,
    stats: RwLock<HashMap<CheckType, StatsUpdate>>,
    sender: broadcast::Sender<ReportEvent>,
    event_count: AtomicU64,
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportStore {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            entries: RwLock::new(Vec::new()),
            stats: RwLock::new(HashMap::new()),
            sender,
            event_count: AtomicU64::new(0),
        }
    }

    /// Receive all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ReportEvent> {
        self.sender.subscribe()
    }

    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Case-insensitive literal match on one column; empty keyword keeps all rows
    pub fn filter(&self, column: LogColumn, keyword: &str) -> Vec<LogEntry> {
        let keyword = keyword.trim().to_lowercase();
        let entries = self.entries.read();
        if keyword.is_empty() {
            return entries.clone();
        }
        entries
            .iter()
            .filter(|e| column.value_of(e).to_lowercase().contains(&keyword))
            .cloned()
            .collect()
    }

    pub fn stats(&self, check_type: CheckType) -> Option<StatsUpdate> {
        self.stats.read().get(&check_type).cloned()
    }

    /// Latest statistics for every check that has reported, in check order
    pub fn stats_rows(&self) -> Vec<StatsUpdate> {
        let stats = self.stats.read();
        CheckType::ALL
            .iter()
            .filter_map(|check| stats.get(check).cloned())
            .collect()
    }

    /// Every finding ever logged, duplicates included
    pub fn findings(&self) -> Vec<Finding> {
        self.entries
            .read()
            .iter()
            .flat_map(|e| e.findings().iter().cloned())
            .collect()
    }

    /// Operator view: repeated findings for the same rule and resource folded
    pub fn deduplicated_findings(&self) -> Vec<Finding> {
        FindingDeduplicator::new().deduplicate(self.findings())
    }

    fn publish(&self, event: ReportEvent) {
        self.event_count.fetch_add(1, Ordering::Relaxed);
        if self.sender.receiver_count() > 0 {
            if let Err(e) = self.sender.send(event) {
                debug!("Failed to broadcast report event: {}", e);
            }
        }
    }
}

impl ReportSink for ReportStore {
    fn log_finding(&self, entry: LogEntry) {
        debug!(
            "Added log entry: Host={}, Checktype={}, Result={}, Time={}",
            entry.host,
            entry.check_type,
            entry.outcome.label(),
            entry.time_label()
        );
        self.entries.write().push(entry.clone());
        self.publish(ReportEvent::Logged(entry));
    }

    fn update_stats(&self, update: StatsUpdate) {
        {
            let mut stats = self.stats.write();
            // Updates can arrive out of order from concurrent checks; keep the newest
            let stale = stats
                .get(&update.check_type)
                .map(|current| current.timestamp > update.timestamp)
                .unwrap_or(false);
            if !stale {
                stats.insert(update.check_type, update.clone());
            }
        }
        self.publish(ReportEvent::Stats(update));
    }
}
