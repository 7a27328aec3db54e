// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::types::{CheckType, Finding, ScanOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Timestamp format used in log and statistics rows
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the scan log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub host: String,
    pub url: String,
    pub check_type: CheckType,
    pub outcome: ScanOutcome,
    pub timestamp: DateTime<Utc>,
    pub exchange_ref: String,
}

impl LogEntry {
    pub fn findings(&self) -> &[Finding] {
        self.outcome.findings()
    }

    pub fn time_label(&self) -> String {
        self.timestamp.format(TIME_FORMAT).to_string()
    }

    /// Name/Detail/Remediation of the first finding, for the detail pane
    pub fn analysis_text(&self) -> String {
        match self.findings().first() {
            Some(finding) => format!(
                "Name: {}\nDetail: {}\nRemediation: {}",
                finding.rule_name, finding.detail, finding.remediation
            ),
            None => "No issues found".to_string(),
        }
    }
}

/// Counter snapshot pushed after every settled exchange
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsUpdate {
    pub check_type: CheckType,
    pub in_flight: u64,
    pub completed: u64,
    pub findings_count: u64,
    pub timestamp: DateTime<Utc>,
}

impl StatsUpdate {
    /// "N scanning, M scanned"
    pub fn status_line(&self) -> String {
        format!("{} scanning, {} scanned", self.in_flight, self.completed)
    }
}

/// Receiver of scan events. Called concurrently from every check.
pub trait ReportSink: Send + Sync {
    fn log_finding(&self, entry: LogEntry);

    fn update_stats(&self, update: StatsUpdate);
}
