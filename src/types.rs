// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};

/// The four passive checks shipped by the scanner
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    ReverseTabnabbing,
    Xssi,
    Clickjacking,
    CrossSiteFlashing,
}

impl CheckType {
    pub const ALL: [CheckType; 4] = [
        CheckType::ReverseTabnabbing,
        CheckType::Xssi,
        CheckType::Clickjacking,
        CheckType::CrossSiteFlashing,
    ];

    /// Operator-facing name, as shown in the statistics and log tables
    pub fn display_name(&self) -> &'static str {
        match self {
            CheckType::ReverseTabnabbing => "Reverse Tabnabbing",
            CheckType::Xssi => "XSSI",
            CheckType::Clickjacking => "Clickjacking",
            CheckType::CrossSiteFlashing => "Cross Site Flashing",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::ReverseTabnabbing => "reverse_tabnabbing",
            CheckType::Xssi => "xssi",
            CheckType::Clickjacking => "clickjacking",
            CheckType::CrossSiteFlashing => "cross_site_flashing",
        }
    }
}

impl std::fmt::Display for CheckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    High,
    Medium,
    Low,
    Information,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
            Severity::Information => write!(f, "INFORMATION"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Certain,
    Firm,
    Tentative,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Certain => write!(f, "CERTAIN"),
            Confidence::Firm => write!(f, "FIRM"),
            Confidence::Tentative => write!(f, "TENTATIVE"),
        }
    }
}

/// A single reported issue. Severity and confidence come from the rule,
/// never from the response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub rule_name: String,
    pub check_type: CheckType,
    pub url: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub detail: String,
    pub remediation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Reference to the exchange the finding was raised on
    pub evidence_ref: String,
    pub discovered_at: String,
}

/// Result of one completed analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "result", content = "findings")]
pub enum ScanOutcome {
    Pass,
    Issues(Vec<Finding>),
}

impl ScanOutcome {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        if findings.is_empty() {
            ScanOutcome::Pass
        } else {
            ScanOutcome::Issues(findings)
        }
    }

    pub fn findings(&self) -> &[Finding] {
        match self {
            ScanOutcome::Pass => &[],
            ScanOutcome::Issues(findings) => findings,
        }
    }

    pub fn is_issue(&self) -> bool {
        matches!(self, ScanOutcome::Issues(_))
    }

    /// "Pass" / "Issues", as written into the log table
    pub fn label(&self) -> &'static str {
        match self {
            ScanOutcome::Pass => "Pass",
            ScanOutcome::Issues(_) => "Issues",
        }
    }
}

/// What to do when a new finding duplicates an existing one
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationAction {
    KeepBoth,
    KeepNew,
    KeepExisting,
}

/// Random v4-style identifier for findings and log entries
pub(crate) fn new_id(prefix: &str) -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    format!(
        "{}_{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
        prefix,
        rng.random::<u32>(),
        rng.random::<u16>(),
        rng.random::<u16>(),
        rng.random::<u16>(),
        rng.random::<u64>() & 0xffffffffffff
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_findings() {
        assert_eq!(ScanOutcome::from_findings(vec![]), ScanOutcome::Pass);
        assert_eq!(ScanOutcome::Pass.label(), "Pass");
        assert!(ScanOutcome::Pass.findings().is_empty());
    }

    #[test]
    fn test_new_id_prefix() {
        let a = new_id("finding");
        let b = new_id("finding");
        assert!(a.starts_with("finding_"));
        assert_ne!(a, b);
    }
}
