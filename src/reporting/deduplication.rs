// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::types::Finding;
use std::collections::HashSet;

/// Folds repeated findings for presentation. Checks themselves always keep
/// both copies; only the aggregation layer decides what the operator sees.
pub struct FindingDeduplicator;

impl FindingDeduplicator {
    pub fn new() -> Self {
        Self
    }

    /// Keep the first finding per (check, rule, normalized url, detail)
    pub fn deduplicate(&self, findings: Vec<Finding>) -> Vec<Finding> {
        if findings.is_empty() {
            return findings;
        }

        let mut deduplicated = Vec::new();
        let mut seen_signatures = HashSet::new();

        for finding in findings {
            if seen_signatures.insert(self.compute_signature(&finding)) {
                deduplicated.push(finding);
            }
        }

        deduplicated
    }

    fn compute_signature(&self, finding: &Finding) -> String {
        format!(
            "{}:{}:{}:{}",
            finding.check_type.as_str(),
            finding.rule_name,
            self.normalize_url(&finding.url),
            finding.detail
        )
    }

    fn normalize_url(&self, url: &str) -> String {
        url.split('?').next().unwrap_or(url).to_lowercase()
    }
}

impl Default for FindingDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}
