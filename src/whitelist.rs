// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Domain Whitelist
 * Exempted domains, read by every check on every exchange
 *
 * Readers take a cheap Arc snapshot; writers replace the whole list,
 * so a check never sees a half-applied edit.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::WhitelistError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WhitelistEntry {
    pub domain: String,
    #[serde(default)]
    pub include_subdomains: bool,
}

impl WhitelistEntry {
    pub fn new(domain: &str, include_subdomains: bool) -> Self {
        Self {
            domain: normalize(domain),
            include_subdomains,
        }
    }

    pub fn matches(&self, domain: &str) -> bool {
        if domain.is_empty() {
            return false;
        }
        if domain == self.domain {
            return true;
        }
        self.include_subdomains && domain.ends_with(&format!(".{}", self.domain))
    }
}

impl std::fmt::Display for WhitelistEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.include_subdomains {
            write!(f, "{} (Include Subdomains)", self.domain)
        } else {
            f.write_str(&self.domain)
        }
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_lowercase()
}

#[derive(Debug, Default)]
pub struct WhitelistStore {
    entries: RwLock<Arc<Vec<WhitelistEntry>>>,
}

impl WhitelistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = WhitelistEntry>) -> Self {
        let store = Self::new();
        for entry in entries {
            if let Err(e) = store.add(&entry.domain, entry.include_subdomains) {
                debug!("Ignoring whitelist entry {}: {}", entry.domain, e);
            }
        }
        store
    }

    /// Add a domain. Empty input and already-listed domains are rejected.
    pub fn add(&self, domain: &str, include_subdomains: bool) -> Result<WhitelistEntry, WhitelistError> {
        let entry = WhitelistEntry::new(domain, include_subdomains);
        if entry.domain.is_empty() {
            return Err(WhitelistError::Empty);
        }

        let mut guard = self.entries.write();
        if guard.iter().any(|e| e.domain == entry.domain) {
            return Err(WhitelistError::Duplicate(entry.domain));
        }

        let mut next = guard.as_ref().clone();
        next.push(entry.clone());
        *guard = Arc::new(next);

        info!(
            "Added domain to whitelist: {}, Include Subdomains: {}",
            entry.domain, entry.include_subdomains
        );
        Ok(entry)
    }

    pub fn remove(&self, domain: &str) -> Result<WhitelistEntry, WhitelistError> {
        let domain = normalize(domain);
        let mut guard = self.entries.write();
        let position = guard
            .iter()
            .position(|e| e.domain == domain)
            .ok_or_else(|| WhitelistError::NotFound(domain.clone()))?;

        let mut next = guard.as_ref().clone();
        let removed = next.remove(position);
        *guard = Arc::new(next);

        info!("Removed domain from whitelist: {}", removed.domain);
        Ok(removed)
    }

    /// Consistent view of the list at this instant
    pub fn snapshot(&self) -> Arc<Vec<WhitelistEntry>> {
        Arc::clone(&self.entries.read())
    }

    pub fn is_whitelisted(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        let snapshot = self.snapshot();
        match snapshot.iter().find(|entry| entry.matches(&domain)) {
            Some(entry) => {
                debug!("Domain whitelisted: {} matches {}", domain, entry);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomain_matching() {
        let store = WhitelistStore::new();
        store.add("example.com", true).unwrap();

        assert!(store.is_whitelisted("api.example.com"));
        assert!(store.is_whitelisted("example.com"));
        assert!(!store.is_whitelisted("notexample.com"));
    }

    #[test]
    fn test_exact_matching() {
        let store = WhitelistStore::new();
        store.add("example.com", false).unwrap();

        assert!(store.is_whitelisted("example.com"));
        assert!(store.is_whitelisted("EXAMPLE.COM"));
        assert!(!store.is_whitelisted("api.example.com"));
    }

    #[test]
    fn test_empty_domain_never_matches() {
        let store = WhitelistStore::new();
        store.add("example.com", true).unwrap();
        assert!(!store.is_whitelisted(""));
    }

    #[test]
    fn test_add_rejects_empty_and_duplicates() {
        let store = WhitelistStore::new();
        assert_eq!(store.add("   ", false), Err(WhitelistError::Empty));
        store.add("Example.com", false).unwrap();
        assert_eq!(
            store.add("example.com", true),
            Err(WhitelistError::Duplicate("example.com".to_string()))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = WhitelistStore::new();
        store.add("example.com", true).unwrap();
        let removed = store.remove("example.com").unwrap();
        assert!(removed.include_subdomains);
        assert!(store.is_empty());
        assert_eq!(
            store.remove("example.com"),
            Err(WhitelistError::NotFound("example.com".to_string()))
        );
    }

    #[test]
    fn test_snapshot_is_stable_across_edits() {
        let store = WhitelistStore::new();
        store.add("a.com", false).unwrap();
        let before = store.snapshot();
        store.add("b.com", false).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            WhitelistEntry::new("example.com", true).to_string(),
            "example.com (Include Subdomains)"
        );
    }
}
