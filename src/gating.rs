// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Gating Policy
 * Shared pre-filter deciding whether a check runs on an exchange
 *
 * Order is fixed and short-circuits:
 *   enabled -> whitelist -> scope (optional) -> dedup -> content type
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::exchange::{extract_domain, HttpExchange};
use crate::host::ScopeOracle;
use crate::state::InFlightGuard;
use crate::whitelist::WhitelistStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    Whitelisted,
    OutOfScope,
    NoResponse,
    Duplicate,
    IrrelevantType,
}

impl SkipReason {
    /// Only type-irrelevant exchanges count as scanned-but-clean
    pub fn counts_as_completed(&self) -> bool {
        matches!(self, SkipReason::IrrelevantType)
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SkipReason::Disabled => "disabled",
            SkipReason::Whitelisted => "whitelisted",
            SkipReason::OutOfScope => "out of scope",
            SkipReason::NoResponse => "no response",
            SkipReason::Duplicate => "duplicate",
            SkipReason::IrrelevantType => "irrelevant type",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Skip(SkipReason),
}

#[derive(Clone)]
pub struct GatingPolicy {
    whitelist: Arc<WhitelistStore>,
    scope: Option<Arc<dyn ScopeOracle>>,
}

impl GatingPolicy {
    pub fn new(whitelist: Arc<WhitelistStore>) -> Self {
        Self {
            whitelist,
            scope: None,
        }
    }

    /// Additionally skip exchanges the scope oracle rejects
    pub fn with_scope(mut self, scope: Arc<dyn ScopeOracle>) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn whitelist(&self) -> &Arc<WhitelistStore> {
        &self.whitelist
    }

    /// Decide whether the check owning `guard` should analyze `exchange`.
    /// On `Proceed` the URL has been reserved in the check's seen set.
    pub fn should_analyze(
        &self,
        exchange: &HttpExchange,
        guard: &mut InFlightGuard,
        is_relevant: impl FnOnce(&HttpExchange) -> bool,
    ) -> GateDecision {
        let check = guard.check_type();
        let url = exchange.url();

        if !guard.is_enabled() {
            debug!("[{}] Skipping disabled check", check);
            return GateDecision::Skip(SkipReason::Disabled);
        }

        let domain = extract_domain(url);
        if self.whitelist.is_whitelisted(&domain) {
            debug!("[{}] Skipping whitelisted domain: {}", check, domain);
            return GateDecision::Skip(SkipReason::Whitelisted);
        }

        if let Some(scope) = &self.scope {
            if !scope.is_in_scope(url) {
                debug!("[{}] Skipping out-of-scope URL: {}", check, url);
                return GateDecision::Skip(SkipReason::OutOfScope);
            }
        }

        if !exchange.has_response() {
            debug!("[{}] Skipping request with no response: {}", check, url);
            return GateDecision::Skip(SkipReason::NoResponse);
        }

        let relevant = is_relevant(exchange);
        match guard.reserve(url, relevant) {
            Ok(()) => GateDecision::Proceed,
            Err(reason) => {
                debug!(
                    "[{}] Skipping {} ({}), content-type: {}",
                    check,
                    url,
                    reason,
                    exchange.declared_mime_type()
                );
                GateDecision::Skip(reason)
            }
        }
    }
}
