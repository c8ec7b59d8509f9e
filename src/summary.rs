//! Run summaries
//!
//! Per-tenant and aggregate outcome counts for replication and sweep runs.

use crate::error::{RemoteError, RemoteErrorKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Attempted / succeeded / failed-by-kind counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: BTreeMap<RemoteErrorKind, usize>,
}

impl Tally {
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, error: &RemoteError) {
        self.attempted += 1;
        *self.failed.entry(error.kind()).or_default() += 1;
    }

    /// Total failures of every kind
    pub fn failed_total(&self) -> usize {
        self.failed.values().sum()
    }

    /// Failures of one kind
    pub fn failed_of(&self, kind: RemoteErrorKind) -> usize {
        self.failed.get(&kind).copied().unwrap_or(0)
    }

    pub fn absorb(&mut self, other: &Tally) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        for (kind, count) in &other.failed {
            *self.failed.entry(*kind).or_default() += count;
        }
    }
}

/// Outcome for one tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantOutcome {
    pub tenant: String,
    pub items: Tally,
    /// Items found by listing (sweeps only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listed: Option<usize>,
    /// Tenant-level failure that stopped work on this tenant (listing, for sweeps)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<RemoteErrorKind>,
}

impl TenantOutcome {
    pub fn new(tenant: &str) -> Self {
        Self {
            tenant: tenant.to_string(),
            items: Tally::default(),
            listed: None,
            aborted: None,
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// `replicate` or `sweep`
    pub operation: String,
    pub dry_run: bool,
    pub totals: Tally,
    pub tenants: Vec<TenantOutcome>,
}

impl RunSummary {
    pub fn new(operation: &str, dry_run: bool) -> Self {
        Self {
            operation: operation.to_string(),
            dry_run,
            totals: Tally::default(),
            tenants: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: TenantOutcome) {
        self.totals.absorb(&outcome.items);
        self.tenants.push(outcome);
    }

    pub fn tenant(&self, domain: &str) -> Option<&TenantOutcome> {
        self.tenants.iter().find(|t| t.tenant == domain)
    }

    /// Any item failed or any tenant was abandoned
    pub fn has_failures(&self) -> bool {
        self.totals.failed_total() > 0 || self.tenants.iter().any(|t| t.aborted.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts() {
        let mut tally = Tally::default();
        tally.record_success();
        tally.record_failure(&RemoteError::BadRequest("dup".into()));
        tally.record_failure(&RemoteError::BadRequest("dup".into()));
        tally.record_failure(&RemoteError::Network("reset".into()));

        assert_eq!(tally.attempted, 4);
        assert_eq!(tally.succeeded, 1);
        assert_eq!(tally.failed_total(), 3);
        assert_eq!(tally.failed_of(RemoteErrorKind::BadRequest), 2);
        assert_eq!(tally.failed_of(RemoteErrorKind::Forbidden), 0);
    }

    #[test]
    fn test_summary_aggregates_tenants() {
        let mut summary = RunSummary::new("replicate", false);

        let mut a = TenantOutcome::new("a");
        a.items.record_success();
        summary.push(a);

        let mut b = TenantOutcome::new("b");
        b.items.record_failure(&RemoteError::Unauthorized);
        summary.push(b);

        assert_eq!(summary.totals.attempted, 2);
        assert_eq!(summary.totals.failed_of(RemoteErrorKind::Unauthorized), 1);
        assert!(summary.has_failures());
        assert_eq!(summary.tenant("a").unwrap().items.succeeded, 1);
    }

    #[test]
    fn test_aborted_tenant_is_a_failure() {
        let mut summary = RunSummary::new("sweep", false);
        let mut outcome = TenantOutcome::new("a");
        outcome.aborted = Some(RemoteErrorKind::Forbidden);
        summary.push(outcome);

        assert_eq!(summary.totals.failed_total(), 0);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_serializes_kinds_snake_case() {
        let mut tally = Tally::default();
        tally.record_failure(&RemoteError::ServerError {
            status: 502,
            detail: String::new(),
        });
        let json = serde_json::to_value(&tally).unwrap();
        assert_eq!(json["failed"]["server_error"], 1);
    }
}
