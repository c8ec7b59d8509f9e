//! Reconciliation sweeper
//!
//! Lists and deletes every dynamic content item of each tenant. No name
//! filtering: this wipes the whole store, so only point it at tenants where
//! that is intended.

use crate::client::{ContentStore, RemoteItem};
use crate::registry::TenantInstance;
use crate::summary::{RunSummary, TenantOutcome};

/// Drives full-wipe sweeps across tenants
pub struct Sweeper<'a, S: ?Sized> {
    store: &'a S,
    dry_run: bool,
}

impl<'a, S: ContentStore + ?Sized> Sweeper<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            dry_run: false,
        }
    }

    /// List only; nothing is deleted
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self, tenants: &[TenantInstance]) -> RunSummary {
        let mut summary = RunSummary::new("sweep", self.dry_run);

        for tenant in tenants {
            summary.push(self.sweep_tenant(tenant).await);
        }

        tracing::info!(
            attempted = summary.totals.attempted,
            succeeded = summary.totals.succeeded,
            failed = summary.totals.failed_total(),
            "Sweep finished"
        );
        summary
    }

    async fn sweep_tenant(&self, tenant: &TenantInstance) -> TenantOutcome {
        let mut outcome = TenantOutcome::new(tenant.domain());

        let items = match self.store.list(tenant).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    tenant = tenant.domain(),
                    kind = %e.kind(),
                    "Skipping tenant, listing failed: {}",
                    e
                );
                outcome.aborted = Some(e.kind());
                return outcome;
            }
        };
        tracing::info!(tenant = tenant.domain(), items = items.len(), "Sweeping");
        outcome.listed = Some(items.len());

        for RemoteItem { id, name } in items {
            if self.dry_run {
                tracing::info!(tenant = tenant.domain(), id, key = %name, "Would delete");
                continue;
            }

            match self.store.delete(tenant, id).await {
                Ok(_) => {
                    tracing::info!(tenant = tenant.domain(), id, key = %name, "Dynamic content deleted");
                    outcome.items.record_success();
                }
                Err(e) => {
                    tracing::warn!(
                        tenant = tenant.domain(),
                        id,
                        key = %name,
                        kind = %e.kind(),
                        "Dynamic content not deleted: {}",
                        e
                    );
                    outcome.items.record_failure(&e);
                }
            }
        }

        outcome
    }
}
