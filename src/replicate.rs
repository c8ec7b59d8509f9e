//! Replication orchestrator
//!
//! Creates every content item on every tenant, one call at a time. A failed
//! call is classified, logged and counted; it never stops the run. Existing
//! content is not looked up first, so a rerun reports duplicates as
//! `BadRequest`.

use crate::client::ContentStore;
use crate::naming::ContentItem;
use crate::registry::TenantInstance;
use crate::summary::{RunSummary, TenantOutcome};

/// Drives content creation across tenants
pub struct Replicator<'a, S: ?Sized> {
    store: &'a S,
    dry_run: bool,
}

impl<'a, S: ContentStore + ?Sized> Replicator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            dry_run: false,
        }
    }

    /// Mark the summary as a rehearsal (the store is expected to be in-memory)
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Attempt each (tenant, item) pair exactly once, tenants outermost
    pub async fn run(&self, tenants: &[TenantInstance], items: &[ContentItem]) -> RunSummary {
        let mut summary = RunSummary::new("replicate", self.dry_run);

        for tenant in tenants {
            tracing::info!(tenant = tenant.domain(), items = items.len(), "Replicating");
            summary.push(self.replicate_tenant(tenant, items).await);
        }

        tracing::info!(
            attempted = summary.totals.attempted,
            succeeded = summary.totals.succeeded,
            failed = summary.totals.failed_total(),
            "Replication finished"
        );
        summary
    }

    async fn replicate_tenant(&self, tenant: &TenantInstance, items: &[ContentItem]) -> TenantOutcome {
        let mut outcome = TenantOutcome::new(tenant.domain());

        for item in items {
            match self.store.create(tenant, &item.key, &item.body).await {
                Ok(created) => {
                    tracing::info!(
                        tenant = tenant.domain(),
                        key = %item.key,
                        id = ?created.id,
                        "Dynamic content created"
                    );
                    outcome.items.record_success();
                }
                Err(e) => {
                    tracing::warn!(
                        tenant = tenant.domain(),
                        key = %item.key,
                        kind = %e.kind(),
                        "Dynamic content not created: {}",
                        e
                    );
                    outcome.items.record_failure(&e);
                }
            }
        }

        outcome
    }
}
