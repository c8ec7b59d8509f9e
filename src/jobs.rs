//! Command runs
//!
//! Each run loads every local input (roster, extracts, client settings) before
//! the first request. A [`ConfigError`](crate::ConfigError) therefore stops the
//! run with no tenant touched.

use crate::client::{HelpdeskClient, InMemoryContentStore};
use crate::config::Config;
use crate::error::ConfigResult;
use crate::export::{ExportSummary, Exporter};
use crate::extract::{
    read_fields, read_options, ExtractWriter, SkippedRow, FIELD_EXTRACT_HEADER,
    OPTION_EXTRACT_HEADER,
};
use crate::naming::{self, ContentItem};
use crate::registry::Registry;
use crate::replicate::Replicator;
use crate::summary::RunSummary;
use crate::sweep::Sweeper;
use serde::Serialize;
use std::path::Path;

/// Outcome of `replicate`, with the extract rows that were left out
#[derive(Debug, Clone, Serialize)]
pub struct Replication {
    pub summary: RunSummary,
    pub skipped_rows: Vec<SkippedRow>,
}

impl Replication {
    pub fn has_failures(&self) -> bool {
        self.summary.has_failures() || !self.skipped_rows.is_empty()
    }
}

fn load_roster(roster: &Path) -> ConfigResult<Registry> {
    let registry = Registry::load(roster)?;
    tracing::info!(
        tenants = registry.len(),
        roster = %roster.display(),
        "Loaded roster"
    );
    Ok(registry)
}

/// Read both extracts to the end and derive the content items
pub fn load_items(
    fields: &Path,
    options: &Path,
) -> ConfigResult<(Vec<ContentItem>, Vec<SkippedRow>)> {
    let mut field_reader = read_fields(fields)?;
    let mut option_reader = read_options(options)?;
    let items = naming::resolve(field_reader.by_ref(), option_reader.by_ref());

    let mut skipped = field_reader.finish()?;
    skipped.extend(option_reader.finish()?);
    tracing::info!(items = items.len(), skipped = skipped.len(), "Resolved content items");
    Ok((items, skipped))
}

/// Create every derived item on every tenant
///
/// A dry run replays the same calls against an empty in-memory store, one
/// namespace per tenant. Keys repeated within the extracts are reported as
/// `BadRequest` there, exactly as the server would report them.
pub async fn replicate(
    config: &Config,
    roster: &Path,
    fields: &Path,
    options: &Path,
    dry_run: bool,
) -> ConfigResult<Replication> {
    let registry = load_roster(roster)?;
    let (items, skipped_rows) = load_items(fields, options)?;

    let summary = if dry_run {
        let store = InMemoryContentStore::new();
        Replicator::new(&store)
            .dry_run(true)
            .run(registry.tenants(), &items)
            .await
    } else {
        let client = HelpdeskClient::new(config)?;
        Replicator::new(&client).run(registry.tenants(), &items).await
    };

    Ok(Replication {
        summary,
        skipped_rows,
    })
}

/// Delete all dynamic content on every tenant (list only on a dry run)
pub async fn sweep(config: &Config, roster: &Path, dry_run: bool) -> ConfigResult<RunSummary> {
    let registry = load_roster(roster)?;
    let client = HelpdeskClient::new(config)?;

    if !dry_run {
        tracing::warn!(
            tenants = registry.len(),
            "Deleting ALL dynamic content on every tenant in the roster"
        );
    }

    Ok(Sweeper::new(&client)
        .dry_run(dry_run)
        .run(registry.tenants())
        .await)
}

/// Write the field and option extracts from the tenants' ticket fields
pub async fn export(
    config: &Config,
    roster: &Path,
    fields: &Path,
    options: &Path,
) -> ConfigResult<ExportSummary> {
    let registry = load_roster(roster)?;
    let client = HelpdeskClient::new(config)?;

    let mut field_writer = ExtractWriter::create(fields, &FIELD_EXTRACT_HEADER)?;
    let mut option_writer = ExtractWriter::create(options, &OPTION_EXTRACT_HEADER)?;

    let summary = Exporter::new(&client, &config.extract)
        .run(registry.tenants(), &mut field_writer, &mut option_writer)
        .await?;

    field_writer.finish()?;
    option_writer.finish()?;
    tracing::info!(
        fields = %fields.display(),
        options = %options.display(),
        "Extracts written"
    );
    Ok(summary)
}
