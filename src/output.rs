//! Output formatting

use clap::ValueEnum;
use dc_replicator::export::ExportSummary;
use dc_replicator::summary::{RunSummary, Tally};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

/// Summaries that can be rendered as a table
pub trait TableView {
    fn table(&self) -> String;
}

impl OutputFormat {
    pub fn print<T: Serialize + TableView>(&self, data: &T) {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(data).unwrap_or_default());
            }
            OutputFormat::Table => {
                println!("{}", data.table());
            }
        }
    }
}

#[derive(Tabled)]
struct TenantRow {
    tenant: String,
    attempted: usize,
    succeeded: usize,
    failed: String,
    note: String,
}

fn failures(tally: &Tally) -> String {
    if tally.failed.is_empty() {
        return "0".into();
    }
    tally
        .failed
        .iter()
        .map(|(kind, count)| format!("{} {}", count, kind))
        .collect::<Vec<_>>()
        .join(", ")
}

impl TableView for RunSummary {
    fn table(&self) -> String {
        let mut rows: Vec<TenantRow> = self
            .tenants
            .iter()
            .map(|t| TenantRow {
                tenant: t.tenant.clone(),
                attempted: t.items.attempted,
                succeeded: t.items.succeeded,
                failed: failures(&t.items),
                note: match (t.aborted, t.listed) {
                    (Some(kind), _) => format!("skipped: {}", kind),
                    (None, Some(listed)) if self.dry_run => format!("{} would be deleted", listed),
                    (None, Some(listed)) => format!("{} listed", listed),
                    (None, None) => String::new(),
                },
            })
            .collect();
        rows.push(TenantRow {
            tenant: "TOTAL".into(),
            attempted: self.totals.attempted,
            succeeded: self.totals.succeeded,
            failed: failures(&self.totals),
            note: if self.dry_run { "dry run".into() } else { String::new() },
        });

        format!(
            "{}\n{}",
            self.operation,
            Table::new(rows).with(Style::modern()).to_string()
        )
    }
}

#[derive(Tabled)]
struct ExportRow {
    tenants: usize,
    fields: usize,
    options: usize,
    failed_tenants: String,
    failed_fields: usize,
}

impl TableView for ExportSummary {
    fn table(&self) -> String {
        let failed_tenants = self
            .failed_tenants
            .iter()
            .map(|f| format!("{} ({})", f.tenant, f.kind))
            .collect::<Vec<_>>()
            .join(", ");
        let row = ExportRow {
            tenants: self.tenants,
            fields: self.fields,
            options: self.options,
            failed_tenants,
            failed_fields: self.failed_fields,
        };
        Table::new([row]).with(Style::modern()).to_string()
    }
}
