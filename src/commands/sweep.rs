//! Sweep command

use super::Outcome;
use crate::output::OutputFormat;
use dc_replicator::{jobs, Config, ConfigResult};
use std::path::Path;

pub async fn handle(
    config: Option<&Path>,
    roster: &Path,
    dry_run: bool,
    format: OutputFormat,
) -> ConfigResult<Outcome> {
    let config = Config::resolve(config)?;
    let summary = jobs::sweep(&config, roster, dry_run).await?;

    format.print(&summary);
    Ok(Outcome {
        has_failures: summary.has_failures(),
    })
}
