//! Replicate command

use super::Outcome;
use crate::output::OutputFormat;
use dc_replicator::{jobs, Config, ConfigResult};
use std::path::Path;

pub async fn handle(
    config: Option<&Path>,
    roster: &Path,
    fields: &Path,
    options: &Path,
    dry_run: bool,
    format: OutputFormat,
) -> ConfigResult<Outcome> {
    let config = Config::resolve(config)?;
    let run = jobs::replicate(&config, roster, fields, options, dry_run).await?;

    format.print(&run.summary);
    Ok(Outcome {
        has_failures: run.has_failures(),
    })
}
