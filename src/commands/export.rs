//! Export command

use super::Outcome;
use crate::output::OutputFormat;
use dc_replicator::{jobs, Config, ConfigResult};
use std::path::Path;

pub async fn handle(
    config: Option<&Path>,
    roster: &Path,
    fields: &Path,
    options: &Path,
    format: OutputFormat,
) -> ConfigResult<Outcome> {
    let config = Config::resolve(config)?;
    let summary = jobs::export(&config, roster, fields, options).await?;

    format.print(&summary);
    Ok(Outcome {
        has_failures: summary.has_failures(),
    })
}
