//! CLI commands

pub mod export;
pub mod replicate;
pub mod sweep;

/// What a finished command reports back to `main`
pub struct Outcome {
    pub has_failures: bool,
}
