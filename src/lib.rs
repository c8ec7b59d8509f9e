//! dc-replicator - ticket field dynamic content across helpdesk tenants
//!
//! Mirrors custom ticket field titles and dropdown/tagger option values into the
//! dynamic content store of every tenant listed in a credential roster, and can
//! wipe that store again.
//!
//! # Architecture
//!
//! ```text
//!  roster.xml ──► Registry ─────────────┐
//!                                       │
//!  fields.csv ──► FieldReader ──┐       ▼
//!                               ├──► naming ──► Replicator ──┐
//!  options.csv ─► OptionReader ─┘                            ├──► ContentStore ──► helpdesk API
//!                                               Sweeper ─────┘     (HelpdeskClient)
//!
//!  helpdesk API ──► FieldCatalog ──► Exporter ──► fields.csv / options.csv
//! ```
//!
//! Failures of single remote calls are classified and counted, never fatal;
//! only malformed local input ([`ConfigError`]) stops a run.

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod jobs;
pub mod naming;
pub mod registry;
pub mod replicate;
pub mod summary;
pub mod sweep;

pub use client::{ContentStore, FieldCatalog, HelpdeskClient, InMemoryContentStore};
pub use config::Config;
pub use error::{ConfigError, ConfigResult, RemoteError, RemoteErrorKind};
pub use naming::ContentItem;
pub use registry::{Registry, TenantInstance};
pub use replicate::Replicator;
pub use summary::{RunSummary, Tally, TenantOutcome};
pub use sweep::Sweeper;
