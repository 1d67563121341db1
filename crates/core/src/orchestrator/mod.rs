//! Job orchestrator for product video runs.
//!
//! A start request is validated synchronously and recorded as a `pending`
//! job; the work itself runs in a spawned task:
//! - **Batch**: taken from the run state tracker (circular over the product list)
//! - **Product**: script → video render → concurrent platform publishes
//! - **Commit**: the tracker advances once per product whose video was produced

mod config;
mod pipeline;
mod registry;
mod run_config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use pipeline::ProductPipeline;
pub use registry::{JobCounts, JobRegistry};
pub use run_config::{ConfigSource, RunConfig};
pub use runner::JobOrchestrator;
pub use types::{
    Job, JobHandle, JobResult, JobStatus, OrchestratorError, PlatformOutcome, ProductError,
    ProductErrorKind, ProductOutcome, ProductStatus, ValidationError, ValidationKind,
};

/// Smallest accepted `products_per_run`.
pub const MIN_PRODUCTS_PER_RUN: u32 = 1;

/// Largest accepted `products_per_run`.
pub const MAX_PRODUCTS_PER_RUN: u32 = 10;
