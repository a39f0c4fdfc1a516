//! BabelBooks story worker.
//!
//! Claims story jobs from the queue and turns each prompt into an illustrated,
//! narrated picture book, writing every stage to the story store as it lands
//! so readers can watch the story grow.
//!
//! - [`JobCoordinator`]: claim loop and the per-job stage machine
//! - [`ProgressivePersistence`]: metadata, page and completion writes with optional blob offload
//! - [`WorkerConfig`]: layered configuration (defaults, `babel.toml`, environment)
//! - [`api`]: health, metrics and manual requeue over HTTP
//! - [`init_observability`]: tracing subscriber setup

#![warn(missing_docs)]

pub mod api;
mod config;
mod coordinator;
mod observability;
mod persistence;

pub use config::{ImageMode, WorkerConfig};
pub use coordinator::{
    CoordinatorSettings, JobCoordinator, JobCoordinatorBuilder, JobCoordinatorBuilderError,
    JobOutcome,
};
pub use observability::{ObservabilityConfig, init_observability};
pub use persistence::ProgressivePersistence;
