//! Error types for the BabelBooks story worker.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! [`BabelError`] aggregates every concern so `?` works across crate boundaries.
//!
//! # Examples
//!
//! ```
//! use babel_error::{BabelResult, StorageError, StorageErrorKind};
//!
//! fn fetch_data() -> BabelResult<Vec<u8>> {
//!     Err(StorageError::new(StorageErrorKind::NotFound("stories/1/page-1.png".into())))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got {} bytes", data.len()),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod generation;
mod pipeline;
mod safety;
mod storage;

pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{BabelError, BabelErrorKind, BabelResult};
pub use generation::{GenerationError, GenerationErrorKind, RetryableError};
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use safety::{SafetyError, SafetyErrorKind};
pub use storage::{StorageError, StorageErrorKind};
