//! Durable job queue and story store for the BabelBooks worker.
//!
//! [`PostgresStore`] implements both [`JobQueue`](babel_interface::JobQueue)
//! and [`StoryStore`](babel_interface::StoryStore) on PostgreSQL via Diesel.
//! Jobs are claimed with `FOR UPDATE SKIP LOCKED`, so any number of workers
//! may poll the same table. [`InMemoryStore`] offers the same contract in
//! process memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use babel_database::{PostgresStore, establish_pool};
//!
//! let pool = establish_pool(&database_url, 8)?;
//! let store = PostgresStore::new(pool);
//! store.migrate().await?;
//! ```

#![warn(missing_docs)]

mod connection;
mod memory;
#[allow(missing_docs)]
mod models;
mod postgres;

/// Diesel table definitions.
#[allow(missing_docs)]
pub mod schema;

pub use connection::{MIGRATIONS, PgPool, establish_pool, run_migrations};
pub use memory::InMemoryStore;
pub use models::{JobRow, PageRow, StoryRow};
pub use postgres::PostgresStore;
