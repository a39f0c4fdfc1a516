//! Connection pool and migration utilities.

use babel_error::{DatabaseError, DatabaseErrorKind};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Pool of PostgreSQL connections shared by the worker.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Embedded migrations for the jobs and stories tables.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Build a connection pool for `database_url`.
///
/// # Errors
///
/// Returns an error if the pool cannot open its initial connections.
#[tracing::instrument(skip(database_url))]
pub fn establish_pool(database_url: &str, max_size: u32) -> Result<PgPool, DatabaseError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size.max(1))
        .build(manager)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub fn run_migrations(conn: &mut PgConnection) -> Result<(), DatabaseError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Migration(e.to_string())))?;
    tracing::info!(count = applied.len(), "Applied database migrations");
    Ok(())
}
