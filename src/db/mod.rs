//! Data access. Every function takes a borrowed `PgConnection` and is meant
//! to run inside `AppState::run`, i.e. on the blocking thread pool.

pub mod cinemas;
pub mod customers;
pub mod food;
pub mod ids;
pub mod movies;
pub mod orders;
pub mod reports;
pub mod seats;
pub mod showtimes;
pub mod vouchers;

use anyhow::anyhow;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::state::DbPool;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Brings the schema up to date. Called once at startup.
pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let mut conn = pool
        .get()
        .map_err(|e| anyhow!("Couldn't get db connection from pool: {}", e))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!("Failed to run migrations: {}", e))?;
    for migration in applied {
        log::info!("applied migration {}", migration);
    }
    Ok(())
}

pub(crate) fn is_unique_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// Serialization failures and deadlocks: the statement lost a race with a
/// concurrent transaction. Postgres reports deadlocks (40P01) without a
/// dedicated kind, so they are recognised by message.
pub(crate) fn is_lock_conflict(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => true,
        DieselError::DatabaseError(_, info) => info.message().starts_with("deadlock detected"),
        _ => false,
    }
}
