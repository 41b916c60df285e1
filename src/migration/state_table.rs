//! Applied-state tracking in the `gomig_migrations` table

use crate::executor::{DbError, SqlExecutor};
use crate::migration::{AppliedMigrationRecord, MigrationError};
use sea_query::{Expr, Order, PostgresQueryBuilder, Query};
use std::collections::HashSet;

/// Name of the bookkeeping table
pub const STATE_TABLE: &str = "gomig_migrations";

/// Create the `gomig_migrations` table if it doesn't exist
///
/// Columns:
/// - `id` - auto-increment, reflects recording order
/// - `version` - migration file name
/// - `applied_at` - set by the database when the row is inserted
///
/// Safe to call on every run.
pub fn ensure_schema(executor: &dyn SqlExecutor) -> Result<(), MigrationError> {
    let sql = r#"
        CREATE TABLE IF NOT EXISTS gomig_migrations (
            id SERIAL PRIMARY KEY,
            version VARCHAR(255) NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
    "#;

    executor.batch_execute(sql)?;
    Ok(())
}

/// Load the set of applied migration file names
pub fn load_applied(executor: &dyn SqlExecutor) -> Result<HashSet<String>, MigrationError> {
    let mut query = Query::select();
    query.column("version").from(STATE_TABLE);
    let (sql, _) = query.build(PostgresQueryBuilder);

    let rows = executor.query_text(&sql)?;
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .next()
                .flatten()
                .ok_or_else(|| MigrationError::InvalidRecord("NULL version".to_string()))
        })
        .collect()
}

/// Load full bookkeeping rows, oldest first
pub fn load_records(executor: &dyn SqlExecutor) -> Result<Vec<AppliedMigrationRecord>, MigrationError> {
    let mut query = Query::select();
    query
        .expr(Expr::cust("id::TEXT"))
        .expr(Expr::cust("version"))
        .expr(Expr::cust("applied_at::TEXT"))
        .from(STATE_TABLE)
        .order_by("id", Order::Asc);
    let (sql, _) = query.build(PostgresQueryBuilder);

    executor
        .query_text(&sql)?
        .iter()
        .map(AppliedMigrationRecord::from_text_row)
        .collect()
}

/// Insert one bookkeeping row; `applied_at` comes from the column default.
pub fn record_applied(executor: &dyn SqlExecutor, version: &str) -> Result<(), DbError> {
    executor.execute("INSERT INTO gomig_migrations (version) VALUES ($1)", &[&version])?;
    Ok(())
}
