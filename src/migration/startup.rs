//! In-process migration execution helpers

use crate::config::GomigConfig;
use crate::connection::{connect, ConnectionError};
use crate::executor::PostgresExecutor;
use crate::migration::{MigrationError, RunReport};

/// Run migrations on application startup
///
/// Opens a connection from `config.database.url`, applies pending migrations with the
/// configured mode and order, and closes the connection before returning.
///
/// There is no locking: start one migrating process at a time.
///
/// # Example
///
/// ```rust,no_run
/// use gomig::config::GomigConfig;
/// use gomig::migration::startup_migrations;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = GomigConfig::load()?;
///     startup_migrations(&config)?;
///
///     // Continue with application startup...
///     Ok(())
/// }
/// ```
pub fn startup_migrations(config: &GomigConfig) -> Result<RunReport, MigrationError> {
    let url = config.database.url.as_deref().ok_or_else(|| {
        ConnectionError::InvalidConnectionString("no database URL configured".to_string())
    })?;

    let executor = PostgresExecutor::new(connect(url)?);
    let report = config.migrations.runner().run(&executor)?;

    if report.applied.is_empty() {
        log::debug!("No pending migrations to apply");
    } else {
        log::info!("Applied {} migration(s) on startup", report.applied.len());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_database_url() {
        let err = startup_migrations(&GomigConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Connection(ConnectionError::InvalidConnectionString(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_url_before_connecting() {
        let mut config = GomigConfig::default();
        config.database.url = Some("not a url".to_string());
        assert!(matches!(
            startup_migrations(&config).unwrap_err(),
            MigrationError::Connection(ConnectionError::InvalidConnectionString(_))
        ));
    }
}
