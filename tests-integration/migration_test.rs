//! Integration tests for the migration runner against a real PostgreSQL database
//!
//! Set `GOMIG_TEST_DATABASE_URL` to run them; without it every test returns early.
//! Each test works in its own schema (via `search_path`), so `gomig_migrations` and the
//! generated tables never collide with other tests or existing data.
//!
//! Test flow:
//! 1. Create a scratch schema
//! 2. Generate migration files into a temp directory
//! 3. Run them and verify the bookkeeping table and the resulting schema
//! 4. Drop the scratch schema

use chrono::{TimeZone, Utc};
use gomig::migration::{generate_migration, ApplyMode, MigrationError, Runner};
use gomig::{connect, PostgresExecutor, SqlExecutor};
use std::fs;
use tempfile::TempDir;

/// Connection plus a private schema that is dropped with the guard
struct TestSchema {
    executor: PostgresExecutor,
    schema: String,
}

impl TestSchema {
    fn new(test: &str) -> Option<Self> {
        let Ok(url) = std::env::var("GOMIG_TEST_DATABASE_URL") else {
            eprintln!("GOMIG_TEST_DATABASE_URL not set; skipping {test}");
            return None;
        };
        let executor = PostgresExecutor::new(connect(&url).expect("Failed to connect to test database"));
        let schema = format!(
            "gomig_it_{}_{}",
            test,
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );
        executor
            .batch_execute(&format!("CREATE SCHEMA {schema}; SET search_path TO {schema};"))
            .expect("Failed to create test schema");
        Some(Self { executor, schema })
    }

    fn column_names(&self, table: &str) -> Vec<String> {
        let sql = format!(
            "SELECT column_name::TEXT FROM information_schema.columns \
             WHERE table_schema = '{}' AND table_name = '{}' ORDER BY ordinal_position",
            self.schema, table
        );
        self.executor
            .query_text(&sql)
            .expect("Failed to query columns")
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect()
    }

    fn recorded_versions(&self) -> Vec<String> {
        self.executor
            .query_text("SELECT version FROM gomig_migrations ORDER BY id")
            .expect("Failed to query gomig_migrations")
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect()
    }
}

impl Drop for TestSchema {
    fn drop(&mut self) {
        let _ = self
            .executor
            .batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema));
    }
}

fn at(minute: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 20, 12, minute, 0).unwrap()
}

#[test]
fn test_generate_then_migrate() {
    let Some(db) = TestSchema::new("generate_then_migrate") else {
        return;
    };
    let dir = TempDir::new().unwrap();

    let created = generate_migration(dir.path(), "create_users", &["email:varchar(255)"], at(0))
        .expect("Failed to generate create migration");
    let altered = generate_migration(dir.path(), "alter_users", &["active:boolean"], at(1))
        .expect("Failed to generate alter migration");

    let runner = Runner::new(dir.path()).with_order(gomig::migration::ApplyOrder::CreatedAt);
    let report = runner.run(&db.executor).expect("Failed to run migrations");

    assert_eq!(report.applied, vec![created.filename.clone(), altered.filename.clone()]);
    assert_eq!(
        db.column_names("users"),
        vec!["id", "email", "created_at", "updated_at", "active"]
    );
    assert_eq!(db.recorded_versions(), vec![created.filename, altered.filename]);

    let status = runner.status(&db.executor).expect("Failed to get status");
    assert!(status.is_up_to_date());
    assert_eq!(status.applied_count(), 2);
}

#[test]
fn test_second_run_applies_nothing() {
    let Some(db) = TestSchema::new("second_run") else {
        return;
    };
    let dir = TempDir::new().unwrap();
    generate_migration(dir.path(), "create_posts", &["title:text"], at(0)).unwrap();

    let runner = Runner::new(dir.path());
    assert_eq!(runner.run(&db.executor).unwrap().applied_count(), 1);

    let again = runner.run(&db.executor).unwrap();
    assert_eq!(again.applied_count(), 0);
    assert_eq!(again.skipped, 1);
    assert_eq!(db.recorded_versions().len(), 1);
}

#[test]
fn test_failed_migration_is_rolled_back() {
    let Some(db) = TestSchema::new("rollback") else {
        return;
    };
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a000000000_create_tags.up.sql"),
        "CREATE TABLE tags (id SERIAL PRIMARY KEY);",
    )
    .unwrap();
    fs::write(
        dir.path().join("b000000000_broken.up.sql"),
        "CREATE TABLE labels (id SERIAL PRIMARY KEY); SELECT * FROM no_such_table;",
    )
    .unwrap();

    let err = Runner::new(dir.path()).run(&db.executor).unwrap_err();

    assert!(matches!(err, MigrationError::ExecutionFailed { .. }));
    assert_eq!(err.file(), Some("b000000000_broken.up.sql"));
    assert_eq!(db.recorded_versions(), vec!["a000000000_create_tags.up.sql"]);
    assert!(!db.column_names("tags").is_empty());
    // the statement before the failing one was rolled back with it
    assert!(db.column_names("labels").is_empty());
}

#[test]
fn test_direct_mode_records_after_each_file() {
    let Some(db) = TestSchema::new("direct") else {
        return;
    };
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a000000000_create_tags.up.sql"),
        "CREATE TABLE tags (id SERIAL PRIMARY KEY);",
    )
    .unwrap();
    fs::write(
        dir.path().join("b000000000_broken.up.sql"),
        "SELECT * FROM no_such_table;",
    )
    .unwrap();

    let runner = Runner::new(dir.path()).with_mode(ApplyMode::Direct);
    let err = runner.run(&db.executor).unwrap_err();

    assert!(matches!(err, MigrationError::ExecutionFailed { .. }));
    assert_eq!(db.recorded_versions(), vec!["a000000000_create_tags.up.sql"]);

    fs::write(
        dir.path().join("b000000000_broken.up.sql"),
        "CREATE TABLE labels (id SERIAL PRIMARY KEY);",
    )
    .unwrap();
    let report = runner.run(&db.executor).unwrap();
    assert_eq!(report.applied, vec!["b000000000_broken.up.sql"]);
    assert!(!db.column_names("labels").is_empty());
}
