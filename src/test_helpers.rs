//! In-memory stand-in for a PostgreSQL connection, used by unit tests.

use crate::executor::{DbError, SqlExecutor, TextRow};
use may_postgres::types::ToSql;
use std::cell::{Cell, RefCell};

/// Records every statement it receives and emulates the `gomig_migrations` table,
/// including transaction-scoped inserts that vanish on `ROLLBACK`.
#[derive(Default)]
pub struct MockExecutor {
    statements: RefCell<Vec<String>>,
    schema_ready: Cell<bool>,
    applied: RefCell<Vec<String>>,
    uncommitted: RefCell<Vec<String>>,
    in_transaction: Cell<bool>,
    fail_on: RefCell<Option<String>>,
    fail_record: Cell<bool>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the bookkeeping table.
    pub fn with_applied(versions: &[&str]) -> Self {
        let mock = Self::new();
        mock.schema_ready.set(true);
        mock.applied
            .borrow_mut()
            .extend(versions.iter().map(|v| v.to_string()));
        mock
    }

    /// Make any batch containing `needle` fail.
    pub fn fail_on(&self, needle: &str) {
        *self.fail_on.borrow_mut() = Some(needle.to_string());
    }

    /// Make the bookkeeping insert fail.
    pub fn fail_record(&self) {
        self.fail_record.set(true);
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    pub fn applied(&self) -> Vec<String> {
        self.applied.borrow().clone()
    }

    /// How many times a statement containing `needle` was sent.
    pub fn count(&self, needle: &str) -> usize {
        self.statements
            .borrow()
            .iter()
            .filter(|s| s.contains(needle))
            .count()
    }

    fn log(&self, sql: &str) {
        self.statements.borrow_mut().push(sql.trim().to_string());
    }
}

impl SqlExecutor for MockExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        self.log(query);
        if query.contains("INSERT INTO gomig_migrations") {
            if !self.schema_ready.get() {
                return Err(DbError::Query("relation \"gomig_migrations\" does not exist".into()));
            }
            if self.fail_record.get() {
                return Err(DbError::Query("insert rejected".into()));
            }
            let version = params
                .first()
                .map(|p| format!("{p:?}").trim_matches('"').to_string())
                .ok_or_else(|| DbError::Query("missing version parameter".into()))?;
            if self.in_transaction.get() {
                self.uncommitted.borrow_mut().push(version);
            } else {
                self.applied.borrow_mut().push(version);
            }
            return Ok(1);
        }
        Ok(0)
    }

    fn batch_execute(&self, sql: &str) -> Result<(), DbError> {
        self.log(sql);
        match sql.trim() {
            "BEGIN" => self.in_transaction.set(true),
            "COMMIT" => {
                self.in_transaction.set(false);
                let pending: Vec<String> = self.uncommitted.borrow_mut().drain(..).collect();
                self.applied.borrow_mut().extend(pending);
            }
            "ROLLBACK" => {
                self.in_transaction.set(false);
                self.uncommitted.borrow_mut().clear();
            }
            body => {
                if body.contains("CREATE TABLE IF NOT EXISTS gomig_migrations") {
                    self.schema_ready.set(true);
                }
                if let Some(needle) = self.fail_on.borrow().as_deref() {
                    if body.contains(needle) {
                        return Err(DbError::Query(format!("syntax error near \"{needle}\"")));
                    }
                }
            }
        }
        Ok(())
    }

    fn query_text(&self, query: &str) -> Result<Vec<TextRow>, DbError> {
        self.log(query);
        if !self.schema_ready.get() {
            return Err(DbError::Query("relation \"gomig_migrations\" does not exist".into()));
        }
        let with_metadata = query.contains("applied_at");
        Ok(self
            .applied
            .borrow()
            .iter()
            .enumerate()
            .map(|(idx, version)| {
                if with_metadata {
                    vec![
                        Some((idx + 1).to_string()),
                        Some(version.clone()),
                        Some("2024-01-20 12:00:00.123456+00".to_string()),
                    ]
                } else {
                    vec![Some(version.clone())]
                }
            })
            .collect())
    }
}
