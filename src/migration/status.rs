//! Migration status tracking

use crate::migration::{AppliedMigrationRecord, MigrationFile};

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Rows of `gomig_migrations`, oldest first
    pub applied: Vec<AppliedMigrationRecord>,

    /// Files on disk with no bookkeeping row, in apply order
    pub pending: Vec<MigrationFile>,

    /// Recorded versions with no matching file in the migrations directory
    pub missing_files: Vec<String>,
}

impl MigrationStatus {
    /// Create a new `MigrationStatus`
    #[must_use]
    pub fn new(
        applied: Vec<AppliedMigrationRecord>,
        pending: Vec<MigrationFile>,
        missing_files: Vec<String>,
    ) -> Self {
        Self {
            applied,
            pending,
            missing_files,
        }
    }

    /// Number of recorded migrations
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Number of pending migrations
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if all migrations are applied
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    /// The most recently recorded migration
    #[must_use]
    pub fn last_applied(&self) -> Option<&AppliedMigrationRecord> {
        self.applied.last()
    }

    /// The migration the next run would apply first
    #[must_use]
    pub fn next_pending(&self) -> Option<&MigrationFile> {
        self.pending.first()
    }
}
