//! Migration file naming, writing and discovery
//!
//! Files are named `<hash>_<name>.up.sql`, where `<hash>` is the first 10 hex characters
//! of SHA-256 over the migration name followed by its `%Y%m%d%H%M%S` generation timestamp.

use crate::migration::generator::{generate_sql, GeneratedSql};
use crate::migration::MigrationError;
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix every runnable migration file carries
pub const MIGRATION_SUFFIX: &str = ".up.sql";

/// Timestamp format used in file hashes and in the `-- Created at:` header
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

const HASH_LEN: usize = 10;

static CREATED_AT_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^-- Created at: (\d{14})\s*$").expect("valid header regex"));

/// Order in which pending migrations are applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplyOrder {
    /// Lexical filename order. Filenames start with a hash, so this is deterministic
    /// but unrelated to when the files were generated.
    #[default]
    Filename,
    /// Generation order from each file's `-- Created at:` header. Files without the
    /// header come after all others, in filename order.
    CreatedAt,
}

/// A migration file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Path to the migration file
    pub path: PathBuf,

    /// File name; this is the `version` recorded in `gomig_migrations`
    pub filename: String,

    /// Generation time from the `-- Created at:` header, when read
    pub created_at: Option<NaiveDateTime>,
}

impl MigrationFile {
    /// Read the SQL content of the file
    pub fn read_sql(&self) -> Result<String, MigrationError> {
        fs::read_to_string(&self.path)
            .map_err(|e| MigrationError::io("Error reading migration file", &self.path, e))
    }
}

/// Result of generating and writing one migration
#[derive(Debug, Clone)]
pub struct GeneratedMigration {
    pub path: PathBuf,
    pub filename: String,
    pub generated: GeneratedSql,
}

/// Format a generation timestamp the way file hashes and headers expect it
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Compute `<hash>_<name>.up.sql` for a migration name and timestamp.
///
/// Characters that cannot appear in a single path component are replaced with `_` in the
/// file name only; the hash always covers the name as given.
pub fn migration_filename(name: &str, timestamp: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(timestamp.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    let safe_name: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}{}", &hash[..HASH_LEN], safe_name, MIGRATION_SUFFIX)
}

/// Write generated SQL to `<dir>/<hash>_<name>.up.sql`, creating `dir` if needed.
///
/// An existing file with the same name is overwritten. Two generations of the same name
/// within one second produce the same file name.
pub fn write_migration(
    migrations_dir: &Path,
    name: &str,
    sql: &str,
    timestamp: &str,
) -> Result<PathBuf, MigrationError> {
    fs::create_dir_all(migrations_dir)
        .map_err(|e| MigrationError::io("Error creating migrations directory", migrations_dir, e))?;

    let path = migrations_dir.join(migration_filename(name, timestamp));
    fs::write(&path, sql).map_err(|e| MigrationError::io("Error writing migration file", &path, e))?;
    Ok(path)
}

/// Generate SQL for `name` and `columns` at time `now` and write it to `migrations_dir`.
///
/// Malformed input still produces a file (containing only comments); the problems are
/// logged as warnings and returned in `generated.diagnostics`.
pub fn generate_migration<S: AsRef<str>>(
    migrations_dir: &Path,
    name: &str,
    columns: &[S],
    now: DateTime<Utc>,
) -> Result<GeneratedMigration, MigrationError> {
    let timestamp = format_timestamp(now);
    let generated = generate_sql(name, columns, &timestamp);
    for diagnostic in &generated.diagnostics {
        log::warn!("{name}: skipped {diagnostic}");
    }

    let path = write_migration(migrations_dir, name, &generated.sql, &timestamp)?;
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    log::info!("Migration file created: {}", path.display());

    Ok(GeneratedMigration {
        path,
        filename,
        generated,
    })
}

/// Extract the `-- Created at:` timestamp from migration content
pub fn parse_created_at(sql: &str) -> Option<NaiveDateTime> {
    let caps = CREATED_AT_HEADER.captures(sql)?;
    NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), TIMESTAMP_FORMAT).ok()
}

/// Discover all migration files in a directory
///
/// Only regular files ending in `.up.sql` are returned; anything else in the directory is
/// skipped. The result is sorted according to `order`.
///
/// # Errors
///
/// Returns `MigrationError::Io` if the directory (or, for `ApplyOrder::CreatedAt`, a file)
/// cannot be read.
pub fn discover_migrations(
    migrations_dir: &Path,
    order: ApplyOrder,
) -> Result<Vec<MigrationFile>, MigrationError> {
    let entries = fs::read_dir(migrations_dir)
        .map_err(|e| MigrationError::io("Error reading migrations directory", migrations_dir, e))?;

    let mut migrations = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| MigrationError::io("Error reading migrations directory", migrations_dir, e))?;
        let path = entry.path();

        let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            log::warn!("Skipping migration with non UTF-8 name: {}", path.display());
            continue;
        };
        if !path.is_file() || !filename.ends_with(MIGRATION_SUFFIX) {
            log::debug!("Skipping {}: not a {} file", path.display(), MIGRATION_SUFFIX);
            continue;
        }

        migrations.push(MigrationFile {
            path,
            filename,
            created_at: None,
        });
    }

    match order {
        ApplyOrder::Filename => migrations.sort_by(|a, b| a.filename.cmp(&b.filename)),
        ApplyOrder::CreatedAt => {
            for migration in &mut migrations {
                migration.created_at = parse_created_at(&migration.read_sql()?);
            }
            migrations.sort_by(|a, b| {
                (a.created_at.is_none(), a.created_at, &a.filename)
                    .cmp(&(b.created_at.is_none(), b.created_at, &b.filename))
            });
        }
    }

    Ok(migrations)
}
