//! `AppliedMigrationRecord` - Represents rows of the `gomig_migrations` bookkeeping table

use crate::executor::TextRow;
use crate::migration::MigrationError;
use chrono::{DateTime, NaiveDateTime, Utc};

/// One row of `gomig_migrations`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigrationRecord {
    /// Auto-increment id; reflects the order migrations were recorded in
    pub id: i64,

    /// File name of the applied migration
    pub version: String,

    /// When the migration was recorded
    pub applied_at: DateTime<Utc>,
}

impl AppliedMigrationRecord {
    /// Build a record from a text row
    ///
    /// Expected column order: `id`, `version`, `applied_at`, all selected as text.
    pub fn from_text_row(row: &TextRow) -> Result<Self, MigrationError> {
        let id = text_column(row, 0, "id")?;
        let id = id
            .parse::<i64>()
            .map_err(|e| MigrationError::InvalidRecord(format!("id '{id}': {e}")))?;
        let version = text_column(row, 1, "version")?.to_string();
        let applied_at = parse_timestamp(text_column(row, 2, "applied_at")?)?;

        Ok(Self {
            id,
            version,
            applied_at,
        })
    }
}

fn text_column<'r>(row: &'r TextRow, idx: usize, name: &str) -> Result<&'r str, MigrationError> {
    row.get(idx)
        .and_then(|value| value.as_deref())
        .ok_or_else(|| MigrationError::InvalidRecord(format!("missing {name} column")))
}

/// Parse PostgreSQL's text rendering of `TIMESTAMPTZ` (e.g. `2024-01-20 12:00:00.123456+00`).
///
/// Values without an offset are taken as UTC.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, MigrationError> {
    const WITH_OFFSET: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S%.f%#z",
        "%Y-%m-%d %H:%M:%S%#z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%:z",
    ];
    const WITHOUT_OFFSET: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ];

    for format in WITH_OFFSET {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }
    for format in WITHOUT_OFFSET {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(MigrationError::InvalidRecord(format!(
        "Failed to parse timestamp '{value}': unrecognized format"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(values: &[Option<&str>]) -> TextRow {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_from_text_row() {
        let record = AppliedMigrationRecord::from_text_row(&row(&[
            Some("7"),
            Some("0a1b2c3d4e_create_users.up.sql"),
            Some("2024-01-20 12:00:00.5+00"),
        ]))
        .unwrap();

        assert_eq!(record.id, 7);
        assert_eq!(record.version, "0a1b2c3d4e_create_users.up.sql");
        assert_eq!(
            record.applied_at,
            Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap() + chrono::Duration::milliseconds(500)
        );
    }

    #[test]
    fn test_timestamp_offsets_are_normalized() {
        let utc = parse_timestamp("2024-01-20 12:00:00+00").unwrap();
        let shifted = parse_timestamp("2024-01-20 14:00:00+02:00").unwrap();
        let naive = parse_timestamp("2024-01-20 12:00:00").unwrap();
        assert_eq!(utc, shifted);
        assert_eq!(utc, naive);
    }

    #[test]
    fn test_invalid_rows() {
        assert!(AppliedMigrationRecord::from_text_row(&row(&[Some("x"), Some("v"), Some("2024-01-20 12:00:00")])).is_err());
        assert!(AppliedMigrationRecord::from_text_row(&row(&[Some("1"), None, Some("2024-01-20 12:00:00")])).is_err());
        assert!(AppliedMigrationRecord::from_text_row(&row(&[Some("1"), Some("v")])).is_err());
        assert!(AppliedMigrationRecord::from_text_row(&row(&[Some("1"), Some("v"), Some("yesterday")])).is_err());
    }
}
