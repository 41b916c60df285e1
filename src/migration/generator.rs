//! SQL generation from a migration name and column arguments.
//!
//! `generate_sql()` never fails. Input it cannot use is reported two ways: as `--`
//! comments in the generated text, and as [`Diagnostic`]s returned next to it. When the
//! name or the argument shape is wrong the whole file is comments explaining the
//! expected format, so a reviewer sees the problem instead of a crash.
//!
//! | name                    | arguments               | statement                                   |
//! |-------------------------|-------------------------|---------------------------------------------|
//! | `create_<t>`            | `col:type`...           | `CREATE TABLE <t> (id SERIAL PRIMARY KEY, ...)` |
//! | `alter_<t>`             | `col:type`...           | `ALTER TABLE <t> ADD COLUMN ...`            |
//! | `drop_<t>`              |                         | `DROP TABLE <t>;`                           |
//! | `rename_<t>`            | `new_name`              | `ALTER TABLE <t> RENAME TO <new>;`          |
//! | `drop_column_<t>`       | `col`...                | `ALTER TABLE <t> DROP COLUMN ...`           |
//! | `rename_column_<t>`     | `old:new`               | `ALTER TABLE <t> RENAME COLUMN <old> TO <new>;` |
//! | `modify_<t>`            | `col:type`...           | `ALTER TABLE <t> ALTER COLUMN <c> TYPE ...` |
//! | `add_index_<t>`         | `index_name column`     | `CREATE INDEX <idx> ON <t> (<col>);`        |
//! | `drop_index_<t>`        | `index_name`            | `DROP INDEX <idx>;`                         |

use super::identifier::{is_valid_identifier, is_valid_type_expression};
use super::naming::{parse_migration_name, Action};
use std::fmt;

/// One piece of generator input that was not used as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The raw argument (or migration name) the message is about
    pub input: String,
    pub reason: String,
}

impl Diagnostic {
    fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.input, self.reason)
    }
}

/// Generated migration text plus everything the generator had to skip or reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSql {
    pub sql: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratedSql {
    /// `true` when the text holds no statement, only `--` comments.
    pub fn is_comment_only(&self) -> bool {
        self.sql
            .lines()
            .map(str::trim)
            .all(|line| line.is_empty() || line.starts_with("--"))
    }
}

/// Comment lines explaining why no statement was produced.
type Rejection = Vec<String>;

/// Generate the SQL text for a migration.
///
/// # Example
///
/// ```
/// use gomig::migration::generate_sql;
///
/// let generated = generate_sql("rename_users", &["clients"], "20240120120000");
/// assert!(generated.sql.contains("ALTER TABLE users RENAME TO clients;"));
/// assert!(generated.diagnostics.is_empty());
/// ```
pub fn generate_sql<S: AsRef<str>>(name: &str, columns: &[S], timestamp: &str) -> GeneratedSql {
    let args: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();

    let parsed = match parse_migration_name(name) {
        Ok(parsed) => parsed,
        Err(e) => {
            return rejected(
                vec![
                    format!("Invalid migration name format: {name}"),
                    "Expected format: <action>_<table_name>".to_string(),
                ],
                vec![Diagnostic::new(name, e.to_string())],
            );
        }
    };

    if let Action::Unsupported(keyword) = &parsed.action {
        if !is_valid_identifier(keyword) {
            return rejected(
                vec![
                    format!("Invalid migration name format: {name}"),
                    "Expected format: <action>_<table_name>".to_string(),
                ],
                vec![Diagnostic::new(name, "invalid action keyword")],
            );
        }
    }

    if !is_valid_identifier(&parsed.table) {
        return rejected(
            vec![
                format!("Invalid table name: {}", parsed.table),
                "Table names may only contain letters, digits and underscores".to_string(),
            ],
            vec![Diagnostic::new(&parsed.table, "invalid table name")],
        );
    }

    let mut diagnostics = Vec::new();
    let table = parsed.table.as_str();
    let statement = match &parsed.action {
        Action::Create => Ok(create_table(table, &args, &mut diagnostics)),
        Action::Alter => alter_columns(name, table, &args, "ADD COLUMN", " ", &mut diagnostics),
        Action::Modify => alter_columns(name, table, &args, "ALTER COLUMN", " TYPE ", &mut diagnostics),
        Action::Drop => {
            for extra in &args {
                diagnostics.push(Diagnostic::new(*extra, "drop takes no arguments; ignored"));
            }
            Ok(format!("DROP TABLE {table};"))
        }
        Action::Rename => rename_table(name, table, &args),
        Action::DropColumn => drop_columns(name, table, &args, &mut diagnostics),
        Action::RenameColumn => rename_column(name, table, &args),
        Action::AddIndex => add_index(name, table, &args),
        Action::DropIndex => drop_index(name, &args),
        Action::Unsupported(keyword) => {
            diagnostics.push(Diagnostic::new(name, format!("unsupported action '{keyword}'")));
            Ok(comment_line(&format!("Unsupported action: {keyword}")).trim_end().to_string())
        }
    };

    match statement {
        Ok(statement) => {
            let mut sql = comment_line(&format!("Migration: {name}"));
            sql.push_str(&comment_line(&format!("Created at: {timestamp}")));
            sql.push_str(&format!("\n{statement}\n"));
            for diagnostic in &diagnostics {
                sql.push_str(&comment_line(&format!("Skipped {diagnostic}")));
            }
            GeneratedSql { sql, diagnostics }
        }
        Err(lines) => {
            let reason = lines.first().cloned().unwrap_or_default();
            diagnostics.push(Diagnostic::new(name, reason));
            rejected(lines, diagnostics)
        }
    }
}

fn rejected(lines: Rejection, diagnostics: Vec<Diagnostic>) -> GeneratedSql {
    let sql = lines.iter().map(|line| comment_line(line)).collect();
    GeneratedSql { sql, diagnostics }
}

/// Raw user input is echoed into comments; a line break would end the comment.
fn comment_line(text: &str) -> String {
    format!("-- {}\n", text.replace(['\n', '\r'], " "))
}

/// Split `name:type`, checking both halves against the allow-lists.
fn parse_descriptor(raw: &str) -> Result<(&str, &str), &'static str> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [column, column_type] = parts.as_slice() else {
        return Err("expected <column_name>:<type>");
    };
    if !is_valid_identifier(column) {
        return Err("invalid column name");
    }
    if !is_valid_type_expression(column_type) {
        return Err("invalid column type");
    }
    Ok((*column, *column_type))
}

/// Well-formed descriptors in input order; the rest become diagnostics.
fn usable_descriptors<'a>(args: &[&'a str], diagnostics: &mut Vec<Diagnostic>) -> Vec<(&'a str, &'a str)> {
    args.iter()
        .filter_map(|raw| match parse_descriptor(*raw) {
            Ok(pair) => Some(pair),
            Err(reason) => {
                diagnostics.push(Diagnostic::new(*raw, reason));
                None
            }
        })
        .collect()
}

fn create_table(table: &str, args: &[&str], diagnostics: &mut Vec<Diagnostic>) -> String {
    let mut lines = vec!["    id SERIAL PRIMARY KEY".to_string()];
    lines.extend(
        usable_descriptors(args, diagnostics)
            .into_iter()
            .map(|(column, column_type)| format!("    {column} {column_type}")),
    );
    lines.push("    created_at TIMESTAMPTZ DEFAULT NOW()".to_string());
    lines.push("    updated_at TIMESTAMPTZ DEFAULT NOW()".to_string());
    format!("CREATE TABLE {table} (\n{}\n);", lines.join(",\n"))
}

fn alter_columns(
    name: &str,
    table: &str,
    args: &[&str],
    clause: &str,
    separator: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<String, Rejection> {
    let clauses: Vec<String> = usable_descriptors(args, diagnostics)
        .into_iter()
        .map(|(column, column_type)| format!("    {clause} {column}{separator}{column_type}"))
        .collect();
    if clauses.is_empty() {
        return Err(vec![
            format!("No valid column descriptors for migration: {name}"),
            "Expected format: <column_name>:<type> [<column_name>:<type> ...]".to_string(),
        ]);
    }
    Ok(format!("ALTER TABLE {table}\n{};", clauses.join(",\n")))
}

fn drop_columns(
    name: &str,
    table: &str,
    args: &[&str],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<String, Rejection> {
    let clauses: Vec<String> = args
        .iter()
        .filter_map(|column| {
            if is_valid_identifier(column) {
                Some(format!("    DROP COLUMN {column}"))
            } else {
                diagnostics.push(Diagnostic::new(*column, "invalid column name"));
                None
            }
        })
        .collect();
    if clauses.is_empty() {
        return Err(vec![
            format!("Invalid migration name format for drop_column: {name}"),
            "Expected format: drop_column_<table_name> <column_name> [<column_name> ...]".to_string(),
        ]);
    }
    Ok(format!("ALTER TABLE {table}\n{};", clauses.join(",\n")))
}

fn rename_table(name: &str, table: &str, args: &[&str]) -> Result<String, Rejection> {
    let [new_name] = args else {
        return Err(vec![
            format!("Invalid migration name format for rename: {name}"),
            "Expected format: rename_<old_table_name> <new_table_name>".to_string(),
        ]);
    };
    if !is_valid_identifier(new_name) {
        return Err(vec![
            format!("Invalid table name: {new_name}"),
            "Table names may only contain letters, digits and underscores".to_string(),
        ]);
    }
    Ok(format!("ALTER TABLE {table} RENAME TO {new_name};"))
}

fn rename_column(name: &str, table: &str, args: &[&str]) -> Result<String, Rejection> {
    let [pair] = args else {
        return Err(vec![
            format!("Invalid migration name format for rename_column: {name}"),
            "Expected format: rename_column_<table_name> <old_column_name>:<new_column_name>".to_string(),
        ]);
    };
    match pair.split(':').collect::<Vec<_>>().as_slice() {
        [old, new] if is_valid_identifier(old) && is_valid_identifier(new) => {
            Ok(format!("ALTER TABLE {table} RENAME COLUMN {old} TO {new};"))
        }
        _ => Err(vec![
            format!("Invalid column rename format: {pair}"),
            "Expected format: <old_column_name>:<new_column_name>".to_string(),
        ]),
    }
}

fn add_index(name: &str, table: &str, args: &[&str]) -> Result<String, Rejection> {
    let [index, column] = args else {
        return Err(vec![
            format!("Invalid migration name format for add_index: {name}"),
            "Expected format: add_index_<table_name> <index_name> <column_name>".to_string(),
        ]);
    };
    if !is_valid_identifier(index) || !is_valid_identifier(column) {
        return Err(vec![
            format!("Invalid index or column name: {index} {column}"),
            "Names may only contain letters, digits and underscores".to_string(),
        ]);
    }
    Ok(format!("CREATE INDEX {index} ON {table} ({column});"))
}

fn drop_index(name: &str, args: &[&str]) -> Result<String, Rejection> {
    let [index] = args else {
        return Err(vec![
            format!("Invalid migration name format for drop_index: {name}"),
            "Expected format: drop_index_<table_name> <index_name>".to_string(),
        ]);
    };
    if !is_valid_identifier(index) {
        return Err(vec![
            format!("Invalid index name: {index}"),
            "Names may only contain letters, digits and underscores".to_string(),
        ]);
    }
    Ok(format!("DROP INDEX {index};"))
}
