//! Migration name parsing: `<action>_<table>`.

use std::fmt;
use thiserror::Error;

/// Actions the generator knows how to turn into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create,
    Alter,
    Drop,
    Rename,
    DropColumn,
    RenameColumn,
    Modify,
    AddIndex,
    DropIndex,
    /// Anything else; the generator emits a placeholder comment for it.
    Unsupported(String),
}

/// Compound actions contain the separator themselves, so they are matched as
/// prefixes before falling back to a split on the first `_`.
const COMPOUND_ACTIONS: [(&str, Action); 4] = [
    ("drop_column", Action::DropColumn),
    ("rename_column", Action::RenameColumn),
    ("add_index", Action::AddIndex),
    ("drop_index", Action::DropIndex),
];

impl Action {
    /// Map a lower-cased keyword to an action; inverse of [`Action::as_str`].
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "create" => Action::Create,
            "alter" => Action::Alter,
            "drop" => Action::Drop,
            "rename" => Action::Rename,
            "modify" => Action::Modify,
            "drop_column" => Action::DropColumn,
            "rename_column" => Action::RenameColumn,
            "add_index" => Action::AddIndex,
            "drop_index" => Action::DropIndex,
            other => Action::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Create => "create",
            Action::Alter => "alter",
            Action::Drop => "drop",
            Action::Rename => "rename",
            Action::DropColumn => "drop_column",
            Action::RenameColumn => "rename_column",
            Action::Modify => "modify",
            Action::AddIndex => "add_index",
            Action::DropIndex => "drop_index",
            Action::Unsupported(keyword) => keyword,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A migration name split into its action and target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub action: Action,
    pub table: String,
}

/// Malformed generator input. Never fatal: the generator turns it into a comment-only file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("migration name '{0}' has no '_' between action and table name")]
    MissingSeparator(String),
    #[error("migration name '{0}' has an empty action or table name")]
    EmptyPart(String),
}

/// Split a migration name into action and table.
///
/// The action is compared case-insensitively; the table keeps its original spelling
/// and may itself contain underscores (`create_user_roles` targets `user_roles`).
pub fn parse_migration_name(name: &str) -> Result<ParsedName, FormatError> {
    let lowered = name.to_ascii_lowercase();
    for (keyword, action) in &COMPOUND_ACTIONS {
        let prefix_len = keyword.len() + 1;
        if lowered.starts_with(keyword) && lowered[keyword.len()..].starts_with('_') {
            let table = &name[prefix_len..];
            if table.is_empty() {
                return Err(FormatError::EmptyPart(name.to_string()));
            }
            return Ok(ParsedName {
                action: action.clone(),
                table: table.to_string(),
            });
        }
    }

    let (action, table) = name
        .split_once('_')
        .ok_or_else(|| FormatError::MissingSeparator(name.to_string()))?;
    if action.is_empty() || table.is_empty() {
        return Err(FormatError::EmptyPart(name.to_string()));
    }

    Ok(ParsedName {
        action: Action::from_keyword(&action.to_ascii_lowercase()),
        table: table.to_string(),
    })
}
