//! Allow-list checks applied before any name is interpolated into generated SQL.
//!
//! Generated statements are plain text, so nothing is quoted or escaped. Instead every
//! identifier must be a bare SQL word and every type expression is limited to the
//! characters real column types use (`varchar(200)`, `numeric(10, 2)`, `int[]`,
//! `timestamp with time zone`).

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

static TYPE_EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_ (),\[\]]*$").expect("valid type regex"));

/// `true` for table, column and index names that may be emitted verbatim.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// `true` for column type expressions that may be emitted verbatim.
pub fn is_valid_type_expression(expr: &str) -> bool {
    TYPE_EXPRESSION.is_match(expr)
}
