//! Identifier sanitizing, column type allow-listing and default escaping.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Longest identifier the engine accepts.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Column types accepted by `validate_type`, without length or precision.
pub const ALLOWED_TYPES: &[&str] = &[
    "TINYINT",
    "SMALLINT",
    "MEDIUMINT",
    "INT",
    "BIGINT",
    "DECIMAL",
    "FLOAT",
    "DOUBLE",
    "BIT",
    "BOOLEAN",
    "CHAR",
    "VARCHAR",
    "BINARY",
    "VARBINARY",
    "TINYTEXT",
    "TEXT",
    "MEDIUMTEXT",
    "LONGTEXT",
    "TINYBLOB",
    "BLOB",
    "MEDIUMBLOB",
    "LONGBLOB",
    "DATE",
    "DATETIME",
    "TIMESTAMP",
    "TIME",
    "YEAR",
    "JSON",
];

/// SQL keywords accepted verbatim as column defaults.
const DEFAULT_KEYWORDS: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "CURRENT_TIMESTAMP()",
    "NOW()",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "NULL",
];

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern"));

static NUMERIC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("valid numeric pattern"));

static TYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]+)\s*(?:\(\s*([0-9]+)?[^)]*\))?$").expect("valid type pattern")
});

/// Strip every character outside `[A-Za-z0-9_]`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect()
}

/// Sanitize `raw` and check the result against the identifier pattern.
///
/// A name that sanitizes to nothing is rejected rather than passed on empty.
pub fn validate_name(raw: &str) -> Result<String> {
    let cleaned = sanitize(raw);
    if cleaned.is_empty() || cleaned.len() > MAX_IDENTIFIER_LEN || !NAME_PATTERN.is_match(&cleaned)
    {
        return Err(Error::invalid_name(raw));
    }
    Ok(cleaned)
}

/// How a base type treats its length argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LengthRule {
    /// Length is mandatory; the value is used when none is given.
    Required(i64),
    /// Length is appended only when explicitly positive.
    Optional,
    /// A positive precision is emitted with a fixed scale of 2.
    Precision,
    /// The type never carries a length.
    None,
}

fn length_rule(base: &str) -> LengthRule {
    match base {
        "CHAR" | "BINARY" => LengthRule::Required(1),
        "VARCHAR" | "VARBINARY" => LengthRule::Required(255),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => LengthRule::Optional,
        "DECIMAL" | "FLOAT" | "DOUBLE" => LengthRule::Precision,
        _ => LengthRule::None,
    }
}

/// A column type that passed the allow-list, normalized to its DDL spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnType(String);

impl ColumnType {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The type without any length or precision suffix.
    pub fn base(&self) -> &str {
        self.0.split('(').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate `raw` against the allow-list and apply the per-type length rules.
///
/// A length written inline (`varchar(100)`) counts as given when `length` is
/// absent.
pub fn validate_type(raw: &str, length: Option<i64>) -> Result<ColumnType> {
    let upper = raw.trim().to_ascii_uppercase();
    let invalid = || Error::InvalidType {
        column_type: raw.to_string(),
    };

    let captures = TYPE_PATTERN.captures(&upper).ok_or_else(invalid)?;
    let base = captures.get(1).map(|m| m.as_str()).ok_or_else(invalid)?;
    if !ALLOWED_TYPES.contains(&base) {
        return Err(invalid());
    }

    let inline = captures
        .get(2)
        .and_then(|m| m.as_str().parse::<i64>().ok());
    let length = length.or(inline).filter(|value| *value > 0);

    let normalized = match length_rule(base) {
        LengthRule::Required(fallback) => format!("{base}({})", length.unwrap_or(fallback)),
        LengthRule::Optional => match length {
            Some(value) => format!("{base}({value})"),
            None => base.to_string(),
        },
        LengthRule::Precision => match length {
            Some(precision) => format!("{base}({precision},2)"),
            None => base.to_string(),
        },
        LengthRule::None => base.to_string(),
    };

    Ok(ColumnType(normalized))
}

/// A column default ready to be placed in a DDL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    Null,
    /// Whitelisted SQL keyword, uppercased.
    Keyword(&'static str),
    /// Numeric literal emitted verbatim.
    Numeric(String),
    /// Text that the engine escapes as a quoted string literal.
    Literal(String),
}

/// Classify a caller-supplied default value.
pub fn escape_default(value: &Value) -> DefaultValue {
    match value {
        Value::Null => DefaultValue::Null,
        Value::Bool(flag) => DefaultValue::Numeric(if *flag { "1" } else { "0" }.to_string()),
        Value::Number(number) => DefaultValue::Numeric(number.to_string()),
        Value::String(text) => escape_default_text(text),
        other => DefaultValue::Literal(other.to_string()),
    }
}

fn escape_default_text(text: &str) -> DefaultValue {
    let trimmed = text.trim();
    let upper = trimmed.to_ascii_uppercase();
    if let Some(keyword) = DEFAULT_KEYWORDS.iter().find(|keyword| **keyword == upper) {
        return if *keyword == "NULL" {
            DefaultValue::Null
        } else {
            DefaultValue::Keyword(keyword)
        };
    }
    if NUMERIC_PATTERN.is_match(trimmed) {
        return DefaultValue::Numeric(trimmed.to_string());
    }
    DefaultValue::Literal(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_keeps_only_identifier_characters() {
        assert_eq!(sanitize("wp_users; DROP TABLE x"), "wp_usersDROPTABLEx");
        assert_eq!(sanitize("`order`"), "order");
        assert_eq!(sanitize("naïve-name"), "navename");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["a b c", "__x__", "1-2-3", "", "ünï", "tbl`--"] {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once);
            assert!(once.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_'));
        }
    }

    #[test]
    fn validate_name_fails_closed_on_empty_result() {
        assert!(matches!(validate_name("--;"), Err(Error::InvalidName { .. })));
        assert!(matches!(validate_name(""), Err(Error::InvalidName { .. })));
    }

    #[test]
    fn validate_name_rejects_leading_digit_and_overlong_names() {
        assert!(validate_name("1users").is_err());
        assert!(validate_name(&"a".repeat(MAX_IDENTIFIER_LEN + 1)).is_err());
        assert_eq!(validate_name("user-email").unwrap(), "useremail");
    }

    #[test]
    fn validate_type_applies_length_rules() {
        assert_eq!(validate_type("varchar", None).unwrap().as_str(), "VARCHAR(255)");
        assert_eq!(validate_type("char", None).unwrap().as_str(), "CHAR(1)");
        assert_eq!(validate_type("binary", Some(0)).unwrap().as_str(), "BINARY(1)");
        assert_eq!(validate_type("int", Some(11)).unwrap().as_str(), "INT(11)");
        assert_eq!(validate_type("int", None).unwrap().as_str(), "INT");
        assert_eq!(validate_type("bigint", Some(-3)).unwrap().as_str(), "BIGINT");
        assert_eq!(validate_type("decimal", Some(10)).unwrap().as_str(), "DECIMAL(10,2)");
        assert_eq!(validate_type("double", None).unwrap().as_str(), "DOUBLE");
        assert_eq!(validate_type("text", Some(40)).unwrap().as_str(), "TEXT");
    }

    #[test]
    fn validate_type_reads_inline_length() {
        assert_eq!(validate_type("varchar(100)", None).unwrap().as_str(), "VARCHAR(100)");
        assert_eq!(validate_type("VARCHAR(100)", Some(20)).unwrap().as_str(), "VARCHAR(20)");
        assert_eq!(validate_type("decimal(8,4)", None).unwrap().as_str(), "DECIMAL(8,2)");
    }

    #[test]
    fn validate_type_rejects_unknown_types() {
        assert!(matches!(
            validate_type("bogus", None),
            Err(Error::InvalidType { column_type }) if column_type == "bogus"
        ));
        assert!(validate_type("int unsigned", None).is_err());
        assert!(validate_type("text); DROP TABLE x; --", None).is_err());
    }

    #[test]
    fn column_type_exposes_base() {
        assert_eq!(validate_type("varchar", Some(32)).unwrap().base(), "VARCHAR");
    }

    #[test]
    fn escape_default_classifies_values() {
        assert_eq!(escape_default(&Value::Null), DefaultValue::Null);
        assert_eq!(escape_default(&json!(true)), DefaultValue::Numeric("1".into()));
        assert_eq!(escape_default(&json!(false)), DefaultValue::Numeric("0".into()));
        assert_eq!(escape_default(&json!(42)), DefaultValue::Numeric("42".into()));
        assert_eq!(escape_default(&json!("3.5")), DefaultValue::Numeric("3.5".into()));
        assert_eq!(
            escape_default(&json!("current_timestamp")),
            DefaultValue::Keyword("CURRENT_TIMESTAMP")
        );
        assert_eq!(escape_default(&json!("now()")), DefaultValue::Keyword("NOW()"));
        assert_eq!(escape_default(&json!("null")), DefaultValue::Null);
        assert_eq!(
            escape_default(&json!("it's")),
            DefaultValue::Literal("it's".into())
        );
    }
}
