//! Parameterized statements handed to the engine.
//!
//! A statement is a template plus an ordered parameter list. In the template
//! `??` marks an identifier and `?` marks a literal value. Only validated
//! fragments (types, keywords, referential actions) are written into the
//! template itself.

use std::fmt;

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::error::{Error, Result};
use crate::validation::{DefaultValue, validate_name};

/// A sanitized identifier matching `^[A-Za-z_][A-Za-z0-9_]*$`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Sanitize `raw` and validate the result.
    pub fn parse(raw: &str) -> Result<Self> {
        validate_name(raw).map(Identifier)
    }

    /// Accept `raw` only if sanitizing leaves it unchanged.
    ///
    /// Used for names read back from the catalog, which must be addressed as-is.
    pub fn exact(raw: &str) -> Result<Self> {
        let ident = Self::parse(raw)?;
        if ident.0 != raw {
            return Err(Error::invalid_name(raw));
        }
        Ok(ident)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Back-tick quoted form.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A literal value bound to a statement or read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(text) => Some(text),
            SqlValue::Bytes(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(value) => Some(*value),
            SqlValue::UInt(value) => i64::try_from(*value).ok(),
            SqlValue::Text(_) | SqlValue::Bytes(_) => self.as_str()?.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            SqlValue::UInt(value) => Some(*value),
            SqlValue::Int(value) => u64::try_from(*value).ok(),
            SqlValue::Text(_) | SqlValue::Bytes(_) => self.as_str()?.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&Identifier> for SqlValue {
    fn from(value: &Identifier) -> Self {
        SqlValue::Text(value.as_str().to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<u64> for SqlValue {
    fn from(value: u64) -> Self {
        SqlValue::UInt(value)
    }
}

impl Serialize for SqlValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null => serializer.serialize_none(),
            SqlValue::Int(value) => serializer.serialize_i64(*value),
            SqlValue::UInt(value) => serializer.serialize_u64(*value),
            SqlValue::Float(value) => serializer.serialize_f64(*value),
            SqlValue::Text(text) => serializer.serialize_str(text),
            SqlValue::Bytes(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

/// One result row, keeping the engine's column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, SqlValue)>,
        K: Into<String>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .unzip();
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Look a value up by column name, ignoring ASCII case.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|name| name.eq_ignore_ascii_case(column))
            .and_then(|index| self.values.get(index))
    }

    pub fn opt_str(&self, column: &str) -> Option<String> {
        self.get(column).and_then(SqlValue::as_str).map(str::to_string)
    }

    pub fn try_str(&self, column: &str) -> Result<String> {
        self.opt_str(column)
            .ok_or_else(|| Error::engine(format!("catalog row is missing text column `{column}`")))
    }

    pub fn try_i64(&self, column: &str) -> Result<i64> {
        self.get(column)
            .and_then(SqlValue::as_i64)
            .ok_or_else(|| Error::engine(format!("catalog row is missing numeric column `{column}`")))
    }

    pub fn try_u64(&self, column: &str) -> Result<u64> {
        self.get(column)
            .and_then(SqlValue::as_u64)
            .ok_or_else(|| Error::engine(format!("catalog row is missing numeric column `{column}`")))
    }
}

impl Serialize for Row {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// A statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Ident(Identifier),
    Value(SqlValue),
}

/// Statement template plus the parameters filling its placeholders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    sql: String,
    params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind the next `??` placeholder of the template.
    pub fn ident(mut self, ident: &Identifier) -> Self {
        self.params.push(Param::Ident(ident.clone()));
        self
    }

    /// Bind the next `?` placeholder of the template.
    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(Param::Value(value.into()));
        self
    }

    /// Append a validated SQL fragment. Never pass caller-provided text here.
    pub fn push_sql(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    pub fn push_ident(&mut self, ident: &Identifier) -> &mut Self {
        self.sql.push_str("??");
        self.params.push(Param::Ident(ident.clone()));
        self
    }

    /// Append a comma separated identifier list.
    pub fn push_ident_list(&mut self, idents: &[Identifier]) -> &mut Self {
        for (position, ident) in idents.iter().enumerate() {
            if position > 0 {
                self.sql.push_str(", ");
            }
            self.push_ident(ident);
        }
        self
    }

    pub fn push_value(&mut self, value: impl Into<SqlValue>) -> &mut Self {
        self.sql.push('?');
        self.params.push(Param::Value(value.into()));
        self
    }

    pub fn push_default(&mut self, default: &DefaultValue) -> &mut Self {
        match default {
            DefaultValue::Null => self.push_sql("NULL"),
            DefaultValue::Keyword(keyword) => self.push_sql(keyword),
            DefaultValue::Numeric(number) => self.push_sql(number),
            DefaultValue::Literal(text) => self.push_value(text.as_str()),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Identifier parameters in template order.
    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.params.iter().filter_map(|param| match param {
            Param::Ident(ident) => Some(ident),
            Param::Value(_) => None,
        })
    }

    /// Replace `??` with quoted identifiers, keep `?` for values.
    ///
    /// Returns the SQL and the values to bind, in order.
    pub fn render_identifiers(&self) -> Result<(String, Vec<&SqlValue>)> {
        let mut values = Vec::new();
        let sql = self.render_with(|value| {
            values.push(value);
            "?".to_string()
        })?;
        Ok((sql, values))
    }

    /// Replace every placeholder, formatting values with `literal`.
    pub fn render_inline(&self, literal: impl Fn(&SqlValue) -> String) -> Result<String> {
        self.render_with(|value| literal(value))
    }

    fn render_with<'a>(&'a self, mut on_value: impl FnMut(&'a SqlValue) -> String) -> Result<String> {
        let mut out = String::with_capacity(self.sql.len() + 16);
        let mut params = self.params.iter();
        let mut chars = self.sql.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch != '?' {
                out.push(ch);
                continue;
            }
            let wants_ident = chars.peek() == Some(&'?');
            if wants_ident {
                chars.next();
            }
            match (wants_ident, params.next()) {
                (true, Some(Param::Ident(ident))) => out.push_str(&ident.quoted()),
                (false, Some(Param::Value(value))) => out.push_str(&on_value(value)),
                _ => return Err(mismatch(&self.sql)),
            }
        }

        if params.next().is_some() {
            return Err(mismatch(&self.sql));
        }
        Ok(out)
    }
}

fn mismatch(sql: &str) -> Error {
    Error::engine(format!("statement parameters do not match template: {sql}"))
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render_identifiers() {
            Ok((sql, _)) => f.write_str(&sql),
            Err(_) => f.write_str(&self.sql),
        }
    }
}
