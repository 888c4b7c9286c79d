use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as _, Row as _, ValueRef as _};

use schemaward_core::{Result, Row, SqlValue, Statement};

use crate::adapter::Engine;

pub mod mapper;
pub mod queries;

/// Engine backed by a MySQL/MariaDB connection pool.
#[derive(Debug, Clone)]
pub struct MySqlEngine {
    pool: MySqlPool,
}

impl MySqlEngine {
    /// Create a new engine using a pre-configured pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Connect a pool with the given limits.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(schemaward_core::Error::engine)?;
        Ok(Self::new(pool))
    }
}

#[async_trait::async_trait]
impl Engine for MySqlEngine {
    fn engine(&self) -> &'static str {
        "mysql"
    }

    #[tracing::instrument(skip_all, fields(sql = %statement))]
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        let (sql, values) = statement.render_identifiers()?;
        let mut query = sqlx::query(&sql);
        for value in values {
            query = match value {
                SqlValue::Null => query.bind(Option::<String>::None),
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::UInt(v) => query.bind(*v),
                SqlValue::Float(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
                SqlValue::Bytes(v) => query.bind(v.clone()),
            };
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(schemaward_core::Error::engine)?;
        Ok(rows.iter().map(decode_row).collect())
    }

    /// DDL does not accept parameter markers, so values are inlined as
    /// escaped literals. The statement still goes through the prepared
    /// protocol, which runs exactly one statement.
    #[tracing::instrument(skip_all, fields(sql = %statement))]
    async fn execute(&self, statement: &Statement) -> Result<u64> {
        let sql = statement.render_inline(escape_literal)?;
        ensure_single_statement(&sql)?;
        let result = sqlx::query(&sql)
            .persistent(false)
            .execute(&self.pool)
            .await
            .map_err(schemaward_core::Error::engine)?;
        Ok(result.rows_affected())
    }
}

/// Format a value as a MySQL literal.
pub fn escape_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Int(v) => v.to_string(),
        SqlValue::UInt(v) => v.to_string(),
        SqlValue::Float(v) => v.to_string(),
        SqlValue::Text(text) => escape_string(text),
        SqlValue::Bytes(bytes) => escape_string(&String::from_utf8_lossy(bytes)),
    }
}

/// Quote `text` as a string literal.
///
/// Quotes are doubled rather than backslash-escaped so the literal ends in
/// the same place whether or not `NO_BACKSLASH_ESCAPES` is set. Backslashes
/// are doubled for the default mode; with the flag set they stay two
/// characters, which changes the value but never the statement.
pub fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// Reject rendered SQL carrying a `;` outside quoted literals and identifiers.
pub fn ensure_single_statement(sql: &str) -> Result<()> {
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (None, '\'' | '`') => quote = Some(ch),
            (None, ';') => {
                return Err(schemaward_core::Error::engine(
                    "refusing to run more than one statement",
                ));
            }
            (Some(open), _) if ch == open => {
                if chars.peek() == Some(&open) {
                    chars.next();
                } else {
                    quote = None;
                }
            }
            (Some('\''), '\\') => {
                chars.next();
            }
            _ => {}
        }
    }
    Ok(())
}

fn decode_row(row: &MySqlRow) -> Row {
    let columns = row
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();
    let values = (0..row.len()).map(|index| decode_value(row, index)).collect();
    Row::new(columns, values)
}

fn decode_value(row: &MySqlRow, index: usize) -> SqlValue {
    match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => {}
        _ => return SqlValue::Null,
    }

    if let Ok(value) = row.try_get::<i64, _>(index) {
        return SqlValue::Int(value);
    }
    if let Ok(value) = row.try_get::<u64, _>(index) {
        return SqlValue::UInt(value);
    }
    if let Ok(value) = row.try_get::<f64, _>(index) {
        return SqlValue::Float(value);
    }
    if let Ok(value) = row.try_get::<NaiveDateTime, _>(index) {
        return SqlValue::Text(value.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(value) = row.try_get::<NaiveDate, _>(index) {
        return SqlValue::Text(value.format("%Y-%m-%d").to_string());
    }
    if let Ok(value) = row.try_get::<NaiveTime, _>(index) {
        return SqlValue::Text(value.format("%H:%M:%S").to_string());
    }
    if let Ok(value) = row.try_get::<String, _>(index) {
        return SqlValue::Text(value);
    }
    if let Ok(value) = row.try_get::<Vec<u8>, _>(index) {
        return SqlValue::Bytes(value);
    }
    // DECIMAL and friends arrive as text on both protocols.
    if let Ok(value) = row.try_get_unchecked::<String, _>(index) {
        return SqlValue::Text(value);
    }

    tracing::warn!(event = "value_not_decoded", column = index);
    SqlValue::Null
}
