//! Catalog queries for the MySQL dialect family.
//!
//! Every query binds table and column names as values; the only identifier
//! placeholders are the tables counted or previewed directly.

use schemaward_core::{Identifier, Result, Row, Statement};

use crate::adapter::Engine;

pub const LIST_TABLES: &str = "SELECT t.TABLE_NAME AS name, COUNT(c.COLUMN_NAME) AS column_count \
     FROM information_schema.TABLES t \
     LEFT JOIN information_schema.COLUMNS c \
       ON c.TABLE_SCHEMA = t.TABLE_SCHEMA AND c.TABLE_NAME = t.TABLE_NAME \
     WHERE t.TABLE_SCHEMA = DATABASE() AND t.TABLE_TYPE = 'BASE TABLE' \
     GROUP BY t.TABLE_NAME \
     ORDER BY t.TABLE_NAME";

pub const TABLE_EXISTS: &str = "SELECT COUNT(*) AS total FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' AND TABLE_NAME = ?";

pub const LIST_COLUMNS: &str = "SELECT COLUMN_NAME AS name, COLUMN_TYPE AS column_type, \
       IS_NULLABLE AS is_nullable, COLUMN_DEFAULT AS column_default, \
       EXTRA AS extra, COLUMN_KEY AS column_key \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
     ORDER BY ORDINAL_POSITION";

pub const COLUMN_EXISTS: &str = "SELECT COUNT(*) AS total FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND COLUMN_NAME = ?";

pub const COLUMN_COUNT: &str = "SELECT COUNT(*) AS total FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?";

pub const LIST_INDEXES: &str = "SELECT INDEX_NAME AS name, NON_UNIQUE AS non_unique, \
       COLUMN_NAME AS column_name, SEQ_IN_INDEX AS sequence, INDEX_TYPE AS index_type \
     FROM information_schema.STATISTICS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
     ORDER BY INDEX_NAME, SEQ_IN_INDEX";

pub const LIST_FOREIGN_KEYS: &str = "SELECT CONSTRAINT_NAME AS name, COLUMN_NAME AS column_name, \
       REFERENCED_TABLE_NAME AS referenced_table, REFERENCED_COLUMN_NAME AS referenced_column \
     FROM information_schema.KEY_COLUMN_USAGE \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND REFERENCED_TABLE_NAME IS NOT NULL \
     ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION";

pub const LIST_REFERENTIAL_RULES: &str = "SELECT CONSTRAINT_NAME AS name, \
       UPDATE_RULE AS update_rule, DELETE_RULE AS delete_rule \
     FROM information_schema.REFERENTIAL_CONSTRAINTS \
     WHERE CONSTRAINT_SCHEMA = DATABASE() AND TABLE_NAME = ?";

pub const ROW_COUNT: &str = "SELECT COUNT(*) AS total FROM ??";

pub const PREVIEW_ROWS: &str = "SELECT * FROM ?? LIMIT ? OFFSET ?";

pub struct RawTable {
    pub name: String,
    pub column_count: u64,
}

pub async fn list_tables(engine: &dyn Engine) -> Result<Vec<RawTable>> {
    let rows = engine.query(&Statement::new(LIST_TABLES)).await?;
    rows.iter()
        .map(|row| {
            Ok(RawTable {
                name: row.try_str("name")?,
                column_count: row.try_u64("column_count")?,
            })
        })
        .collect()
}

async fn count(engine: &dyn Engine, statement: Statement) -> Result<u64> {
    let rows = engine.query(&statement).await?;
    match rows.first() {
        Some(row) => row.try_u64("total"),
        None => Ok(0),
    }
}

pub async fn table_exists(engine: &dyn Engine, table: &Identifier) -> Result<bool> {
    Ok(count(engine, Statement::new(TABLE_EXISTS).bind(table)).await? > 0)
}

pub struct RawColumn {
    pub name: String,
    pub column_type: String,
    pub is_nullable: String,
    pub default: Option<String>,
    pub extra: String,
    pub column_key: String,
}

pub async fn list_columns(engine: &dyn Engine, table: &Identifier) -> Result<Vec<RawColumn>> {
    let rows = engine
        .query(&Statement::new(LIST_COLUMNS).bind(table))
        .await?;
    rows.iter()
        .map(|row| {
            Ok(RawColumn {
                name: row.try_str("name")?,
                column_type: row.try_str("column_type")?,
                is_nullable: row.opt_str("is_nullable").unwrap_or_default(),
                default: row.opt_str("column_default"),
                extra: row.opt_str("extra").unwrap_or_default(),
                column_key: row.opt_str("column_key").unwrap_or_default(),
            })
        })
        .collect()
}

pub async fn column_exists(
    engine: &dyn Engine,
    table: &Identifier,
    column: &Identifier,
) -> Result<bool> {
    let statement = Statement::new(COLUMN_EXISTS).bind(table).bind(column);
    Ok(count(engine, statement).await? > 0)
}

pub async fn column_count(engine: &dyn Engine, table: &Identifier) -> Result<u64> {
    count(engine, Statement::new(COLUMN_COUNT).bind(table)).await
}

pub struct RawIndexRow {
    pub name: String,
    pub non_unique: bool,
    pub column: String,
    pub sequence: u64,
    pub index_type: String,
}

pub async fn list_indexes(engine: &dyn Engine, table: &Identifier) -> Result<Vec<RawIndexRow>> {
    let rows = engine
        .query(&Statement::new(LIST_INDEXES).bind(table))
        .await?;
    rows.iter()
        .map(|row| {
            Ok(RawIndexRow {
                name: row.try_str("name")?,
                non_unique: row.try_i64("non_unique")? != 0,
                column: row.try_str("column_name")?,
                sequence: row.try_u64("sequence")?,
                index_type: row.opt_str("index_type").unwrap_or_default(),
            })
        })
        .collect()
}

pub struct RawForeignKey {
    pub name: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

pub async fn list_foreign_keys(
    engine: &dyn Engine,
    table: &Identifier,
) -> Result<Vec<RawForeignKey>> {
    let rows = engine
        .query(&Statement::new(LIST_FOREIGN_KEYS).bind(table))
        .await?;
    rows.iter()
        .map(|row| {
            Ok(RawForeignKey {
                name: row.try_str("name")?,
                column: row.try_str("column_name")?,
                referenced_table: row.try_str("referenced_table")?,
                referenced_column: row.try_str("referenced_column")?,
            })
        })
        .collect()
}

pub struct RawReferentialRule {
    pub name: String,
    pub update_rule: String,
    pub delete_rule: String,
}

pub async fn list_referential_rules(
    engine: &dyn Engine,
    table: &Identifier,
) -> Result<Vec<RawReferentialRule>> {
    let rows = engine
        .query(&Statement::new(LIST_REFERENTIAL_RULES).bind(table))
        .await?;
    rows.iter()
        .map(|row| {
            Ok(RawReferentialRule {
                name: row.try_str("name")?,
                update_rule: row.opt_str("update_rule").unwrap_or_default(),
                delete_rule: row.opt_str("delete_rule").unwrap_or_default(),
            })
        })
        .collect()
}

pub async fn row_count(engine: &dyn Engine, table: &Identifier) -> Result<u64> {
    count(engine, Statement::new(ROW_COUNT).ident(table)).await
}

pub async fn preview_rows(
    engine: &dyn Engine,
    table: &Identifier,
    limit: u64,
    offset: u64,
) -> Result<Vec<Row>> {
    let statement = Statement::new(PREVIEW_ROWS)
        .ident(table)
        .bind(limit)
        .bind(offset);
    engine.query(&statement).await
}
