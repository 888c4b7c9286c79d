//! In-memory catalog engine for service tests.
//!
//! Answers the introspection queries from a table map and applies the DDL the
//! builders emit, so add-then-list round trips behave like a live server.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, Mutex};

use async_trait::async_trait;
use regex::Regex;
use schemaward_access::{AccessGate, Caller, MemorySettingsStore, Settings};
use schemaward_core::{Error, Param, Result, Row, SqlValue, Statement};
use schemaward_introspect::{Engine, queries};
use schemaward_service::{SchemaManager, ServiceConfig};

pub const DBA: &str = "dba@example.com";

pub fn dba() -> Caller {
    Caller::administrator(DBA)
}

/// Enabled, `DBA` whitelisted, nothing locked.
pub fn open_settings() -> Settings {
    let mut settings = Settings {
        enabled: true,
        ..Settings::default()
    };
    settings.add_viewer_email(DBA);
    settings
}

pub fn manager_with(engine: Arc<CatalogEngine>, settings: Settings) -> SchemaManager {
    let store = Arc::new(MemorySettingsStore::with_settings(settings));
    SchemaManager::new(
        engine,
        AccessGate::new(store),
        ServiceConfig::default().with_protected(["wp_options"]),
    )
}

pub fn manager(engine: Arc<CatalogEngine>) -> SchemaManager {
    manager_with(engine, open_settings())
}

#[derive(Debug, Clone)]
pub struct FakeColumn {
    pub name: String,
    pub column_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub extra: String,
}

#[derive(Debug, Clone)]
pub struct FakeIndex {
    pub name: String,
    pub unique: bool,
    pub index_type: &'static str,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FakeForeignKey {
    pub name: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_delete: String,
    pub on_update: String,
}

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub name: String,
    pub columns: Vec<FakeColumn>,
    pub indexes: Vec<FakeIndex>,
    pub foreign_keys: Vec<FakeForeignKey>,
    pub rows: Vec<Vec<(String, SqlValue)>>,
}

impl FakeTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn column(mut self, name: &str, column_type: &str, nullable: bool) -> Self {
        self.columns.push(FakeColumn {
            name: name.to_string(),
            column_type: column_type.to_string(),
            nullable,
            default: None,
            extra: String::new(),
        });
        self
    }

    pub fn primary(mut self, columns: &[&str]) -> Self {
        self.indexes.push(FakeIndex {
            name: "PRIMARY".to_string(),
            unique: true,
            index_type: "BTREE",
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn row(mut self, values: &[(&str, SqlValue)]) -> Self {
        self.rows.push(
            values
                .iter()
                .map(|(column, value)| (column.to_string(), value.clone()))
                .collect(),
        );
        self
    }

    fn find_column(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
    }

    fn find_index(&self, name: &str) -> Option<usize> {
        self.indexes
            .iter()
            .position(|index| index.name.eq_ignore_ascii_case(name))
    }

    fn column_key(&self, column: &str) -> &'static str {
        let leads = |index: &&FakeIndex| {
            index
                .columns
                .first()
                .is_some_and(|first| first.eq_ignore_ascii_case(column))
        };
        if self
            .indexes
            .iter()
            .any(|index| index.name == "PRIMARY" && index.columns.iter().any(|c| c.eq_ignore_ascii_case(column)))
        {
            "PRI"
        } else if self.indexes.iter().filter(leads).any(|index| index.unique && index.columns.len() == 1) {
            "UNI"
        } else if self.indexes.iter().any(|index| leads(&index)) {
            "MUL"
        } else {
            ""
        }
    }
}

/// Engine over an in-memory catalog. Records every executed statement.
///
/// Table lookups fold case, like a server running with
/// `lower_case_table_names = 2`.
#[derive(Default)]
pub struct CatalogEngine {
    tables: Mutex<BTreeMap<String, FakeTable>>,
    executed: Mutex<Vec<String>>,
    fail_next: Mutex<Option<String>>,
}

impl CatalogEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: FakeTable) -> Self {
        self.tables
            .lock()
            .unwrap()
            .insert(table.name.to_lowercase(), table);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn fail_next_execute(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    pub fn table(&self, name: &str) -> Option<FakeTable> {
        self.tables.lock().unwrap().get(&name.to_lowercase()).cloned()
    }
}

fn total(value: usize) -> Vec<Row> {
    vec![Row::from_pairs([("total", SqlValue::UInt(value as u64))])]
}

fn text(value: &str) -> SqlValue {
    SqlValue::from(value)
}

#[async_trait]
impl Engine for CatalogEngine {
    fn engine(&self) -> &'static str {
        "catalog"
    }

    async fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        let values: Vec<&SqlValue> = statement
            .params()
            .iter()
            .filter_map(|param| match param {
                Param::Value(value) => Some(value),
                Param::Ident(_) => None,
            })
            .collect();
        let value_text = |position: usize| {
            values
                .get(position)
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let ident = statement
            .identifiers()
            .next()
            .map(|ident| ident.to_string())
            .unwrap_or_default();

        let tables = self.tables.lock().unwrap();
        let named = |name: &str| tables.get(&name.to_lowercase()).cloned().unwrap_or_default();

        let rows = match statement.sql() {
            queries::LIST_TABLES => tables
                .values()
                .map(|table| {
                    Row::from_pairs([
                        ("name", text(&table.name)),
                        ("column_count", SqlValue::Int(table.columns.len() as i64)),
                    ])
                })
                .collect(),
            queries::TABLE_EXISTS => total(usize::from(tables.contains_key(&value_text(0).to_lowercase()))),
            queries::LIST_COLUMNS => {
                let table = named(&value_text(0));
                table
                    .columns
                    .iter()
                    .map(|column| {
                        Row::from_pairs([
                            ("name", text(&column.name)),
                            ("column_type", text(&column.column_type)),
                            ("is_nullable", text(if column.nullable { "YES" } else { "NO" })),
                            (
                                "column_default",
                                column.default.as_deref().map(text).unwrap_or(SqlValue::Null),
                            ),
                            ("extra", text(&column.extra)),
                            ("column_key", text(table.column_key(&column.name))),
                        ])
                    })
                    .collect()
            }
            queries::COLUMN_EXISTS => {
                total(usize::from(named(&value_text(0)).find_column(&value_text(1)).is_some()))
            }
            queries::COLUMN_COUNT => total(named(&value_text(0)).columns.len()),
            queries::LIST_INDEXES => {
                let mut indexes = named(&value_text(0)).indexes;
                indexes.sort_by_key(|index| index.name.to_lowercase());
                indexes
                    .iter()
                    .flat_map(|index| {
                        index.columns.iter().enumerate().map(move |(position, column)| {
                            Row::from_pairs([
                                ("name", text(&index.name)),
                                ("non_unique", SqlValue::Int(i64::from(!index.unique))),
                                ("column_name", text(column)),
                                ("sequence", SqlValue::UInt(position as u64 + 1)),
                                ("index_type", text(index.index_type)),
                            ])
                        })
                    })
                    .collect()
            }
            queries::LIST_FOREIGN_KEYS => named(&value_text(0))
                .foreign_keys
                .iter()
                .map(|fk| {
                    Row::from_pairs([
                        ("name", text(&fk.name)),
                        ("column_name", text(&fk.column)),
                        ("referenced_table", text(&fk.referenced_table)),
                        ("referenced_column", text(&fk.referenced_column)),
                    ])
                })
                .collect(),
            queries::LIST_REFERENTIAL_RULES => named(&value_text(0))
                .foreign_keys
                .iter()
                .map(|fk| {
                    Row::from_pairs([
                        ("name", text(&fk.name)),
                        ("update_rule", text(&fk.on_update)),
                        ("delete_rule", text(&fk.on_delete)),
                    ])
                })
                .collect(),
            queries::ROW_COUNT => total(named(&ident).rows.len()),
            queries::PREVIEW_ROWS => {
                let table = named(&ident);
                let limit = values.first().and_then(|v| v.as_u64()).unwrap_or(0) as usize;
                let offset = values.get(1).and_then(|v| v.as_u64()).unwrap_or(0) as usize;
                table
                    .rows
                    .iter()
                    .skip(offset)
                    .take(limit)
                    .map(|row| {
                        Row::from_pairs(table.columns.iter().map(|column| {
                            let value = row
                                .iter()
                                .find(|(name, _)| name == &column.name)
                                .map(|(_, value)| value.clone())
                                .unwrap_or(SqlValue::Null);
                            (column.name.clone(), value)
                        }))
                    })
                    .collect()
            }
            other => return Err(Error::engine(format!("unexpected query: {other}"))),
        };
        Ok(rows)
    }

    async fn execute(&self, statement: &Statement) -> Result<u64> {
        self.executed.lock().unwrap().push(statement.to_string());
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(Error::engine(message));
        }
        let sql = statement.render_inline(literal)?;
        let mut tables = self.tables.lock().unwrap();
        apply(&mut tables, &sql).map_err(Error::engine)?;
        Ok(0)
    }
}

fn literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Int(v) => v.to_string(),
        SqlValue::UInt(v) => v.to_string(),
        SqlValue::Float(v) => v.to_string(),
        other => format!("'{}'", other.as_str().unwrap_or_default().replace('\'', "''")),
    }
}

static IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([A-Za-z0-9_]+)`").unwrap());

static FOREIGN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^`(\w+)` FOREIGN KEY \(`(\w+)`\) REFERENCES `(\w+)` \(`(\w+)`\) ON DELETE ([A-Z ]+?) ON UPDATE ([A-Z ]+)$",
    )
    .unwrap()
});

type Outcome<T> = std::result::Result<T, String>;

/// Split a leading back-quoted identifier from the rest.
fn leading_ident(input: &str) -> Outcome<(String, &str)> {
    let input = input.trim_start();
    let body = input
        .strip_prefix('`')
        .ok_or_else(|| format!("expected identifier near '{input}'"))?;
    let end = body
        .find('`')
        .ok_or_else(|| format!("unterminated identifier near '{input}'"))?;
    Ok((body[..end].to_string(), &body[end + 1..]))
}

fn ident_list(input: &str) -> Vec<String> {
    IDENT
        .captures_iter(input)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Split on commas outside parentheses and quotes.
fn split_top_level(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quoted = false;
    for ch in input.chars() {
        match ch {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Parse `` `name` TYPE [NOT] NULL [AUTO_INCREMENT] [DEFAULT x] [AFTER `c`] ``.
fn parse_column(clause: &str) -> Outcome<(FakeColumn, Option<String>)> {
    let (name, rest) = leading_ident(clause)?;
    let rest = rest.trim();
    let (column_type, nullable, rest) = if let Some(at) = rest.find(" NOT NULL") {
        (&rest[..at], false, &rest[at + " NOT NULL".len()..])
    } else if let Some(at) = rest.find(" NULL") {
        (&rest[..at], true, &rest[at + " NULL".len()..])
    } else {
        return Err(format!("missing nullability for column '{name}'"));
    };

    let (rest, after) = match rest.find(" AFTER ") {
        Some(at) => (&rest[..at], Some(leading_ident(&rest[at + " AFTER ".len()..])?.0)),
        None => (rest, None),
    };
    let default = rest.find(" DEFAULT ").and_then(|at| {
        let raw = rest[at + " DEFAULT ".len()..].trim();
        match raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
            Some(quoted) => Some(quoted.replace("''", "'")),
            None if raw.eq_ignore_ascii_case("NULL") => None,
            None => Some(raw.to_string()),
        }
    });

    Ok((
        FakeColumn {
            name,
            column_type: column_type.trim().to_lowercase(),
            nullable,
            default,
            extra: if rest.contains("AUTO_INCREMENT") {
                "auto_increment".to_string()
            } else {
                String::new()
            },
        },
        after,
    ))
}

fn apply(tables: &mut BTreeMap<String, FakeTable>, sql: &str) -> Outcome<()> {
    if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
        let (name, rest) = leading_ident(rest)?;
        if tables.contains_key(&name.to_lowercase()) {
            return Err(format!("Table '{name}' already exists"));
        }
        let body = rest
            .trim()
            .strip_prefix('(')
            .and_then(|body| body.strip_suffix(')'))
            .ok_or_else(|| "malformed CREATE TABLE".to_string())?;
        let mut table = FakeTable::new(&name);
        for clause in split_top_level(body) {
            match clause.strip_prefix("PRIMARY KEY ") {
                Some(members) => add_primary(&mut table, ident_list(members))?,
                None => {
                    let (column, _) = parse_column(&clause)?;
                    if table.find_column(&column.name).is_some() {
                        return Err(format!("Duplicate column name '{}'", column.name));
                    }
                    table.columns.push(column);
                }
            }
        }
        if table.columns.is_empty() {
            return Err("A table must have at least 1 column".to_string());
        }
        tables.insert(name.to_lowercase(), table);
        return Ok(());
    }

    if let Some(rest) = sql.strip_prefix("DROP TABLE ") {
        let (name, _) = leading_ident(rest)?;
        return tables
            .remove(&name.to_lowercase())
            .map(|_| ())
            .ok_or_else(|| format!("Unknown table '{name}'"));
    }

    let rest = sql
        .strip_prefix("ALTER TABLE ")
        .ok_or_else(|| format!("You have an error in your SQL syntax near '{sql}'"))?;
    let (name, rest) = leading_ident(rest)?;
    let mut table = tables
        .get(&name.to_lowercase())
        .cloned()
        .ok_or_else(|| format!("Table '{name}' doesn't exist"))?;
    for action in split_top_level(rest) {
        alter(&mut table, tables, &action)?;
    }
    tables.insert(name.to_lowercase(), table);
    Ok(())
}

fn add_primary(table: &mut FakeTable, members: Vec<String>) -> Outcome<()> {
    if table.find_index("PRIMARY").is_some() {
        return Err("Multiple primary key defined".to_string());
    }
    for member in &members {
        let position = table
            .find_column(member)
            .ok_or_else(|| format!("Key column '{member}' doesn't exist in table"))?;
        table.columns[position].nullable = false;
    }
    table.indexes.push(FakeIndex {
        name: "PRIMARY".to_string(),
        unique: true,
        index_type: "BTREE",
        columns: members,
    });
    Ok(())
}

fn alter(table: &mut FakeTable, tables: &BTreeMap<String, FakeTable>, action: &str) -> Outcome<()> {
    if let Some(rest) = action.strip_prefix("ADD COLUMN ") {
        let (column, after) = parse_column(rest)?;
        if table.find_column(&column.name).is_some() {
            return Err(format!("Duplicate column name '{}'", column.name));
        }
        let position = match after {
            Some(after) => {
                table
                    .find_column(&after)
                    .ok_or_else(|| format!("Unknown column '{after}' in '{}'", table.name))?
                    + 1
            }
            None => table.columns.len(),
        };
        table.columns.insert(position, column);
        return Ok(());
    }

    if let Some(rest) = action.strip_prefix("CHANGE COLUMN ") {
        let (current, rest) = leading_ident(rest)?;
        let (column, _) = parse_column(rest)?;
        let position = table
            .find_column(&current)
            .ok_or_else(|| format!("Unknown column '{current}' in '{}'", table.name))?;
        let new_name = column.name.clone();
        table.columns[position] = column;
        for index in &mut table.indexes {
            for member in &mut index.columns {
                if member.eq_ignore_ascii_case(&current) {
                    *member = new_name.clone();
                }
            }
        }
        return Ok(());
    }

    if let Some(rest) = action.strip_prefix("DROP COLUMN ") {
        let (column, _) = leading_ident(rest)?;
        let position = table
            .find_column(&column)
            .ok_or_else(|| format!("Can't DROP '{column}'; check that column/key exists"))?;
        table.columns.remove(position);
        for index in &mut table.indexes {
            index.columns.retain(|member| !member.eq_ignore_ascii_case(&column));
        }
        table.indexes.retain(|index| !index.columns.is_empty());
        return Ok(());
    }

    if let Some(rest) = action.strip_prefix("ADD PRIMARY KEY ") {
        return add_primary(table, ident_list(rest));
    }

    if action == "DROP PRIMARY KEY" {
        let position = table
            .find_index("PRIMARY")
            .ok_or_else(|| "Can't DROP 'PRIMARY'; check that column/key exists".to_string())?;
        table.indexes.remove(position);
        return Ok(());
    }

    for (prefix, unique, index_type) in [
        ("ADD INDEX ", false, "BTREE"),
        ("ADD UNIQUE INDEX ", true, "BTREE"),
        ("ADD FULLTEXT INDEX ", false, "FULLTEXT"),
        ("ADD SPATIAL INDEX ", false, "SPATIAL"),
    ] {
        if let Some(rest) = action.strip_prefix(prefix) {
            let (name, members) = leading_ident(rest)?;
            if table.find_index(&name).is_some() {
                return Err(format!("Duplicate key name '{name}'"));
            }
            let columns = ident_list(members);
            if let Some(missing) = columns.iter().find(|c| table.find_column(c).is_none()) {
                return Err(format!("Key column '{missing}' doesn't exist in table"));
            }
            table.indexes.push(FakeIndex {
                name,
                unique,
                index_type,
                columns,
            });
            return Ok(());
        }
    }

    if let Some(rest) = action.strip_prefix("DROP INDEX ") {
        let (name, _) = leading_ident(rest)?;
        let position = table
            .find_index(&name)
            .ok_or_else(|| format!("Can't DROP '{name}'; check that column/key exists"))?;
        table.indexes.remove(position);
        return Ok(());
    }

    if let Some(rest) = action.strip_prefix("ADD CONSTRAINT ") {
        let captures = FOREIGN_KEY
            .captures(rest)
            .ok_or_else(|| format!("malformed constraint '{rest}'"))?;
        let referenced = if captures[3].eq_ignore_ascii_case(&table.name) {
            Some(&*table)
        } else {
            tables.get(&captures[3].to_lowercase())
        };
        let referenced = referenced.ok_or_else(|| "Failed to open the referenced table".to_string())?;
        if referenced.find_column(&captures[4]).is_none() {
            return Err("Missing index for constraint in the referenced table".to_string());
        }
        if table.foreign_keys.iter().any(|fk| fk.name.eq_ignore_ascii_case(&captures[1])) {
            return Err(format!("Duplicate foreign key constraint name '{}'", &captures[1]));
        }
        table.foreign_keys.push(FakeForeignKey {
            name: captures[1].to_string(),
            column: captures[2].to_string(),
            referenced_table: captures[3].to_string(),
            referenced_column: captures[4].to_string(),
            on_delete: captures[5].to_string(),
            on_update: captures[6].to_string(),
        });
        return Ok(());
    }

    if let Some(rest) = action.strip_prefix("DROP FOREIGN KEY ") {
        let (name, _) = leading_ident(rest)?;
        let before = table.foreign_keys.len();
        table.foreign_keys.retain(|fk| !fk.name.eq_ignore_ascii_case(&name));
        if table.foreign_keys.len() == before {
            return Err(format!("Can't DROP '{name}'; check that column/key exists"));
        }
        return Ok(());
    }

    Err(format!("You have an error in your SQL syntax near '{action}'"))
}
