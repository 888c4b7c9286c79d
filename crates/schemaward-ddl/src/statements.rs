//! Builders for every schema-changing statement.
//!
//! Builders take validated specs and return a `Statement`; they never touch
//! the engine. Identifiers go in as `??` placeholders, default literals as `?`.

use schemaward_core::{
    ColumnSpec, Error, ForeignKeySpec, Identifier, IndexKind, IndexSpec, PRIMARY_INDEX, Result,
    Statement,
};

/// What a column redefinition does to the table's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimaryKeyChange {
    /// Leave the primary key alone.
    #[default]
    Keep,
    /// The table has no primary key; make the column it.
    Add,
    /// Drop the existing primary key and make the column the new one.
    Replace,
    /// Drop the primary key the column belonged to.
    Drop,
}

fn push_column_clause(statement: &mut Statement, column: &ColumnSpec) {
    statement
        .push_ident(&column.name)
        .push_sql(" ")
        .push_sql(column.column_type.as_str())
        .push_sql(if column.nullable { " NULL" } else { " NOT NULL" });
    if column.auto_increment {
        statement.push_sql(" AUTO_INCREMENT");
    }
    if let Some(default) = &column.default {
        statement.push_sql(" DEFAULT ").push_default(default);
    }
}

fn alter_table(table: &Identifier) -> Statement {
    let mut statement = Statement::new("ALTER TABLE ");
    statement.push_ident(table).push_sql(" ");
    statement
}

/// `CREATE TABLE` with one clause per column and at most one primary key.
pub fn create_table(table: &Identifier, columns: &[ColumnSpec]) -> Result<Statement> {
    if columns.is_empty() {
        return Err(Error::NoColumns(format!("table `{table}`")));
    }
    let primary: Vec<&ColumnSpec> = columns.iter().filter(|column| column.primary).collect();
    if primary.len() > 1 {
        return Err(Error::MultiplePrimaryKeys {
            columns: primary.iter().map(|c| c.name.to_string()).collect(),
        });
    }

    let mut statement = Statement::new("CREATE TABLE ");
    statement.push_ident(table).push_sql(" (");
    for (position, column) in columns.iter().enumerate() {
        if position > 0 {
            statement.push_sql(", ");
        }
        push_column_clause(&mut statement, column);
    }
    if let Some(column) = primary.first() {
        statement
            .push_sql(", PRIMARY KEY (")
            .push_ident(&column.name)
            .push_sql(")");
    }
    statement.push_sql(")");
    Ok(statement)
}

pub fn add_column(table: &Identifier, column: &ColumnSpec) -> Statement {
    let mut statement = alter_table(table);
    statement.push_sql("ADD COLUMN ");
    push_column_clause(&mut statement, column);
    if let Some(after) = &column.after {
        statement.push_sql(" AFTER ").push_ident(after);
    }
    if column.primary {
        statement
            .push_sql(", ADD PRIMARY KEY (")
            .push_ident(&column.name)
            .push_sql(")");
    }
    statement
}

/// Redefine `current`, renaming it when `column.name` differs.
pub fn modify_column(
    table: &Identifier,
    current: &Identifier,
    column: &ColumnSpec,
    primary: PrimaryKeyChange,
) -> Statement {
    let mut statement = alter_table(table);
    statement
        .push_sql("CHANGE COLUMN ")
        .push_ident(current)
        .push_sql(" ");
    push_column_clause(&mut statement, column);

    match primary {
        PrimaryKeyChange::Keep => {}
        PrimaryKeyChange::Add => {
            statement
                .push_sql(", ADD PRIMARY KEY (")
                .push_ident(&column.name)
                .push_sql(")");
        }
        PrimaryKeyChange::Replace => {
            statement
                .push_sql(", DROP PRIMARY KEY, ADD PRIMARY KEY (")
                .push_ident(&column.name)
                .push_sql(")");
        }
        PrimaryKeyChange::Drop => {
            statement.push_sql(", DROP PRIMARY KEY");
        }
    }
    statement
}

pub fn drop_column(table: &Identifier, column: &Identifier) -> Statement {
    let mut statement = alter_table(table);
    statement.push_sql("DROP COLUMN ").push_ident(column);
    statement
}

/// Add an index, picking the clause from its kind.
///
/// A primary key is unnamed; `index.name` is ignored for it.
pub fn add_index(table: &Identifier, index: &IndexSpec) -> Statement {
    let mut statement = alter_table(table);
    match index.kind {
        IndexKind::Primary => {
            statement.push_sql("ADD PRIMARY KEY (");
        }
        IndexKind::Index => {
            statement
                .push_sql("ADD INDEX ")
                .push_ident(&index.name)
                .push_sql(" (");
        }
        kind @ (IndexKind::Unique | IndexKind::Fulltext | IndexKind::Spatial) => {
            statement
                .push_sql("ADD ")
                .push_sql(kind.as_str())
                .push_sql(" INDEX ")
                .push_ident(&index.name)
                .push_sql(" (");
        }
    }
    statement.push_ident_list(&index.columns).push_sql(")");
    statement
}

/// Drop a named index. The primary key is refused with `PrimaryIndex`.
pub fn drop_index(table: &Identifier, index: &Identifier) -> Result<Statement> {
    if index.as_str().eq_ignore_ascii_case(PRIMARY_INDEX) {
        return Err(Error::PrimaryIndex {
            table: table.to_string(),
        });
    }
    let mut statement = alter_table(table);
    statement.push_sql("DROP INDEX ").push_ident(index);
    Ok(statement)
}

pub fn add_foreign_key(table: &Identifier, fk: &ForeignKeySpec) -> Statement {
    let mut statement = alter_table(table);
    statement
        .push_sql("ADD CONSTRAINT ")
        .push_ident(&fk.name)
        .push_sql(" FOREIGN KEY (")
        .push_ident(&fk.column)
        .push_sql(") REFERENCES ")
        .push_ident(&fk.referenced_table)
        .push_sql(" (")
        .push_ident(&fk.referenced_column)
        .push_sql(") ON DELETE ")
        .push_sql(fk.on_delete.as_sql())
        .push_sql(" ON UPDATE ")
        .push_sql(fk.on_update.as_sql());
    statement
}

pub fn drop_foreign_key(table: &Identifier, name: &Identifier) -> Statement {
    let mut statement = alter_table(table);
    statement.push_sql("DROP FOREIGN KEY ").push_ident(name);
    statement
}

pub fn drop_table(table: &Identifier) -> Statement {
    Statement::new("DROP TABLE ??").ident(table)
}
