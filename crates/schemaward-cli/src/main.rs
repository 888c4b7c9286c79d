mod config;
mod logging;
mod output;
mod redaction;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use config::AppConfig;
use logging::init_logging;
use output::print_json;
use redaction::redact_database_url;
use schemaward_access::{Caller, SettingsPatch, TomlSettingsStore};
use schemaward_core::{ColumnDefinition, Error as CoreError, IndexDefinition, RelationDefinition};
use schemaward_introspect::MySqlEngine;
use schemaward_service::{SchemaManager, ServiceConfig};
use serde_json::{Value, json};
use thiserror::Error;

const EMAIL_ENV: &str = "SCHEMAWARD_EMAIL";

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("config file error: {0}")]
    ConfigDecode(#[from] toml::de::Error),
    #[error("invalid JSON argument: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(name = "schemaward", version, about = "Inspect and change a MySQL schema behind an access gate")]
struct Cli {
    /// Path to schemaward.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Caller email checked against the viewer whitelist (or SCHEMAWARD_EMAIL).
    #[arg(long, global = true)]
    email: Option<String>,
    /// Run without administrator rights.
    #[arg(long, global = true, default_value_t = false)]
    no_admin: bool,
    /// Debug-level logs unless RUST_LOG says otherwise.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tables in the connected database.
    #[command(subcommand)]
    Tables(TableCommand),
    /// Columns of one table.
    #[command(subcommand)]
    Columns(ColumnCommand),
    /// Indexes of one table.
    #[command(subcommand)]
    Indexes(IndexCommand),
    /// Foreign keys of one table.
    #[command(subcommand)]
    Relations(RelationCommand),
    /// Row preview.
    #[command(subcommand)]
    Data(DataCommand),
    /// Access settings.
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand, Debug)]
enum TableCommand {
    List,
    Get {
        name: String,
    },
    /// Create a table; each --column is a JSON column definition.
    Create {
        name: String,
        #[arg(long = "column", value_name = "JSON", required = true)]
        columns: Vec<String>,
    },
    Drop {
        name: String,
    },
    Lock {
        name: String,
    },
    Unlock {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum ColumnCommand {
    List {
        table: String,
    },
    Add {
        table: String,
        #[command(flatten)]
        column: ColumnArgs,
        /// Place the new column after this one.
        #[arg(long)]
        after: Option<String>,
    },
    /// Redefine a column; a different --name renames it.
    Update {
        table: String,
        current: String,
        #[command(flatten)]
        column: ColumnArgs,
    },
    Drop {
        table: String,
        column: String,
    },
}

#[derive(Args, Debug)]
struct ColumnArgs {
    #[arg(long)]
    name: String,
    #[arg(long = "type", value_name = "TYPE")]
    column_type: String,
    #[arg(long)]
    length: Option<i64>,
    #[arg(long, default_value_t = false)]
    not_null: bool,
    /// Default value; parsed as JSON when possible, otherwise taken as text.
    #[arg(long)]
    default: Option<String>,
    #[arg(long, default_value_t = false)]
    auto_increment: bool,
    /// Make the column (part of) the primary key.
    #[arg(long, default_value_t = false, conflicts_with = "not_primary")]
    primary: bool,
    /// Take the column out of the primary key. Without either flag an update
    /// leaves the key as it is.
    #[arg(long, default_value_t = false)]
    not_primary: bool,
}

impl ColumnArgs {
    fn into_definition(self, after: Option<String>) -> ColumnDefinition {
        ColumnDefinition {
            name: self.name,
            column_type: self.column_type,
            length: self.length,
            nullable: !self.not_null,
            default: self.default.map(|raw| parse_default(&raw)),
            auto_increment: self.auto_increment,
            primary: match (self.primary, self.not_primary) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            after,
        }
    }
}

#[derive(Subcommand, Debug)]
enum IndexCommand {
    List {
        table: String,
    },
    Add {
        table: String,
        name: String,
        /// PRIMARY, UNIQUE, INDEX, FULLTEXT or SPATIAL.
        #[arg(long, default_value = "INDEX")]
        kind: String,
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,
    },
    Drop {
        table: String,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum RelationCommand {
    List {
        table: String,
    },
    Add {
        table: String,
        column: String,
        referenced_table: String,
        referenced_column: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        on_delete: Option<String>,
        #[arg(long)]
        on_update: Option<String>,
    },
    Drop {
        table: String,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum DataCommand {
    Preview {
        table: String,
        #[arg(long, default_value_t = 0)]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Show,
    Activate,
    Deactivate,
    AddViewer {
        email: String,
    },
    RemoveViewer {
        email: String,
    },
    /// Apply a JSON patch such as {"enabled":true,"viewer_emails":["a@b.c"]}.
    Update {
        #[arg(value_name = "JSON")]
        patch: String,
    },
    /// Reset to first-use defaults, locking every existing table.
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(config.log_format, cli.verbose)?;

    let started = Instant::now();
    let caller = resolve_caller(cli.email, cli.no_admin);
    let manager = connect(&config).await?;
    let result = dispatch(&manager, &caller, cli.command).await;

    match &result {
        Ok(()) => tracing::debug!(
            event = "command_finished",
            duration_ms = started.elapsed().as_millis() as u64
        ),
        Err(err) => tracing::error!(event = "command_failed", error = %err),
    }
    result
}

fn resolve_caller(email: Option<String>, no_admin: bool) -> Caller {
    let email = email
        .or_else(|| std::env::var(EMAIL_ENV).ok())
        .unwrap_or_default();
    if no_admin {
        Caller::user(email)
    } else {
        Caller::administrator(email)
    }
}

async fn connect(config: &AppConfig) -> Result<SchemaManager, CliError> {
    let url = config.require_database_url()?;
    let target = redact_database_url(url);
    tracing::info!(
        event = "database_connect",
        url = %target.redacted,
        database = target.database.as_deref().unwrap_or(""),
        max_connections = config.max_connections
    );

    let engine = MySqlEngine::connect(
        url,
        config.max_connections,
        Duration::from_secs(config.acquire_timeout_secs),
    )
    .await?;
    let store = TomlSettingsStore::new(config.settings_path.clone());
    let service_config = ServiceConfig::default().with_protected(config.protected_tables.iter().cloned());
    let manager = SchemaManager::bootstrap(Arc::new(engine), Arc::new(store), service_config).await?;
    Ok(manager)
}

async fn dispatch(manager: &SchemaManager, caller: &Caller, command: Command) -> Result<(), CliError> {
    match command {
        Command::Tables(command) => tables(manager, caller, command).await,
        Command::Columns(command) => columns(manager, caller, command).await,
        Command::Indexes(command) => indexes(manager, caller, command).await,
        Command::Relations(command) => relations(manager, caller, command).await,
        Command::Data(DataCommand::Preview {
            table,
            limit,
            offset,
        }) => print_json(&manager.data().preview(caller, &table, limit, offset).await?),
        Command::Settings(command) => settings(manager, caller, command).await,
    }
}

async fn tables(manager: &SchemaManager, caller: &Caller, command: TableCommand) -> Result<(), CliError> {
    let service = manager.tables();
    match command {
        TableCommand::List => print_json(&service.list(caller).await?),
        TableCommand::Get { name } => print_json(&service.get(caller, &name).await?),
        TableCommand::Create { name, columns } => {
            let columns = columns
                .iter()
                .map(|raw| serde_json::from_str::<ColumnDefinition>(raw))
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&service.create(caller, &name, &columns).await?)
        }
        TableCommand::Drop { name } => {
            service.delete(caller, &name).await?;
            print_json(&json!({ "dropped": name }))
        }
        TableCommand::Lock { name } => {
            service.lock(caller, &name).await?;
            print_json(&json!({ "locked": name }))
        }
        TableCommand::Unlock { name } => {
            service.unlock(caller, &name).await?;
            print_json(&json!({ "unlocked": name }))
        }
    }
}

async fn columns(manager: &SchemaManager, caller: &Caller, command: ColumnCommand) -> Result<(), CliError> {
    let service = manager.columns();
    match command {
        ColumnCommand::List { table } => print_json(&service.list(caller, &table).await?),
        ColumnCommand::Add {
            table,
            column,
            after,
        } => {
            let definition = column.into_definition(after);
            print_json(&service.add(caller, &table, &definition).await?)
        }
        ColumnCommand::Update {
            table,
            current,
            column,
        } => {
            let definition = column.into_definition(None);
            print_json(&service.update(caller, &table, &current, &definition).await?)
        }
        ColumnCommand::Drop { table, column } => {
            service.delete(caller, &table, &column).await?;
            print_json(&json!({ "table": table, "dropped": column }))
        }
    }
}

async fn indexes(manager: &SchemaManager, caller: &Caller, command: IndexCommand) -> Result<(), CliError> {
    let service = manager.indexes();
    match command {
        IndexCommand::List { table } => print_json(&service.list(caller, &table).await?),
        IndexCommand::Add {
            table,
            name,
            kind,
            columns,
        } => {
            let definition = IndexDefinition::new(name, kind, columns);
            print_json(&service.add(caller, &table, &definition).await?)
        }
        IndexCommand::Drop { table, name } => {
            service.delete(caller, &table, &name).await?;
            print_json(&json!({ "table": table, "dropped": name }))
        }
    }
}

async fn relations(
    manager: &SchemaManager,
    caller: &Caller,
    command: RelationCommand,
) -> Result<(), CliError> {
    let service = manager.relations();
    match command {
        RelationCommand::List { table } => print_json(&service.list(caller, &table).await?),
        RelationCommand::Add {
            table,
            column,
            referenced_table,
            referenced_column,
            name,
            on_delete,
            on_update,
        } => {
            let definition = RelationDefinition {
                column,
                referenced_table,
                referenced_column,
                name,
                on_delete,
                on_update,
            };
            print_json(&service.add(caller, &table, &definition).await?)
        }
        RelationCommand::Drop { table, name } => {
            service.delete(caller, &table, &name).await?;
            print_json(&json!({ "table": table, "dropped": name }))
        }
    }
}

async fn settings(manager: &SchemaManager, caller: &Caller, command: SettingsCommand) -> Result<(), CliError> {
    let service = manager.settings();
    let settings = match command {
        SettingsCommand::Show => service.get(caller)?,
        SettingsCommand::Activate => service.activate(caller)?,
        SettingsCommand::Deactivate => service.deactivate(caller)?,
        SettingsCommand::AddViewer { email } => service.add_viewer_email(caller, &email)?,
        SettingsCommand::RemoveViewer { email } => service.remove_viewer_email(caller, &email)?,
        SettingsCommand::Update { patch } => {
            let patch: SettingsPatch = serde_json::from_str(&patch)?;
            service.update(caller, patch)?
        }
        SettingsCommand::Reset => service.reset(caller).await?,
    };
    print_json(&settings)
}

fn parse_default(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
