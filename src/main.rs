//! Seedbed CLI Entry Point
//!
//! Three subcommands:
//! - `check` - load and validate a settings file, dry-run every data source
//! - `run` - provision a live MongoDB server (requires the `mongodb` feature)
//! - `init` - interactively scaffold a starter settings file
//!
//! All output to stdout is one JSON envelope per invocation. Interactive
//! prompts (`init`) talk to the terminal directly; incidental warnings go
//! to stderr. Exit code is 0 on success, 1 on any failure.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input};
use serde::Serialize;

use seedbed::{
    DataSource, ErrorEnvelope, ErrorInfo, Metadata, SeedConfig, SeedbedError, SuccessEnvelope,
};

/// Seedbed - declarative test-fixture provisioning for document stores
#[derive(Parser)]
#[command(name = "seedbed")]
#[command(about = "Put document-store test fixtures into a known state before a test run")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a settings file and dry-run every data source
    Check {
        /// Path to the JSON settings file
        config: PathBuf,
    },

    /// Provision the configured databases against live servers
    Run {
        /// Path to the JSON settings file
        config: PathBuf,
    },

    /// Interactively create a starter settings file
    Init {
        /// Where to write the settings file
        #[arg(long, default_value = "seedbed.json")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Check { config } => check(&config),
        Commands::Run { config } => run(&config),
        Commands::Init { output } => init(&output),
    };
    std::process::exit(code);
}

/// Print one envelope to stdout, returning the matching exit code
fn emit<T: Serialize>(envelope: &T, code: i32) -> i32 {
    match serde_json::to_string(envelope) {
        Ok(json) => {
            println!("{json}");
            code
        }
        Err(e) => {
            eprintln!("failed to serialize output envelope: {e}");
            1
        }
    }
}

// ============================================================================
// check
// ============================================================================

/// Dry-run plan for one database entry
#[derive(Debug, Serialize)]
struct DatabasePlan {
    name: String,
    physical_name: String,
    connection_target: String,
    drop_first: bool,
    collections: Vec<CollectionPlan>,
}

/// Dry-run plan for one collection entry
#[derive(Debug, Serialize)]
struct CollectionPlan {
    name: String,
    physical_name: String,
    drop_first: bool,
    source: String,
    documents: usize,
}

fn check(config_path: &Path) -> i32 {
    let start = Instant::now();
    match check_plan(config_path) {
        Ok(plan) => {
            let envelope = SuccessEnvelope::new(
                "check",
                serde_json::json!({ "databases": plan }),
                Metadata::new(elapsed_ms(start)),
            );
            emit(&envelope, 0)
        }
        Err(err) => emit(&ErrorEnvelope::from_error("check", &err), 1),
    }
}

/// Load the settings file and fetch every collection's data without
/// touching any store
fn check_plan(config_path: &Path) -> Result<Vec<DatabasePlan>, SeedbedError> {
    let config = SeedConfig::from_file(config_path)?;

    config
        .databases
        .iter()
        .map(|db| {
            let collections = db
                .collections
                .iter()
                .map(|coll| {
                    let documents = coll.provider().fetch()?.len();
                    let source = match &coll.source {
                        DataSource::File(path) => path.display().to_string(),
                        DataSource::Provider(_) => "<in-code provider>".to_string(),
                    };
                    Ok(CollectionPlan {
                        name: coll.name.clone(),
                        physical_name: coll
                            .physical_name(db.collection_name_suffix.as_deref()),
                        drop_first: coll.drop_first,
                        source,
                        documents,
                    })
                })
                .collect::<Result<Vec<_>, SeedbedError>>()?;

            Ok(DatabasePlan {
                name: db.name.clone(),
                physical_name: db.physical_name(),
                connection_target: db.connection_target.clone(),
                drop_first: db.drop_first,
                collections,
            })
        })
        .collect()
}

// ============================================================================
// run
// ============================================================================

#[cfg(feature = "mongodb")]
fn run(config_path: &Path) -> i32 {
    use seedbed::store::mongo::MongoFactory;
    use seedbed::SessionManager;

    let start = Instant::now();
    let result = SeedConfig::from_file(config_path)
        .and_then(|config| SessionManager::new(MongoFactory::new()).provision(&config));
    match result {
        Ok(provisioned) => {
            let envelope = SuccessEnvelope::new(
                "run",
                provisioned.summary.clone(),
                Metadata::with_documents(
                    elapsed_ms(start),
                    provisioned.summary.documents_inserted(),
                ),
            );
            emit(&envelope, 0)
        }
        Err(err) => emit(&ErrorEnvelope::from_error("run", &err), 1),
    }
}

#[cfg(not(feature = "mongodb"))]
fn run(_config_path: &Path) -> i32 {
    let envelope = ErrorEnvelope::new(
        "run",
        ErrorInfo::new(
            "FEATURE_DISABLED",
            "seedbed was built without the `mongodb` feature; \
             rebuild with `--features mongodb` to provision live servers",
        ),
    );
    emit(&envelope, 1)
}

// ============================================================================
// init
// ============================================================================

fn init(output: &Path) -> i32 {
    let start = Instant::now();
    match init_flow(output) {
        Ok(config) => {
            let envelope = SuccessEnvelope::new(
                "init",
                serde_json::json!({
                    "path": output.display().to_string(),
                    "databases": config.databases.len(),
                }),
                Metadata::new(elapsed_ms(start)),
            );
            emit(&envelope, 0)
        }
        Err(err) => {
            let info = match err.downcast_ref::<SeedbedError>() {
                Some(e) => ErrorInfo::new(e.error_code(), e.message()),
                None => ErrorInfo::new("IO", err.to_string()),
            };
            emit(&ErrorEnvelope::new("init", info), 1)
        }
    }
}

/// Walk the user through a one-database, one-collection starter config
fn init_flow(output: &Path) -> anyhow::Result<SeedConfig> {
    if output.exists() {
        let overwrite = Confirm::new()
            .with_prompt(format!("`{}` already exists. Overwrite?", output.display()))
            .default(false)
            .interact()
            .context("failed to read confirmation")?;
        if !overwrite {
            anyhow::bail!("aborted: `{}` was left untouched", output.display());
        }
    }

    let database_name: String = Input::new()
        .with_prompt("Database name")
        .default("TestDb1".to_string())
        .interact_text()
        .context("failed to read database name")?;

    let connection_target: String = Input::new()
        .with_prompt("Connection string")
        .default("mongodb://localhost:27017".to_string())
        .interact_text()
        .context("failed to read connection string")?;

    let drop_database = Confirm::new()
        .with_prompt("Drop the database before provisioning?")
        .default(true)
        .interact()
        .context("failed to read drop flag")?;

    let collection_name: String = Input::new()
        .with_prompt("Collection name")
        .default("people".to_string())
        .interact_text()
        .context("failed to read collection name")?;

    let data_file: String = Input::new()
        .with_prompt("Data file location")
        .default("data/people.json".to_string())
        .interact_text()
        .context("failed to read data file location")?;

    let drop_collection = Confirm::new()
        .with_prompt("Drop the collection before inserting?")
        .default(true)
        .interact()
        .context("failed to read drop flag")?;

    let mut stage = SeedConfig::builder()
        .database(database_name)?
        .connection_target(connection_target)?;
    if drop_database {
        stage = stage.drop_first();
    }
    let config = stage.collection(collection_name, drop_collection, data_file)?.build();

    config.save(output)?;
    Ok(config)
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
