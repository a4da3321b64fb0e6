// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! geoask - plain-language questions over the geoportal analytics database.
//!
//! This is the binary entry point.

mod app;
mod render;
mod shell;
mod train;

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use colored::Colorize;
use geoask_config::GeoaskConfig;
use geoask_core::{GeoaskError, RetrievalStore};

/// geoask - ask the geoportal analytics database questions in plain language.
#[derive(Parser, Debug)]
#[command(name = "geoask", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer one question, then offer to refine it.
    Ask {
        /// The question. Prompted for when omitted.
        question: Option<String>,
    },
    /// Launch an interactive question loop.
    Shell,
    /// Add training data.
    #[command(group(
        ArgGroup::new("source")
            .required(true)
            .args(["ddl", "doc", "question"]),
    ))]
    Train {
        /// File with CREATE TABLE statements, one snippet per statement.
        #[arg(long)]
        ddl: Option<PathBuf>,
        /// File with documentation text, stored as one snippet.
        #[arg(long)]
        doc: Option<PathBuf>,
        /// Question of a question/SQL example.
        #[arg(long, requires = "sql")]
        question: Option<String>,
        /// SQL of a question/SQL example.
        #[arg(long, requires = "question")]
        sql: Option<String>,
    },
    /// List stored training data.
    TrainingData,
    /// Remove a training record by id.
    Remove {
        /// Record id as shown by `training-data`.
        id: String,
    },
    /// Print the effective configuration with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match geoask_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            geoask_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    if let Err(e) = run(cli.command, config).await {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn run(command: Option<Commands>, config: GeoaskConfig) -> Result<(), GeoaskError> {
    match command {
        Some(Commands::Ask { question }) => shell::run_ask(&config, question).await,
        Some(Commands::Shell) => shell::run_shell(&config).await,
        Some(Commands::Train {
            ddl,
            doc,
            question,
            sql,
        }) => {
            let input = match (ddl, doc, question.zip(sql)) {
                (Some(path), _, _) => train::TrainInput::Ddl(path),
                (_, Some(path), _) => train::TrainInput::Documentation(path),
                (_, _, Some((question, sql))) => train::TrainInput::Pair { question, sql },
                _ => return Err(GeoaskError::Config("nothing to train".into())),
            };
            let store = app::open_store(&config).await?;
            let ids = train::train(store.as_ref(), input).await?;
            for id in ids {
                println!("{} {id}", "added".green());
            }
            Ok(())
        }
        Some(Commands::TrainingData) => {
            let store = app::open_store(&config).await?;
            let records = store.list_training_data().await?;
            print!("{}", render::training_table(&records));
            Ok(())
        }
        Some(Commands::Remove { id }) => {
            let store = app::open_store(&config).await?;
            if train::remove(store.as_ref(), &id).await? {
                println!("{} {id}", "removed".green());
            } else {
                println!("{} {id}", "not found:".yellow());
            }
            Ok(())
        }
        Some(Commands::Config) => {
            print!("{}", redacted_config(&config)?);
            Ok(())
        }
        None => {
            println!("geoask: use --help for available commands");
            Ok(())
        }
    }
}

const REDACTED: &str = "[REDACTED]";

/// Serializes the config as TOML with credentials masked.
fn redacted_config(config: &GeoaskConfig) -> Result<String, GeoaskError> {
    let mut config = config.clone();
    if config.remote.api_key.is_some() {
        config.remote.api_key = Some(REDACTED.into());
    }
    if config.local.access_token.is_some() {
        config.local.access_token = Some(REDACTED.into());
    }
    // Connection URLs may carry a password.
    if config.executor.url.is_some() {
        config.executor.url = Some(REDACTED.into());
    }
    toml::to_string_pretty(&config)
        .map_err(|e| GeoaskError::Internal(format!("failed to serialize config: {e}")))
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so SQL and result tables on stdout stay clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("geoask={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
