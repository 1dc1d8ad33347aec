//! `mailsetup` - provision mail accounts from the command line.
//!
//! Reads a flat option map (JSON file, stdin or `key=value` pairs), runs it
//! through the provisioning pipeline and prints the result payload.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod paths;
mod request;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mailsetup_core::{
    AccountId, ChannelSink, KeyringRegistrar, Pipeline, ProvisioningConfig, ProvisioningRequest,
    ProvisioningResult, ProvisioningWorker, ReplyMode, SqliteAccountStore,
    StaticProviderDirectory,
};
use serde_json::Map;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mailsetup")]
#[command(about = "Provision mail accounts from a flat option map")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Account database (defaults to the platform data directory)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Provision an account
    Provision {
        /// JSON file holding the request options ("-" for stdin)
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Request options as key=value, applied over the file
        options: Vec<String>,

        /// Extra provider templates (JSON array), checked after the built-in ones
        #[arg(long)]
        providers: Option<PathBuf>,

        /// Identity registrar timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Publish the result on the broadcast channel instead of replying directly
        #[arg(long)]
        broadcast: bool,
    },

    /// List provisioned accounts
    List,

    /// Remove an account and its stored credentials
    Remove {
        /// Account ID
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsetup=info,mailsetup_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let database = args.database.unwrap_or_else(paths::database_file);

    match args.command {
        Command::Provision {
            file,
            options,
            providers,
            timeout_ms,
            broadcast,
        } => {
            let settings = args.settings.unwrap_or_else(paths::settings_file);
            let mut config = ProvisioningConfig::load(&settings).await?;
            if let Some(ms) = timeout_ms {
                config = config.with_registrar_timeout(Duration::from_millis(ms));
            }

            let mut request_options = match file {
                Some(path) => request::read_options_file(&path).await?,
                None => Map::new(),
            };
            request::apply_pairs(&mut request_options, &options)?;

            let directory = load_directory(providers).await?;
            let store = open_store(&database).await?;
            let result = provision(config, directory, store, &request_options, broadcast).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(exit_code(&result))
        }
        Command::List => {
            let store = open_store(&database).await?;
            for (id, account) in store.list().await? {
                println!(
                    "{id}\t{}\t{}\t{}://{}:{}\t{}://{}:{}",
                    account.email,
                    account.display_name,
                    account.incoming.protocol,
                    account.incoming.host,
                    account.incoming.port,
                    account.outgoing.protocol,
                    account.outgoing.host,
                    account.outgoing.port,
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Remove { id } => {
            let store = open_store(&database).await?;
            remove(&store, AccountId::new(id), |email| {
                Ok(KeyringRegistrar::delete(email)?)
            })
            .await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Process status for a provisioning result.
fn exit_code(result: &ProvisioningResult) -> ExitCode {
    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Removes an account. Credentials go first so a keyring failure leaves
/// the row in place for another attempt.
async fn remove(
    store: &SqliteAccountStore,
    id: AccountId,
    forget_credentials: impl FnOnce(&str) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let account = store
        .get(id)
        .await?
        .with_context(|| format!("No account with id {id}"))?;
    forget_credentials(&account.email)
        .with_context(|| format!("Failed to delete credentials for {}", account.email))?;
    store.delete(id).await?;
    info!("Removed account {id} ({})", account.email);
    Ok(())
}

/// Runs one request through the worker and returns its result.
async fn provision(
    config: ProvisioningConfig,
    directory: StaticProviderDirectory,
    store: SqliteAccountStore,
    options: &Map<String, serde_json::Value>,
    broadcast: bool,
) -> anyhow::Result<ProvisioningResult> {
    let pipeline = Pipeline::new(config, Arc::new(directory), store, Arc::new(KeyringRegistrar));
    let worker = ProvisioningWorker::spawn(pipeline);

    let mut request = ProvisioningRequest::from_options(options);
    if request.caller.is_none() {
        request.caller = Some("mailsetup-cli".to_string());
    }

    let result = if broadcast {
        let mut results = worker.subscribe();
        worker.submit(request)?;
        results.recv().await.context("Result channel closed")?
    } else {
        let (sink, mut replies) = ChannelSink::new();
        worker.submit(request.with_reply(ReplyMode::targeted(sink)))?;
        replies.recv().await.context("Reply channel closed")?
    };
    worker.shutdown().await?;
    Ok(result)
}

/// Built-in providers, extended from the given file or the default one if present.
async fn load_directory(path: Option<PathBuf>) -> anyhow::Result<StaticProviderDirectory> {
    let mut directory = StaticProviderDirectory::builtin();
    let path = match path {
        Some(path) => path,
        None => {
            let default = paths::providers_file();
            if !tokio::fs::try_exists(&default).await? {
                return Ok(directory);
            }
            default
        }
    };

    let extra = StaticProviderDirectory::load(&path)
        .await
        .with_context(|| format!("Failed to load providers from {}", path.display()))?;
    debug!("Adding {} provider templates", extra.len());
    directory.extend(extra.into_templates());
    Ok(directory)
}

async fn open_store(path: &std::path::Path) -> anyhow::Result<SqliteAccountStore> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let path = path.to_str().context("Database path is not valid UTF-8")?;
    Ok(SqliteAccountStore::new(path).await?)
}
