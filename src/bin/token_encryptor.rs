//! token-encryptor: encrypt OAuth2 client secrets, tokens and authorization codes in place
//!
//! Run once, during an upgrade window, with the identity server stopped.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rpassword::read_password;
use token_encryptor::consts::ENV_PASSPHRASE;
use token_encryptor::{
    load_config, open_identity_db, AescryptProvider, CancelToken, EncryptionGateway, EntityKind,
    MigrationOptions, Migrator, ProviderPassphrase, SqliteRepository,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "token-encryptor", version)]
#[command(about = "Encrypt plaintext OAuth2 credentials stored in the identity database")]
#[command(
    long_about = "Encrypt plaintext OAuth2 credentials stored in the identity database.\n\n\
    Each table is migrated in its own transaction: a failed table is left untouched \
    and can be retried. A table that was migrated successfully must NOT be migrated \
    again unless a state table is configured ([migration] state_table): a second run \
    encrypts the ciphertext again."
)]
struct Cli {
    /// Config file (default: $TOKEN_ENCRYPTOR_CONFIG or ./token-encryptor.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Identity database, overrides [database] path
    #[arg(long, value_name = "PATH")]
    database: Option<String>,

    /// Only migrate these entity types (applications, access-tokens, authorization-codes)
    #[arg(long, value_name = "KIND")]
    only: Vec<EntityKind>,

    /// Read and encrypt everything, write nothing
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Migrate tables the state table already records as done
    #[arg(long)]
    force: bool,

    /// Abort the run after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Also write the JSON summary to this file
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    if config.migration.state_table.is_none() && !cli.dry_run {
        warn!("no state table configured: this tool must run exactly once per table");
    }

    let passphrase = read_passphrase()?;
    let provider = AescryptProvider::new(&passphrase, config.provider.kdf_iterations)
        .context("failed to initialise encryption provider")?;
    let gateway = EncryptionGateway::new(provider);

    let conn = open_identity_db(&config.database)
        .with_context(|| format!("failed to open identity database {}", config.database.path))?;
    let mut repo = match &config.migration.state_table {
        Some(state_table) => SqliteRepository::with_state_table(conn, state_table),
        None => SqliteRepository::new(conn),
    };

    let cancel = cli
        .timeout
        .map(|secs| CancelToken::with_timeout(Duration::from_secs(secs)))
        .unwrap_or_default();

    let options = MigrationOptions {
        dry_run: cli.dry_run,
        force: cli.force,
        only: cli.only,
    };
    let summary = Migrator::new(&mut repo, &gateway, config.entity_specs())
        .with_options(options)
        .run(&cancel);

    if cli.json {
        println!("{}", summary.to_json()?);
    } else {
        println!("{summary}");
    }

    if let Some(path) = cli.report {
        std::fs::write(&path, summary.to_json()?)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    Ok(if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Passphrase from the environment, otherwise prompt without echo
fn read_passphrase() -> Result<ProviderPassphrase> {
    if let Ok(passphrase) = std::env::var(ENV_PASSPHRASE) {
        return Ok(ProviderPassphrase::new(passphrase));
    }

    eprint!("Encryption passphrase: ");
    std::io::stderr().flush()?;
    let input = read_password().context("failed to read passphrase")?;
    Ok(ProviderPassphrase::new(input.trim_end().to_owned()))
}
