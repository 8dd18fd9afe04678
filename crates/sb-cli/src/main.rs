//! signbridge CLI
//!
//! Drives the locally installed signing agent:
//! - agent checks (version, install, devices)
//! - certificate listing
//! - signing files and changing key passwords

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sb_client::SigningService;
use signbridge::commands::{self, HardwareKind, SignArgs};

#[derive(Parser)]
#[command(name = "signbridge")]
#[command(author, version, about = "Command-line driver for the local signing agent")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "SIGNBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Connect to the agent's plain (non-TLS) port
    #[arg(long, global = true)]
    insecure: bool,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log level filter (overrides -v/-q)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signing agent version and supported features
    Version,

    /// Check the agent version and register API keys
    Install,

    /// List certificates available for signing
    List {
        /// Show detailed information
        #[arg(short, long)]
        long: bool,
        /// Print the directory as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign a file and print the base64 PKCS#7 container
    Sign {
        /// File to sign
        file: PathBuf,
        /// Certificate id from `list` (optional when only one exists)
        #[arg(short, long)]
        id: Option<String>,
        /// Write the signature to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Produce a detached signature
        #[arg(short, long)]
        detached: bool,
        /// Verify the key password right after loading
        #[arg(long)]
        verify_password: bool,
        /// The input file already contains base64 text
        #[arg(long)]
        base64: bool,
        /// Sign on a hardware device instead of a listed certificate
        #[arg(long, value_enum, conflicts_with = "id")]
        hardware: Option<HardwareKind>,
    },

    /// Change the password or PIN protecting a key
    ChangePassword {
        /// Certificate id from `list` (optional when only one exists)
        #[arg(short, long)]
        id: Option<String>,
    },

    /// Show which hardware signers are connected
    Devices,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match (&cli.log_level, cli.quiet, cli.verbose) {
        (Some(level), _, _) => level.clone(),
        (None, true, _) => "error".into(),
        (None, false, 0) => "warn".into(),
        (None, false, 1) => "info".into(),
        (None, false, 2) => "debug".into(),
        (None, false, _) => "trace".into(),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or(log_level),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => commands::config_show(cli.config.as_ref()),
            ConfigAction::Init { force } => commands::config_init(cli.config.as_ref(), *force),
            ConfigAction::Path => commands::config_path(cli.config.as_ref()),
        };
    }

    let mut config = commands::load_or_default(cli.config.as_ref())?;
    if cli.insecure {
        config.secure = false;
    }
    tracing::debug!(url = %config.endpoint_url(), "Using signing agent endpoint");
    let mut service = SigningService::new(&config);

    match cli.command {
        Commands::Version => commands::version_command(&mut service).await?,
        Commands::Install => commands::install_command(&mut service).await?,
        Commands::List { long, json } => commands::list_command(&mut service, long, json).await?,
        Commands::Sign {
            file,
            id,
            output,
            detached,
            verify_password,
            base64,
            hardware,
        } => {
            let args = SignArgs {
                file,
                id,
                output,
                detached,
                verify_password,
                base64_input: base64,
                hardware,
            };
            commands::sign_command(&mut service, &args).await?;
        }
        Commands::ChangePassword { id } => {
            commands::change_password_command(&mut service, id.as_deref()).await?
        }
        Commands::Devices => commands::devices_command(&mut service).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
