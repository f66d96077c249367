//! Atoll CLI - Main entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt};

use atoll::{Config, HmacType, commands, output};

/// Digest selectable on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum Digest {
    /// HMAC-SHA1
    #[default]
    Sha1,
    /// HMAC-SHA512
    Sha512,
}

impl From<Digest> for HmacType {
    fn from(digest: Digest) -> Self {
        match digest {
            Digest::Sha1 => HmacType::Sha1,
            Digest::Sha512 => HmacType::Sha512,
        }
    }
}

#[derive(Parser)]
#[command(name = "atoll")]
#[command(version, about = "Atoll - repository administration API for code indexing")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the administration API
    #[cfg(feature = "http")]
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Sign a request and print its query string
    Sign {
        /// Public key sent as `pub`
        #[arg(long = "pub", env = "ATOLL_API_PUBLIC_KEY")]
        public_key: String,

        /// Private key used as the HMAC secret
        #[arg(long, env = "ATOLL_API_PRIVATE_KEY", hide_env_values = true)]
        secret: String,

        /// Digest
        #[arg(long, default_value = "sha1")]
        hmac: Digest,

        /// Parameters signed after `pub`, in order (NAME=VALUE)
        params: Vec<String>,
    },

    /// API key management
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Key subcommands
#[derive(Subcommand)]
enum KeysAction {
    /// Generate a new key pair
    Generate,
}

/// Configuration subcommands
#[derive(Subcommand)]
enum ConfigAction {
    /// Show current effective configuration
    Show,

    /// Initialize a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration; environment overrides the file
    let base = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let mut config = base.with_env()?;

    config.debug |= cli.debug;

    // Setup logging; RUST_LOG directives still apply to other targets
    let filter = EnvFilter::from_default_env().add_directive(config.log_directive().parse()?);

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        #[cfg(feature = "http")]
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            commands::serve(&config).await?;
        }
        Commands::Sign {
            public_key,
            secret,
            hmac,
            params,
        } => {
            commands::sign_request(&public_key, &secret, hmac.into(), &params)?;
        }
        Commands::Keys { action } => match action {
            KeysAction::Generate => {
                commands::generate_key()?;
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config_show(&config)?;
            }
            ConfigAction::Init { output } => {
                commands::config_init(output)?;
            }
        },
    }

    Ok(())
}
