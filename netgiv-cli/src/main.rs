//! # netgiv
//!
//! Copy and paste over a private netgiv relay.
//!
//! ## Commands
//!
//! - `copy`: Store stdin (or a file) on the server
//! - `paste`: Write a stored object to stdout (or a file)
//! - `list`: Show stored objects
//! - `burn`: Delete a stored object
//! - `serve`: Run a relay server
//!
//! Without a command the mode follows the terminal: piped stdin copies,
//! piped stdout pastes, anything else lists.
//!
//! ## Example
//!
//! ```bash
//! # On the server
//! NETGIV_AUTHTOKEN=secret netgiv serve
//!
//! # On any client
//! echo "hello world" | netgiv
//! netgiv > hello.txt
//! netgiv list --json
//! netgiv burn 1
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use netgiv_types::ObjectId;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{burn, copy, list, paste, serve};
use config::Settings;

/// Copy and paste over a private netgiv relay.
#[derive(Parser, Debug)]
#[command(name = "netgiv")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where the server is and how to authenticate.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Config file (default: ~/.config/netgiv/config.toml)
    #[arg(long, global = true, env = "NETGIV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server address
    #[arg(long, short, global = true, env = "NETGIV_ADDRESS")]
    pub address: Option<String>,

    /// Server port
    #[arg(long, short, global = true, env = "NETGIV_PORT")]
    pub port: Option<u16>,

    /// Shared auth token
    #[arg(long, global = true, env = "NETGIV_AUTHTOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store data on the server
    Copy {
        /// File to send (default: stdin)
        file: Option<PathBuf>,

        /// Name to store with the data (default: the file's name)
        #[arg(long, short)]
        name: Option<String>,
    },

    /// Fetch stored data
    Paste {
        /// Object id (0 or omitted: most recent)
        #[arg(default_value_t = 0)]
        id: u32,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List stored objects
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete a stored object
    Burn {
        /// Object id (0 or omitted: most recent)
        #[arg(default_value_t = 0)]
        id: u32,
    },

    /// Run a relay server
    Serve {
        /// Server config file; without one the server binds every
        /// interface on the resolved port with the resolved token
        #[arg(long)]
        server_config: Option<PathBuf>,
    },
}

/// Operation picked when no subcommand is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Copy,
    Paste,
    List,
}

/// Piped input means copy, piped output means paste, otherwise list.
fn auto_mode(stdin_is_tty: bool, stdout_is_tty: bool) -> Mode {
    match (stdin_is_tty, stdout_is_tty) {
        (false, true) => Mode::Copy,
        (true, false) => Mode::Paste,
        _ => Mode::List,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Quiet by default so piped stdout stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or_else(|| {
        let mode = auto_mode(std::io::stdin().is_terminal(), std::io::stdout().is_terminal());
        tracing::debug!(?mode, "No command given");
        match mode {
            Mode::Copy => Commands::Copy {
                file: None,
                name: None,
            },
            Mode::Paste => Commands::Paste {
                id: 0,
                output: None,
            },
            Mode::List => Commands::List { json: false },
        }
    });

    let client = || Settings::resolve(&cli.connection).map(|settings| settings.client());

    match command {
        Commands::Copy { file, name } => copy::run(&client()?, file.as_deref(), name).await,
        Commands::Paste { id, output } => {
            paste::run(&client()?, ObjectId::new(id), output.as_deref()).await
        }
        Commands::List { json } => list::run(&client()?, json).await,
        Commands::Burn { id } => burn::run(&client()?, ObjectId::new(id)).await,
        Commands::Serve { server_config } => serve::run(&cli.connection, server_config.as_deref()).await,
    }
}
