//! Command-line interface for oxo_server.

use clap::{Parser, Subcommand};

/// Oxo Server - networked tic-tac-toe with an unbeatable bot
#[derive(Parser, Debug)]
#[command(name = "oxo_server")]
#[command(about = "Tic-tac-toe game server with live updates", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Http {
        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
