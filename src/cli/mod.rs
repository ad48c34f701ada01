//! Command-line interface for Quill.

mod commands;

use clap::{Parser, Subcommand};

/// Quill - blog platform backend
#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Create an admin account
    CreateAdmin {
        #[arg(long)]
        email: String,

        #[arg(long)]
        username: String,

        /// At least 8 characters
        #[arg(long)]
        password: String,
    },
}

pub use commands::*;
