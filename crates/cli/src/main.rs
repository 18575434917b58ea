//! Tierra Querida CLI - Database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! tq-cli migrate
//!
//! # Load the menu, stores and landing content into an empty database
//! tq-cli seed crates/cli/seed/catalogo.yaml
//!
//! # Replace the menu and landing content, update stores
//! tq-cli seed crates/cli/seed/catalogo.yaml --replace
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tq-cli")]
#[command(author, version, about = "Tierra Querida CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load the catalog from a YAML file
    Seed {
        /// Path to the catalog file
        file: String,

        /// Replace existing menu and landing content
        #[arg(long)]
        replace: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, replace } => {
            commands::seed::catalog(&file, replace).await?;
        }
    }
    Ok(())
}
