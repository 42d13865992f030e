//! Paperback CLI - database migrations, catalog seeding and order fulfilment.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! pb-cli migrate
//!
//! # Load books, authors and categories from a YAML file
//! pb-cli seed catalog seeds/catalog.yaml
//!
//! # Move a placed order along the fulfilment pipeline
//! pb-cli order advance --id 42 --to in_delivery
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed catalog` - Seed the catalog
//! - `order advance` - Change an order's state

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pb-cli")]
#[command(author, version, about = "Paperback CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage placed orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Load categories, authors and books from a YAML file
    Catalog {
        /// Path to the catalog file
        file: String,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Move an order to its next state
    Advance {
        /// Order ID
        #[arg(short, long)]
        id: i32,

        /// Target state (`in_queue`, `in_delivery`, `delivered`, `canceled`)
        #[arg(short, long)]
        to: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
        Commands::Order { action } => match action {
            OrderAction::Advance { id, to } => commands::order::advance(id, &to).await?,
        },
    }
    Ok(())
}
