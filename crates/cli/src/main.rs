//! Preluda CLI - database, catalog and order management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! preluda migrate
//!
//! # Validate the catalog and alias table, then load it into Postgres
//! preluda catalog check
//! preluda catalog seed --batch-size 100
//!
//! # See where a URL slug lands and what it costs
//! preluda resolve laju-kuje cas-bang --explain
//! preluda price bass
//!
//! # Place an order described in a YAML file
//! preluda checkout order.yaml --dry-run
//!
//! # Manage stored orders
//! preluda orders list --status pending
//! preluda orders set-status <ORDER_ID> shipped --notes "Post Express 123"
//! ```
//!
//! Configuration is read from the environment (and `.env`); see
//! `preluda_storefront::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use preluda_core::{OrderId, OrderStatus};
use preluda_storefront::StorefrontConfig;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "preluda")]
#[command(author, version, about = "Preluda storefront CLI tools")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Validate or seed the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Resolve URL slugs to catalog products
    Resolve {
        /// Inputs to resolve, as they would appear in a URL
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Also print which matching rule applied
        #[arg(short, long)]
        explain: bool,
    },
    /// Print prices for a product
    Price {
        /// Product slug or any input the resolver accepts
        product: String,

        /// Size ID (prints the full table when omitted)
        #[arg(short, long, requires = "finish")]
        size: Option<String>,

        /// Finish ID
        #[arg(short, long, requires = "size")]
        finish: Option<String>,
    },
    /// Submit an order described in a YAML file
    Checkout {
        /// Path to the order file
        file: PathBuf,

        /// Keep the order in memory instead of writing it to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect and update stored orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Validate the catalog and alias table
    Check,
    /// Upsert the catalog into the database
    Seed {
        /// Products committed per transaction (at most 499)
        #[arg(short, long, default_value_t = preluda_storefront::db::products::MAX_BATCH_SIZE)]
        batch_size: usize,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        /// Only show orders with this status
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Move an order to a new status
    SetStatus {
        /// Order ID
        id: OrderId,

        /// New status (`processing`, `shipped`, `delivered`, `canceled`)
        status: OrderStatus,

        /// Replace the order's admin notes
        #[arg(short, long)]
        notes: Option<String>,
    },
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "preluda_storefront=info,preluda_cli=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() {
    // Load .env before the filter reads RUST_LOG
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&config).await?,
        Commands::Catalog { action } => match action {
            CatalogAction::Check => commands::catalog::check(&config)?,
            CatalogAction::Seed { batch_size } => {
                commands::catalog::seed(&config, batch_size).await?;
            }
        },
        Commands::Resolve { inputs, explain } => {
            commands::catalog::resolve(&config, &inputs, explain)?;
        }
        Commands::Price {
            product,
            size,
            finish,
        } => commands::catalog::price(&config, &product, size.zip(finish))?,
        Commands::Checkout { file, dry_run } => {
            commands::checkout::run(&config, &file, dry_run).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List { status } => commands::orders::list(&config, status).await?,
            OrdersAction::SetStatus { id, status, notes } => {
                commands::orders::set_status(&config, id, status, notes).await?;
            }
        },
    }
    Ok(())
}
