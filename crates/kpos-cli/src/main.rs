use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "kpos")]
#[command(about = "Kiosk order engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> terminal...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print a cart's lines and totals
    Price {
        /// Catalog JSON; when given, prices are re-derived from it
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        cart: PathBuf,
        /// Config layers in merge order
        #[arg(long = "config")]
        config: Vec<String>,
    },

    /// Validate a mutation request against a cart (dry run unless --write)
    Mutate {
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Cart JSON; a missing file is an empty cart
        #[arg(long)]
        cart: PathBuf,
        /// Mutation request JSON as sent by the ordering agent
        #[arg(long)]
        request: PathBuf,
        /// Write the mutated cart back to --cart
        #[arg(long, default_value_t = false)]
        write: bool,
        #[arg(long = "config")]
        config: Vec<String>,
    },

    /// Place an order from a cart file and empty the cart
    Checkout {
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        cart: PathBuf,
        /// Where to write the placed order JSON
        #[arg(long)]
        out: PathBuf,
        #[arg(long = "config")]
        config: Vec<String>,
    },

    /// Check an order against cooked stock
    Readiness {
        #[arg(long)]
        order: PathBuf,
        /// Cooked stock JSON: { "<recipeId>": servings }
        #[arg(long)]
        stock: PathBuf,
        /// Catalog JSON, used for the cook plan
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long = "config")]
        config: Vec<String>,
    },

    /// Apply a kitchen event (start | ready | complete | cancel) to an order
    OrderStatus {
        #[arg(long)]
        order: PathBuf,
        #[arg(long)]
        event: String,
    },
}

fn main() -> Result<()> {
    // Dev convenience; silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = kpos_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Price {
            catalog,
            cart,
            config,
        } => commands::cart::price(catalog, &cart, &config)?,

        Commands::Mutate {
            catalog,
            cart,
            request,
            write,
            config,
        } => commands::cart::mutate(catalog, &cart, &request, write, &config)?,

        Commands::Checkout {
            catalog,
            cart,
            out,
            config,
        } => commands::cart::checkout(catalog, &cart, &out, &config)?,

        Commands::Readiness {
            order,
            stock,
            catalog,
            config,
        } => commands::kitchen::readiness(&order, &stock, catalog, &config)?,

        Commands::OrderStatus { order, event } => commands::kitchen::advance(&order, &event)?,
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
