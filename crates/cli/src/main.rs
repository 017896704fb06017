//! PhonePlace CLI - a terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! pp-cli products --brand Samsung --max-price 50000
//! pp-cli product 65f1c0ffee
//!
//! # Sign in (demo accounts work while the auth service is down)
//! pp-cli login -e demo@example.com -p password123
//!
//! # Shop
//! pp-cli cart add 65f1c0ffee -q 2
//! pp-cli checkout --address "Moi Avenue, Nairobi"
//! pp-cli orders
//! ```
//!
//! Session and cart persist between invocations in `PHONEPLACE_STATE_DIR`.
//!
//! # Commands
//!
//! - `health` - Check the catalog service
//! - `products`, `product`, `filters` - Browse the catalog
//! - `login`, `signup`, `logout`, `whoami` - Manage the session
//! - `cart` - Show and edit the cart
//! - `checkout`, `orders` - Place and list orders
//! - `admin` - Create, update and delete products (admin accounts only)

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "pp-cli")]
#[command(author, version, about = "PhonePlace storefront in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the catalog service health
    Health,
    /// List products, optionally filtered
    Products(commands::catalog::ProductsArgs),
    /// Show one product
    Product {
        /// Product ID
        id: String,
    },
    /// Show the available filter choices
    Filters,
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account and sign in
    Signup(commands::account::SignupArgs),
    /// Sign out
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Show or edit the cart
    Cart {
        #[command(subcommand)]
        action: Option<commands::cart::CartAction>,
    },
    /// Place an order for the cart contents
    Checkout(commands::orders::CheckoutArgs),
    /// List your orders
    Orders,
    /// Manage catalog products
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Log to stderr so command output on stdout stays clean.
/// `PHONEPLACE_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "phoneplace_client=info,phoneplace_cli=info".into());

    let json = std::env::var("PHONEPLACE_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open()?;

    match cli.command {
        Commands::Health => commands::catalog::health(&ctx).await?,
        Commands::Products(args) => commands::catalog::products(&ctx, args).await?,
        Commands::Product { id } => commands::catalog::product(&ctx, &id).await?,
        Commands::Filters => commands::catalog::filters(&ctx).await?,
        Commands::Login { email, password } => {
            commands::account::login(&mut ctx, email, password).await?;
        }
        Commands::Signup(args) => commands::account::signup(&mut ctx, args).await?,
        Commands::Logout => commands::account::logout(&mut ctx)?,
        Commands::Whoami => commands::account::whoami(&ctx),
        Commands::Cart { action } => commands::cart::run(&mut ctx, action).await?,
        Commands::Checkout(args) => commands::orders::checkout(&mut ctx, args).await?,
        Commands::Orders => commands::orders::list(&ctx).await?,
        Commands::Admin { action } => commands::admin::run(&ctx, action).await?,
    }
    Ok(())
}
