//! # Cart Session Demo
//!
//! Runs a short cart session against a SQLite file and prints the totals.
//!
//! ## Usage
//! ```bash
//! # In-memory database, default pricing
//! cargo run -p basket-db --bin demo
//!
//! # Persist to a file
//! cargo run -p basket-db --bin demo -- --db ./basket_dev.db
//!
//! # Pricing from the environment
//! BASKET_TAX_RATE=19 BASKET_SHIPPING_CENTS=499 cargo run -p basket-db --bin demo
//! ```
//!
//! ## Session
//! 1. Two books, then one more of the same book at a different price (merged)
//! 2. Three pens
//! 3. One pen removed
//! 4. Totals printed; the cart is deleted unless `--keep` is given

use std::env;

use basket_core::{CartAggregator, CartConfig, Money, ProductRef};
use basket_db::{Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<String> = None;
    let mut keep = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--keep" | "-k" => keep = true,
            "--help" | "-h" => {
                println!("Basket Cart Demo");
                println!();
                println!("Usage: demo [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: in-memory)");
                println!("  -k, --keep         Keep the cart in the database afterwards");
                println!("  -h, --help         Show this help message");
                println!();
                println!("Environment:");
                println!("  BASKET_CURRENCY, BASKET_DEFAULT_CURRENCY,");
                println!("  BASKET_TAX_RATE, BASKET_SHIPPING_CENTS");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let policy = CartConfig::from_env()?;
    info!(?policy, "Pricing policy loaded");

    let config = match &db_path {
        Some(path) => DbConfig::new(path),
        None => DbConfig::in_memory(),
    };
    let db = Database::new(config).await?;

    let cart_row = db.carts().create().await?;
    info!(cart_id = %cart_row.id, "Cart created");

    let currency = policy
        .registered_currency
        .unwrap_or(policy.default_currency);
    let price = |cents| Money::from_cents(cents, currency);

    let book = ProductRef::new("Book", "978-0134685991");
    let pen = ProductRef::new("Pen", "blue");

    let mut cart = CartAggregator::with_policy(db.line_items(&cart_row.id), policy);

    cart.add(&book, price(4599), 2, true).await?;
    cart.add(&book, price(3999), 1, true).await?;
    cart.add(&pen, price(150), 3, true).await?;
    cart.remove_one(&pen).await?;

    println!("Cart {}", cart_row.id);
    println!("================================");
    for item in cart.line_items().await? {
        println!(
            "  {:<24} {:>3} x {:>12} = {}",
            item.product().to_string(),
            item.quantity(),
            item.unit_price().to_string(),
            item.line_total()?
        );
    }

    let totals = cart.totals().await?;
    println!("--------------------------------");
    println!("  Items:     {} ({} units)", totals.item_count, totals.total_quantity);
    println!("  Subtotal:  {}", totals.subtotal);
    println!("  Tax ({}%): {}", totals.tax_rate.percentage(), totals.taxes);
    println!("  Shipping:  {}", totals.shipping);
    println!("  Total:     {}", totals.total);

    if !keep {
        db.carts().delete(&cart_row.id).await?;
        info!(cart_id = %cart_row.id, "Cart deleted");
    }

    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=basket=trace` - Show trace for basket crates only
/// - Default: INFO level, basket crates at DEBUG
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,basket=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
