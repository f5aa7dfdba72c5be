//! seed_catalog - load the product catalog CSV into the SQLite database

use anyhow::Result;
use clap::Parser;

use aisle_finder::catalog::{self, ProductStore, SqliteProductStore};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the product catalog CSV.
    #[arg(long, default_value = "data/products.csv")]
    csv: String,
    /// Path to the SQLite database.
    #[arg(long, default_value = "products.db")]
    db: String,
    /// Clear existing rows before loading.
    #[arg(long)]
    replace: bool,
    /// Print the catalog after loading.
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut store = SqliteProductStore::open(&args.db)?;
    if args.replace {
        store.clear()?;
        log::info!("cleared existing catalog rows in {}", args.db);
    }

    let inserted = catalog::seed_from_csv(&mut store, args.csv.as_ref())?;
    println!(
        "loaded {} products from {} into {} ({} total)",
        inserted,
        args.csv,
        args.db,
        store.len()?
    );

    if args.list {
        for product in store.all_products()? {
            println!(
                "aisle {:>3}  section {:>3}  ${:<7.2} {:<12} {}{}",
                product.aisle,
                product.section,
                product.price,
                product.category,
                product.product_name,
                if product.in_stock {
                    ""
                } else {
                    "  (out of stock)"
                }
            );
        }
    }

    Ok(())
}
