//! Catalog seeding command.
//!
//! Reads product definitions from a YAML file and inserts them into the
//! catalog. The file is a list of entries:
//!
//! ```yaml
//! - name: "Striped overshirt"
//!   image: "https://cdn.example.com/p/overshirt.png"
//!   category: "men"
//!   new_price: "49.90"
//!   old_price: "69.90"
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::info;

use buyit_api::models::ProductSpec;
use buyit_api::store::{PostgresStore, Store, create_pool};
use buyit_core::{CartLedger, Price};

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    image: String,
    category: String,
    new_price: Decimal,
    old_price: Decimal,
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot
/// be read or parsed, or an insert fails.
pub async fn run(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("BUYIT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "BUYIT_DATABASE_URL not set")?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate the whole file before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let entries: Vec<SeedProduct> = serde_yaml::from_str(&content)?;

    let mut specs = Vec::with_capacity(entries.len());
    for entry in entries {
        let new_price = Price::new(entry.new_price)
            .map_err(|e| format!("{}: new_price {e}", entry.name))?;
        let old_price = Price::new(entry.old_price)
            .map_err(|e| format!("{}: old_price {e}", entry.name))?;
        specs.push(ProductSpec {
            name: entry.name,
            image: entry.image,
            category: entry.category,
            new_price,
            old_price,
        });
    }

    info!(products = specs.len(), "Parsed catalog file");

    let pool = create_pool(&database_url).await?;
    info!("Connected to database");

    let store = Store::Postgres(PostgresStore::new(pool, CartLedger::DEFAULT_CAPACITY));
    for spec in specs {
        let product = store.create_product(spec).await?;
        info!(id = %product.id, name = %product.name, "Inserted product");
    }

    info!("Seeding complete!");
    Ok(())
}
