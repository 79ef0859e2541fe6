//! # Seed Data Generator
//!
//! Populates the database with test products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p mostrador-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p mostrador-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p mostrador-db --bin seed -- --db ./data/mostrador.db
//! ```
//!
//! ## Generated Products
//! Creates realistic kiosk/minimarket data across categories:
//! - Beverages (sodas, water, juice)
//! - Snacks (chips, candy, cookies)
//! - Bakery (bread, pastry)
//! - Cleaning (detergent, soap)
//! - Grocery (canned goods, pasta, rice)
//!
//! Each product has a unique code `{CATEGORY}-{INDEX}`, a deterministic
//! pseudo-random price, and stock between 0 and 99 so sellable and
//! low-stock listings both have material to show.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use mostrador_core::Product;
use mostrador_db::{Database, DbConfig};

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Coca-Cola",
            "Pepsi",
            "Sprite",
            "Fanta",
            "Sparkling Water",
            "Still Water",
            "Orange Juice",
            "Apple Juice",
            "Iced Tea",
            "Energy Drink",
            "Lemonade",
            "Coffee Can",
        ],
    ),
    (
        "SNK",
        &[
            "Potato Chips",
            "Nacho Chips",
            "Cheese Puffs",
            "Pretzels",
            "Chocolate Bar",
            "Gummy Bears",
            "Sandwich Cookies",
            "Wafer Cookies",
            "Peanuts",
            "Popcorn",
            "Granola Bar",
            "Crackers",
        ],
    ),
    (
        "BAK",
        &[
            "White Bread",
            "Wheat Bread",
            "Croissant",
            "Baguette",
            "Muffin",
            "Donut",
            "Bagel",
            "Empanada",
        ],
    ),
    (
        "CLN",
        &[
            "Dish Soap",
            "Laundry Detergent",
            "Bleach",
            "Hand Soap",
            "Paper Towels",
            "Toilet Paper",
            "Sponges",
            "Glass Cleaner",
        ],
    ),
    (
        "GRO",
        &[
            "Spaghetti",
            "Penne",
            "White Rice",
            "Canned Beans",
            "Canned Corn",
            "Canned Tomatoes",
            "Cereal",
            "Oatmeal",
            "Sugar",
            "Salt",
            "Flour",
            "Cooking Oil",
        ],
    ),
];

/// Size variants for products
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 100),
    ("Large", 200),
    ("500ml", 50),
    ("1L", 150),
    ("6-Pack", 300),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./mostrador_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mostrador POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./mostrador_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Mostrador POS Seed Data Generator");
    println!("====================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate products
    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    for (category_idx, (category_code, products)) in CATEGORIES.iter().enumerate() {
        for (product_idx, product_name) in products.iter().enumerate() {
            for (size_idx, (size_name, price_addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break;
                }

                let product = generate_product(
                    category_code,
                    product_name,
                    size_name,
                    *price_addon,
                    category_idx * 1000 + product_idx * 20 + size_idx,
                );

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.code, e);
                    continue;
                }

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }

            if generated >= count {
                break;
            }
        }

        if generated >= count {
            break;
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    // Verify listings
    println!();
    println!("Verifying catalog reads...");
    let search_results = db.products().search("cola", 10).await?;
    println!("  Search 'cola': {} results", search_results.len());

    let low = db.products().list_low_stock().await?;
    println!("  Low stock: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic pseudo-random data.
fn generate_product(
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();

    // Cheap deterministic "randomness" from the seed index.
    let price_base = 99 + ((seed * 37) % 1900) as i64;
    let price_cents = price_base + price_addon;
    let cost_cents = price_cents * 60 / 100;
    let stock = ((seed * 13) % 100) as i64;
    let min_stock = 5 + ((seed * 7) % 10) as i64;

    Product {
        id: Uuid::new_v4().to_string(),
        code: format!("{}-{:04}", category, seed),
        name: format!("{} {}", name, size),
        description: None,
        category: Some(category.to_string()),
        price_cents,
        cost_cents,
        stock,
        min_stock,
        active: true,
        created_at: now,
        updated_at: now,
    }
}
