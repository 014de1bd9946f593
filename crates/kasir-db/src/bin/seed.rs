//! # Seed Data Generator
//!
//! Populates a development database with the stationery store starter
//! set: categories, products, a few members and the default settings.
//!
//! ## Usage
//! ```bash
//! cargo run -p kasir-db --bin seed
//!
//! # Specify database path
//! cargo run -p kasir-db --bin seed -- --db ./data/kasir.db
//! ```

use std::env;

use kasir_core::{DiscountRate, Money, SettingValue, StoreSettings};
use kasir_db::{Database, DbConfig, NewMember, NewProduct};

/// Categories with their products: (name, barcode, price, stock).
const CATALOG: &[(&str, &[(&str, &str, i64, i64)])] = &[
    (
        "Alat Tulis",
        &[
            ("Pulpen Pilot G2 Hitam", "8991234500011", 5_500, 120),
            ("Pulpen Standard AE7", "8991234500028", 2_500, 200),
            ("Pensil 2B Faber-Castell", "8991234500035", 4_000, 150),
            ("Penghapus Joyko", "8991234500042", 2_000, 80),
            ("Spidol Snowman Hitam", "8991234500059", 7_500, 60),
            ("Penggaris 30cm", "8991234500066", 3_000, 90),
        ],
    ),
    (
        "Buku",
        &[
            ("Buku Tulis 38 Lembar", "8991234500103", 3_500, 300),
            ("Buku Tulis 58 Lembar", "8991234500110", 5_000, 250),
            ("Buku Gambar A4", "8991234500127", 6_000, 100),
            ("Buku Kas Kecil", "8991234500134", 8_500, 40),
        ],
    ),
    (
        "Kertas",
        &[
            ("Kertas HVS A4 70gsm (rim)", "8991234500208", 42_000, 35),
            ("Kertas Folio Bergaris (pak)", "8991234500215", 15_000, 50),
            ("Sticky Notes Kuning", "8991234500222", 9_000, 70),
        ],
    ),
    (
        "Perlengkapan Kantor",
        &[
            ("Stapler Kenko HD-10", "8991234500307", 18_000, 25),
            ("Isi Staples No. 10", "8991234500314", 3_500, 110),
            ("Lem Kertas Glukol", "8991234500321", 4_500, 65),
            ("Map Plastik Kancing", "8991234500338", 3_000, 140),
            ("Gunting Kertas Sedang", "8991234500345", 12_000, 30),
        ],
    ),
];

/// Starter members: (name, phone).
const MEMBERS: &[(&str, &str)] = &[
    ("Budi Santoso", "081234567890"),
    ("Siti Aminah", "081298765432"),
    ("Ahmad Wijaya", "085612345678"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./kasir_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("kasir Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasir_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("kasir Seed Data Generator");
    println!("=========================");
    println!("Database: {db_path}");
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    if !db.products().list_active(1).await?.is_empty() {
        println!("⚠ Database already has products, skipping seed.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Settings first so later steps read the intended policy.
    let settings_rows: Vec<(String, SettingValue)> = StoreSettings::default_rows()
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    db.settings().set_many(&settings_rows).await?;
    println!("✓ Default settings written");

    let mut product_count = 0;
    let mut first_product_ids = Vec::new();
    for (category_name, products) in CATALOG {
        let category = db.categories().insert(category_name, None).await?;

        for (name, barcode, price, stock) in *products {
            let product = db
                .products()
                .insert(NewProduct {
                    name: name.to_string(),
                    barcode: Some(barcode.to_string()),
                    price: Money::new(*price),
                    stock: *stock,
                    category_id: Some(category.id.clone()),
                })
                .await?;

            if first_product_ids.len() < 6 {
                first_product_ids.push(product.id);
            }
            product_count += 1;
        }
    }
    println!(
        "✓ {} categories, {} products",
        CATALOG.len(),
        product_count
    );

    let default_rate = DiscountRate::from_bps_clamped(500);
    for (name, phone) in MEMBERS {
        let member = db
            .members()
            .insert(
                NewMember {
                    name: name.to_string(),
                    email: None,
                    phone: Some(phone.to_string()),
                    address: None,
                    discount_rate: None,
                },
                default_rate,
            )
            .await?;
        println!("  {} → {}", member.code, member.name);
    }
    println!("✓ {} members", MEMBERS.len());

    // Fill the quick-access grid with the first few products.
    for id in &first_product_ids {
        db.favorites().add(id).await?;
    }
    println!("✓ {} favorites", first_product_ids.len());

    println!();
    println!("✓ Seed complete!");
    Ok(())
}
