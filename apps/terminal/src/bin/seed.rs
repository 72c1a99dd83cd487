//! # Seed Data Generator
//!
//! Populates a Data Store with demo settings, products and an
//! employee, then rings up one sale for a demo customer and prepares that
//! month's salary.
//!
//! ## Usage
//! ```bash
//! # Seed the configured store (config.toml / TALLY_* env)
//! cargo run -p tally-terminal --bin seed
//!
//! # Explicit SQLite file and product count
//! cargo run -p tally-terminal --bin seed -- --db ./data/tally.db --count 40
//!
//! # Throwaway in-memory run
//! cargo run -p tally-terminal --bin seed -- --memory
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde_json::json;
use tally_core::{
    CashierRef, Employee, EmployeeStatus, Money, PaymentMethod, Percent, Product, Role, Settings,
};
use tally_store::{paths, set_typed, DataStore};
use tally_terminal::{
    init_tracing, open_store, AppConfig, CheckoutService, CustomerService, PayrollService,
    SalaryOutcome, Session, StoreBackend,
};

/// (key prefix, names)
const CATEGORIES: &[(&str, &[&str])] = &[
    ("BEV", &["Cola", "Orange Juice", "Mineral Water", "Iced Tea", "Coffee"]),
    ("SNK", &["Potato Chips", "Chocolate Bar", "Cookies", "Pretzels", "Peanuts"]),
    ("DRY", &["Whole Milk", "Cheddar", "Butter", "Yogurt", "Eggs Dozen"]),
    ("GRO", &["Rice 1kg", "Pasta", "Flour", "Sugar", "Canned Beans"]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config = AppConfig::load(None)?;
    let mut count: usize = 20;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.store.backend = StoreBackend::Sqlite;
                    config.store.database_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--branch" | "-b" => {
                if i + 1 < args.len() {
                    config.terminal.branch_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--memory" | "-m" => config.store.backend = StoreBackend::Memory,
            "--help" | "-h" => {
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of products to generate (default: 20)");
                println!("  -d, --db <PATH>      SQLite file to seed");
                println!("  -b, --branch <ID>    Branch to seed (default: from config)");
                println!("  -m, --memory         Use a throwaway in-memory store");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }
    config.validate()?;
    init_tracing(&config.logging.filter);

    let branch_id = config.branch_id().to_string();
    println!("Tally POS Seed Data Generator");
    println!("=============================");
    println!("Backend:  {:?}", config.store.backend);
    if config.store.backend == StoreBackend::Sqlite {
        println!("Database: {}", config.database_path().display());
    }
    println!("Branch:   {}", branch_id);
    println!();

    let store = open_store(&config).await?;
    println!("✓ Store opened");

    if store.get(&paths::products(&branch_id)).await?.is_some() {
        println!("⚠ Branch {} already has products", branch_id);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    seed_reference_data(store.as_ref(), &branch_id).await?;
    println!("✓ Settings, branch and employee written");

    let generated = seed_products(store.as_ref(), &branch_id, count).await?;
    println!("✓ Generated {} products", generated);

    demo_sale(store.clone(), &branch_id).await?;

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

async fn seed_reference_data(
    store: &dyn DataStore,
    branch_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if store.get(paths::SETTINGS).await?.is_none() {
        let mut settings = Settings::default();
        settings.store.name = "Tally Demo Store".to_string();
        settings.loyalty.enabled = true;
        set_typed(store, paths::SETTINGS, &settings).await?;
    }

    store
        .set(&paths::branch(branch_id), json!({ "name": format!("Branch {}", branch_id) }))
        .await?;

    set_typed(
        store,
        &paths::employee("emp1"),
        &Employee {
            id: String::new(),
            name: "Dana Demo".to_string(),
            base_salary: Money::from_major(1200),
            commission_rate: Percent::from_bps(300),
            allowance: Money::from_major(50),
            status: EmployeeStatus::Active,
            branch_id: Some(branch_id.to_string()),
        },
    )
    .await?;
    Ok(())
}

async fn seed_products(
    store: &dyn DataStore,
    branch_id: &str,
    count: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut writes = std::collections::BTreeMap::new();

    let all = CATEGORIES
        .iter()
        .flat_map(|(code, names)| names.iter().map(move |name| (*code, *name)));
    for (seed, (code, name)) in all.cycle().take(count).enumerate() {
        let product = generate_product(code, name, seed, branch_id);
        writes.insert(
            paths::product(branch_id, &format!("{}-{:03}", code, seed)),
            serde_json::to_value(&product)?,
        );
    }

    let generated = writes.len();
    store.update(writes).await?;
    Ok(generated)
}

/// Deterministic demo product; the round number keeps cycled names distinct.
fn generate_product(category: &str, name: &str, seed: usize, branch_id: &str) -> Product {
    let round = seed / 20;
    let display = if round == 0 {
        name.to_string()
    } else {
        format!("{} #{}", name, round + 1)
    };

    Product {
        id: String::new(),
        name: display,
        // $0.99 - $9.99
        price: Money::from_minor(99 + ((seed * 47) % 900) as i64),
        category_id: Some(category.to_string()),
        stock: (seed % 30) as i64,
        barcode: Some(format!("590{:010}", seed)),
        description: None,
        branch_id: branch_id.to_string(),
    }
}

async fn demo_sale(
    store: Arc<dyn DataStore>,
    branch_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("Ringing up a demo sale...");

    let cashier = CashierRef {
        id: "emp1".to_string(),
        full_name: "Dana Demo".to_string(),
    };
    let mut session = Session::start(store.as_ref(), cashier, Role::Cashier, branch_id).await?;

    let customers = CustomerService::new(store.clone());
    let customer = match customers.find_by_phone("555-0100").await? {
        Some(existing) => existing,
        None => customers.create("Sam Sample", Some("555-0100".to_string()), None).await?,
    };

    let checkout = CheckoutService::new(store.clone());
    let in_stock: Vec<String> = session
        .products()
        .iter()
        .filter(|p| p.stock > 1)
        .take(3)
        .map(|p| p.id.clone())
        .collect();
    for id in &in_stock {
        checkout.add_to_cart(&mut session, id)?;
    }
    if in_stock.is_empty() {
        println!("  No products in stock, skipping sale.");
        return Ok(());
    }

    let totals = checkout.begin_payment(&mut session)?;
    // Round the tender up to the next whole unit.
    let paid = Money::from_minor((totals.total.minor() + 99) / 100 * 100);
    let receipt = checkout
        .complete_checkout(
            &mut session,
            paid,
            PaymentMethod::Cash,
            Some(customer.reference()),
            None,
        )
        .await?;

    println!("  Invoice {}: {}", receipt.invoice.number, receipt.formatted_total);
    println!("  Change:  {}", receipt.formatted_change);
    println!("  Points:  {}", receipt.points_earned);
    for warning in &receipt.warnings {
        println!("  ⚠ {}", warning);
    }

    let payroll = PayrollService::new(store);
    let now = Utc::now();
    let input = payroll.prepare_salary("emp1", now.month(), now.year()).await?;
    match payroll.save_salary(&input, true).await? {
        SalaryOutcome::Created(r) | SalaryOutcome::Updated(r) => {
            println!("  Salary {}: net {}", r.period().key(), r.net_salary);
        }
        SalaryOutcome::NeedsConfirmation(_) => {}
    }
    Ok(())
}
