use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rand::{Rng, seq::SliceRandom};
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use ofc_rs::{
    CategoryName, Email, Kind, Transaction, create_category, create_transaction, create_user,
    initialize_db,
};

/// A utility for creating a database with sample data for the REST API server of ofc_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many days of transactions to generate, ending today.
    #[arg(long, default_value_t = 90)]
    days: i64,
}

const EXPENSES: [(&str, &str, f64); 5] = [
    ("Groceries", "Food", 80.0),
    ("Coffee", "Food", 6.0),
    ("Bus fare", "Transport", 4.5),
    ("Power bill", "Utilities", 120.0),
    ("Cinema", "Entertainment", 25.0),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path.extension().is_none_or(|extension| extension.is_empty()) {
        eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating test user...");
    let user = create_user(Email::new("test@example.com")?, Some("Test"), &connection)?;

    println!("Creating categories...");
    let mut category_ids = Vec::new();
    for name in ["Income", "Food", "Transport", "Utilities", "Entertainment"] {
        let category = create_category(CategoryName::new(name)?, user.id, &connection)?;
        category_ids.push((name, category.id));
    }
    let category_id = |name: &str| {
        category_ids
            .iter()
            .find(|(category_name, _)| *category_name == name)
            .map(|(_, id)| *id)
    };

    println!("Creating transactions...");
    let mut rng = rand::thread_rng();
    let today = OffsetDateTime::now_utc().date();
    let mut count = 0;

    for day in (0..args.days.max(1)).rev() {
        let date = today - Duration::days(day);

        if day % 14 == 0 {
            create_transaction(
                Transaction::build(2500.0, Kind::Credit, date)
                    .description(Some("Salary"))
                    .category_id(category_id("Income")),
                user.id,
                &connection,
            )?;
            count += 1;
        }

        for _ in 0..rng.gen_range(0..3) {
            let Some(&(description, category, typical_amount)) = EXPENSES.choose(&mut rng) else {
                continue;
            };
            let amount = (typical_amount * rng.gen_range(0.5..1.5) * 100.0).round() / 100.0;

            create_transaction(
                Transaction::build(amount, Kind::Debit, date)
                    .description(Some(description))
                    .category_id(category_id(category)),
                user.id,
                &connection,
            )?;
            count += 1;
        }
    }

    println!("Created {count} transactions.");
    println!("API key for {}: {}", user.email, user.api_key.as_ref());
    println!("Success!");

    Ok(())
}
