use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use sales_report::{
    DEFAULT_FEED_URL, SeedOutcome, fetch_feed, initialize_db, parse_feed_str, seed_transactions,
};

/// A utility for filling a sales_report database from a JSON transaction feed.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path of the SQLite database to fill. Created if it does not exist.
    #[arg(long, short)]
    db_path: String,

    /// The URL of the transaction feed.
    #[arg(long, default_value = DEFAULT_FEED_URL, conflicts_with = "file")]
    url: String,

    /// Read the transaction feed from a local JSON file instead of a URL.
    #[arg(long, short)]
    file: Option<String>,
}

/// Import the transaction feed into an empty database.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let db_path = Path::new(&args.db_path);

    match db_path.extension() {
        None => {
            eprintln!("Database path must include a file extension (e.g., 'sales.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Database path must include a file extension (e.g., 'sales.db').");
            exit(1);
        }
        _ => {}
    }

    println!("Opening database at {db_path:#?}");
    let conn = Connection::open(db_path)?;

    initialize_db(&conn)?;

    let transactions = match &args.file {
        Some(file) => {
            println!("Reading transactions from {file}...");
            parse_feed_str(&std::fs::read_to_string(file)?)?
        }
        None => {
            println!("Fetching transactions from {}...", args.url);
            fetch_feed(&reqwest::Client::new(), &args.url).await?
        }
    };

    match seed_transactions(transactions, &conn)? {
        SeedOutcome::Seeded(count) => println!("Success! Inserted {count} transactions."),
        SeedOutcome::AlreadySeeded(count) => {
            eprintln!("The database already holds {count} transactions, nothing was imported.");
            exit(1);
        }
    }

    Ok(())
}
