use std::{env, fs::File, process};

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use credit_engine::Engine;
use credit_engine::backfill::BackfillGenerator;
use credit_engine::domain::{Error, SourceRecord};
use credit_engine::ingestion::{JsonArraySource, RawCustomerRecord, RawTransactionRecord};
use credit_engine::repository::{MemoryCustomers, MemoryLedger, MemoryRatings};

struct Args {
    source_path: String,
    customers_path: String,
    transactions_path: String,
    allow_overdraft: bool,
    seed: Option<u64>,
}

fn parse_args() -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut allow_overdraft = false;
    let mut seed = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--allow-overdraft" => allow_overdraft = true,
            "--seed" => {
                let value = args.next().ok_or("--seed requires a value")?;
                seed = Some(value.parse::<u64>().map_err(|e| format!("invalid seed: {e}"))?);
            }
            other if other.starts_with("--") => return Err(format!("unknown flag: {other}")),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    match (positional.next(), positional.next(), positional.next()) {
        (Some(source_path), Some(customers_path), Some(transactions_path)) => Ok(Args {
            source_path,
            customers_path,
            transactions_path,
            allow_overdraft,
            seed,
        }),
        _ => Err("expected <source-registry.json> <customer-batch.json> <transaction-batch.json>".into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!(
                "usage: credit_engine <source-registry.json> <customer-batch.json> \
                 <transaction-batch.json> [--allow-overdraft] [--seed N]"
            );
            process::exit(2);
        }
    };

    let source: Vec<SourceRecord> = serde_json::from_reader(File::open(&args.source_path)?)?;
    let mut engine = Engine::new(
        MemoryCustomers::with_source(source),
        MemoryLedger::new(),
        MemoryRatings::new(),
    );

    let customer_batch: JsonArraySource<RawCustomerRecord> =
        JsonArraySource::new(File::open(&args.customers_path)?)?;
    let customer_report = match engine.import_customers(customer_batch).await {
        Ok(report) => report,
        Err(Error::BatchEmpty(logs)) => {
            eprintln!("no valid customers imported; see logs for details");
            println!("{}", serde_json::to_string_pretty(&logs)?);
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut generator = BackfillGenerator::new(rng, Utc::now());

    let transaction_batch: JsonArraySource<RawTransactionRecord> =
        JsonArraySource::new(File::open(&args.transactions_path)?)?;
    let report = match engine.run(transaction_batch, args.allow_overdraft, &mut generator).await {
        Ok(report) => report,
        Err(Error::BatchEmpty(logs)) => {
            eprintln!("no valid transactions imported; see logs for details");
            println!("{}", serde_json::to_string_pretty(&logs)?);
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let output = serde_json::json!({
        "customers": customer_report,
        "pipeline": report,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
