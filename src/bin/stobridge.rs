//! stobridge CLI: operator interface to the warehouse transfer bridge.

use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use std::sync::Arc;
use stobridge::config::Config;
use stobridge::db::Db;
use stobridge::error::{Error, Result};
use stobridge::model::{CreateTransfer, ReceiptPosting, ShipmentPosting};
use stobridge::transfer::TransferService;

#[derive(Parser)]
#[command(name = "stobridge", about = "Warehouse transfer bridge over an upstream ERP database")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check database connectivity
    Health,
    /// Transfer workflow actions
    Transfer {
        #[command(subcommand)]
        action: TransferAction,
    },
    /// Query purchase-order approval state for one or more references
    PoState {
        /// Purchase-order reference numbers
        po_numbers: Vec<String>,
    },
    /// Async job operations
    Job {
        #[command(subcommand)]
        action: JobAction,
    },
}

#[derive(Subcommand)]
enum TransferAction {
    /// Create a transfer request from a JSON payload
    Create {
        /// JSON CreateTransfer payload
        #[arg(long)]
        payload: String,
    },
    /// Post a shipment note from a JSON payload
    Ship {
        /// JSON ShipmentPosting payload
        #[arg(long)]
        payload: String,
    },
    /// Post a goods-receipt note from a JSON payload
    Receive {
        /// JSON ReceiptPosting payload
        #[arg(long)]
        payload: String,
    },
    /// Show a transfer head
    Show {
        /// Transfer number or internal id
        reference: String,
    },
}

#[derive(Subcommand)]
enum JobAction {
    /// Record an async job for out-of-band processing
    Submit {
        /// Job type tag (e.g. "create_payment")
        job_type: String,
        /// JSON payload, stored verbatim
        #[arg(long)]
        payload: Option<String>,
    },
    /// Show a recorded job
    Show {
        /// Job id
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    stobridge::telemetry::init_tracing(&config.log_level)?;

    let db = Arc::new(Db::connect(config.database_url.expose_secret()).await?);
    let service = TransferService::new(db.clone());

    if let Err(err) = run(cli.command, &db, &service).await {
        eprintln!("error [{}]: {err}", err.kind());
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, db: &Db, service: &TransferService) -> Result<()> {
    match command {
        Command::Health => {
            db.health_check().await?;
            println!("ok");
        }
        Command::Transfer { action } => match action {
            TransferAction::Create { payload } => {
                let req: CreateTransfer = parse_payload(&payload)?;
                let outcome = service.create(req).await?;
                println!("{} (created: {})", outcome.message, outcome.created);
            }
            TransferAction::Ship { payload } => {
                let posting: ShipmentPosting = parse_payload(&payload)?;
                let outcome = service.post_shipment(posting).await?;
                println!("{}: {} on {}", outcome.message, outcome.shipment_no, outcome.transfer_no);
            }
            TransferAction::Receive { payload } => {
                let posting: ReceiptPosting = parse_payload(&payload)?;
                let outcome = service.post_receipt(posting).await?;
                println!("{}: {} on {}", outcome.message, outcome.receipt_no, outcome.transfer_no);
            }
            TransferAction::Show { reference } => {
                let head = db
                    .transfer_head(&reference)
                    .await?
                    .ok_or(Error::NotFound(reference))?;
                println!("ID:            {}", head.id);
                println!("Number:        {}", head.name.as_deref().unwrap_or("-"));
                println!("State:         {}", head.state);
                println!("Shipment refs: {}", render_ledger(&head.shipment_refs));
                println!("Receipt refs:  {}", render_ledger(&head.receipt_refs));
            }
        },
        Command::PoState { po_numbers } => {
            let results = service.purchase_state(&po_numbers).await?;
            for status in results {
                println!(
                    "{:<20}  approved={:<5}  {}",
                    status.po_number, status.approved, status.message
                );
            }
        }
        Command::Job { action } => match action {
            JobAction::Submit { job_type, payload } => {
                let payload = match payload {
                    Some(json) => parse_payload(&json)?,
                    None => serde_json::json!({}),
                };
                let job_id = db.enqueue_job(&job_type, payload).await?;
                println!("queued: job {job_id}");
            }
            JobAction::Show { id } => {
                let job = db.job(id).await?;
                println!("ID:       {}", job.id);
                println!("Type:     {}", job.job_type);
                println!("Status:   {}", job.status);
                println!(
                    "Payload:  {}",
                    serde_json::to_string_pretty(&job.payload)
                        .map_err(|e| Error::Other(e.to_string()))?
                );
                if let Some(ref err) = job.error {
                    println!("Error:    {err}");
                }
                println!("Created:  {}", job.created_at);
                println!("Updated:  {}", job.updated_at);
            }
        },
    }
    Ok(())
}

fn parse_payload<T: serde::de::DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| Error::Validation(format!("malformed payload: {e}")))
}

fn render_ledger(ledger: &stobridge::ledger::Ledger) -> String {
    if ledger.is_empty() {
        "-".to_string()
    } else {
        ledger.join()
    }
}
