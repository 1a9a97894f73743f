use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use target_sherpaan::client::SherpaClient;
use target_sherpaan::sink::{PurchaseOrderSink, Submission};
use target_sherpaan::{config, model};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// JSON-lines input file; reads stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let client = SherpaClient::from_config(&cfg);
    let sink = PurchaseOrderSink::new(&cfg);
    info!(endpoint = %cfg.endpoint(), "starting purchase-order target");

    let reader: Box<dyn AsyncBufRead + Unpin> = match &args.input {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    // Records are processed strictly one at a time, in input order. A failed
    // record never stops the stream; only invalid configuration is fatal.
    let mut submitted = 0u64;
    let mut skipped = 0u64;
    let mut failed = 0u64;
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let record = match model::decode_stream_line(&line) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(err) => {
                error!(error = %err, "undecodable input line");
                failed += 1;
                continue;
            }
        };
        match sink.submit(&client, &record).await {
            Ok(Submission::Completed(ack)) => {
                info!(
                    order_id = %record.id,
                    order_number = %ack.order_number,
                    lines = ack.lines_added,
                    "order submitted"
                );
                submitted += 1;
            }
            Ok(Submission::Skipped { reason }) => {
                warn!(order_id = %record.id, %reason, "record skipped");
                skipped += 1;
            }
            Err(err) => {
                match err.orphaned_order() {
                    Some(order_number) => error!(
                        order_id = %record.id,
                        order_number = %order_number,
                        error = %err,
                        "submission failed; order shell left without lines"
                    ),
                    None => error!(order_id = %record.id, error = %err, "submission failed"),
                }
                failed += 1;
            }
        }
    }

    info!(submitted, skipped, failed, "input stream drained");
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
