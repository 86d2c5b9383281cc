use std::fs::File;

use anyhow::{Context, Result};
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;
use wallet_ledger::{bin_utils::Service, processor::InvocationError};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let filename = std::env::args()
        .nth(1)
        .context("Expected a file name as the first argument")?;
    let file = File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?;

    let span = info_span!("wallet_ledger", source = %filename);
    let rejections = span.clone();
    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        error_printer: Box::new(move |line, err| match err {
            InvocationError::LedgerErr(err) => {
                // rejected by the ledger rules, not a technical error
                info!(parent: &rejections, line, %err, "invocation rejected");
            }
            err => eprintln!("Error at line {line}: {err}"),
        }),
        span,
    };
    service.run()
}
