//! Serve command
//!
//! Newline-delimited JSON over stdin/stdout. Each request line yields exactly
//! one response line; blank lines are skipped. Without a config file the
//! ledger runs in memory under a throwaway operator key.

use super::read_key_file;
use crate::config::CliConfig;
use anyhow::{Context, Result};
use pharmtrace_ledger::{FileJournal, Journal, LedgerConfig, MemoryJournal, TransitionEngine};
use pharmtrace_service::LedgerService;
use pharmtrace_signature::ManufacturerKey;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

/// Serve requests from stdin until EOF
pub async fn run(config_path: &Path) -> Result<()> {
    let service = build_service(config_path)?;
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let handled = serve_lines(&service, stdin, stdout).await?;
    info!(handled, "Input closed, shutting down");
    Ok(())
}

/// Engine and service as described by the config at `config_path`
pub fn build_service(config_path: &Path) -> Result<LedgerService> {
    let (ledger, operator) = match CliConfig::load(config_path)? {
        Some(config) => {
            let operator = read_key_file(&config.operator_key)?;
            (config.ledger, operator)
        }
        None => {
            let operator = ManufacturerKey::generate();
            warn!(
                config = %config_path.display(),
                operator = %operator.identity(),
                "No config file; running in memory with an ephemeral operator"
            );
            (LedgerConfig::new(operator.identity()), operator)
        }
    };

    if !ledger.admins.contains(&operator.identity()) && ledger.owner != operator.identity() {
        warn!(
            operator = %operator.identity(),
            "Operator key is not an admin; admin requests without `from` will be refused"
        );
    }

    let journal: Box<dyn Journal> = match &ledger.journal_path {
        Some(path) => Box::new(
            FileJournal::open(path)
                .with_context(|| format!("Failed to open journal {}", path.display()))?,
        ),
        None => Box::new(MemoryJournal::new()),
    };
    let engine = TransitionEngine::open(&ledger, journal)?;
    info!(
        operator = %operator.identity(),
        sequence = engine.sequence(),
        batches = engine.batch_count(),
        "Ledger ready"
    );
    Ok(LedgerService::new(Arc::new(engine), operator.identity()))
}

/// Answer every line of `input` on `output`; returns the number of requests handled
pub async fn serve_lines<R, W>(service: &LedgerService, input: R, mut output: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut handled = 0;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = service.handle_json(&line);
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        output.write_all(encoded.as_bytes()).await?;
        output.flush().await?;
        handled += 1;
    }
    Ok(handled)
}
