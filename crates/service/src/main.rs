use std::io::{self, BufRead, Write};

use anyhow::Context;
use tracing::info;

use kardex_infra::{EngineConfig, StockEngine};
use kardex_service::StockService;

fn main() -> anyhow::Result<()> {
    kardex_observability::init();

    let config = EngineConfig::from_env();
    info!(?config, "starting kardex service");
    let service = StockService::new(StockEngine::in_memory(config));

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read request line")?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = service.handle_line(&line);
        writeln!(stdout, "{reply}").context("failed to write reply")?;
        stdout.flush().context("failed to flush stdout")?;
    }

    info!("input closed, shutting down");
    Ok(())
}
