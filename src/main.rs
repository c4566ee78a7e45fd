//! Portal session replay.
//!
//! Reads a JSON-lines script of identity events and navigations, runs it
//! through the session gate, and prints one JSON record per step to stdout.

mod replay;

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use session::GateConfig;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::replay::{Replay, ReplayError, parse_script};

#[derive(Parser, Debug)]
#[command(name = "portal", about = "Replay session events through the portal route gate")]
struct Cli {
    /// Script to replay; reads stdin when omitted.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Override PORTAL_PENDING_TIMEOUT_MS.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ReplayError> {
    let mut config = GateConfig::from_env()?;
    if let Some(ms) = cli.timeout_ms {
        config = config.with_pending_timeout(Duration::from_millis(ms));
    }

    let input = match &cli.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let steps = parse_script(&input)?;
    info!(steps = steps.len(), "replaying script");

    let replay = Replay::new(&config);
    for (path, requirement) in replay.table().iter() {
        debug!(path, ?requirement, "route registered");
    }
    let records = replay.run(steps).await;
    info!(state = %replay.resolver().store().current().state(), "replay finished");

    let mut out = io::stdout().lock();
    for record in &records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
