mod driver;
mod logging;
mod script;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tabsync_engine::{MemoryHost, SyncEngine, SyncSettings};
use tabsync_logging::sync_info;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;

use crate::driver::{forward_pushes, Driver};
use crate::logging::LogDestination;
use crate::script::OutputLine;

/// Drive the tab sync engine over an in-memory window with JSON lines.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON settings file; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    log: LogDestination,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,

    /// Script to run instead of reading stdin.
    #[arg(long)]
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::initialize(args.log, args.verbose);

    let settings = load_settings(args.config.as_deref())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(run(settings, args.script))
}

fn load_settings(path: Option<&Path>) -> Result<SyncSettings> {
    match path {
        Some(path) => SyncSettings::load(path)
            .with_context(|| format!("cannot load settings from {}", path.display())),
        None => Ok(SyncSettings::default()),
    }
}

async fn open_script(path: Option<PathBuf>) -> Result<Box<dyn AsyncBufRead + Unpin>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("cannot open script {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

async fn run(settings: SyncSettings, script: Option<PathBuf>) -> Result<()> {
    let reader = open_script(script).await?;
    let flush_delay = settings.timing().debounce * 2;

    let (push_tx, push_rx) = mpsc::unbounded_channel();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutputLine>();
    let host = Arc::new(MemoryHost::new(Vec::new()).with_outlet(push_tx));
    let engine = SyncEngine::with_http(host.clone(), settings);

    tokio::spawn(forward_pushes(push_rx, out_tx.clone()));
    let printer = tokio::spawn(async move {
        let stdout = std::io::stdout();
        while let Some(line) = out_rx.recv().await {
            let mut out = stdout.lock();
            if serde_json::to_writer(&mut out, &line).is_err() || writeln!(out).is_err() {
                break;
            }
        }
    });

    let driver = Driver::new(host, engine.clone(), out_tx);
    let applied = driver.run(reader).await.context("failed to read script")?;

    // Let the last coalesced burst go out before shutting down.
    tokio::time::sleep(flush_delay).await;
    sync_info!("script done: {} line(s), {} push(es)", applied, engine.push_count());

    drop(driver);
    drop(engine);
    printer.abort();
    Ok(())
}
