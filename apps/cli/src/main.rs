#![deny(warnings)]

//! Headless NimClickr host: loads the save, applies scripted actions, drives
//! the economy clock and prints a one-line HUD.

mod format;

use anyhow::{Context, Result};
use clap::Parser;
use format::format_num;
use persistence::{FileStore, SaveAdapter};
use sim_core::Catalog;
use sim_runtime::{run_realtime, RuntimeConfig, Session, TickDriver};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "NimClickr headless runner")]
struct Cli {
    /// Directory holding save files
    #[arg(long, default_value = persistence::default_store_dir())]
    store_dir: PathBuf,

    /// Optional YAML runtime config (tick/save cadence, save key)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wipe progress and the stored save before doing anything else
    #[arg(long)]
    reset: bool,

    /// Number of manual clicks to perform
    #[arg(long, default_value_t = 0)]
    click: u32,

    /// Building or upgrade id to buy (repeatable, applied in order)
    #[arg(long)]
    buy: Vec<String>,

    /// Fast-forward this many seconds of game time without sleeping
    #[arg(long)]
    simulate_secs: Option<f64>,

    /// Keep running on real timers until Ctrl-C
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    // `load` validates; defaults are valid by construction.
    let config = match &cli.config {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("loading runtime config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    let store = FileStore::new(&cli.store_dir);
    info!(store_dir = %store.dir().display(), ?config, "starting CLI");

    let catalog = Arc::new(Catalog::standard());
    let saves = SaveAdapter::with_key(store, config.save_key.clone());
    let mut session = Session::new(catalog, saves);
    let mut driver = TickDriver::new(&config);
    driver.start(&mut session);

    if cli.reset {
        session.reset();
    }
    for _ in 0..cli.click {
        session.click();
    }
    for id in &cli.buy {
        let outcome = session.buy(id);
        info!(id = %id, ?outcome, "purchase");
    }
    if let Some(secs) = cli.simulate_secs {
        let elapsed = Duration::try_from_secs_f64(secs)
            .with_context(|| format!("invalid --simulate-secs value {secs}"))?;
        let report = driver.on_elapsed(&mut session, elapsed);
        info!(ticks = report.ticks, saves = report.saves, "fast-forward done");
    }

    if cli.realtime {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .enable_io()
            .build()
            .context("building timer runtime")?;
        let report = runtime.block_on(run_realtime(&mut driver, &mut session, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C, stopping");
            }
        }));
        info!(ticks = report.ticks, saves = report.saves, "realtime run finished");
    } else {
        driver.shutdown(&mut session);
    }

    print_hud(&session);
    Ok(())
}

fn print_hud<S: persistence::KeyValueStore>(session: &Session<S>) {
    let econ = session.economy();
    let stats = econ.stats();
    println!(
        "Economy | tx: {} | lifetime: {} | TPS: {} | click: {} | upgrades ready: {}",
        format_num(stats.currency, 0.0),
        format_num(stats.lifetime_total, 0.0),
        format_num(stats.generation_rate, 10.0),
        format_num(stats.click_yield, 0.0),
        stats.available_upgrades
    );
    for b in econ.catalog().buildings() {
        let owned = econ.owned(b.id.as_str());
        let cost = econ.current_cost(b.id.as_str()).unwrap_or(f64::INFINITY);
        println!(
            "  {:<14} owned: {:>4} | next: {:>8} | x{}",
            b.name,
            owned,
            format_num(cost, 0.0),
            format_num(econ.building_multiplier(b.id.as_str()), 10.0)
        );
    }
    let ready: Vec<&str> = econ
        .unlocked_available_upgrades()
        .iter()
        .map(|u| u.id.as_str())
        .collect();
    if !ready.is_empty() {
        println!("  ready: {}", ready.join(", "));
    }
}
