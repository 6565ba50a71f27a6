//! # Engine Feed Live Test
//!
//! Runs the real-time engine with short timers and prints every event of
//! every channel to stdout, then tears the engine down.
//!
//! A deliberately panicking metric observer is registered first. The run
//! fails if it takes the other observers (or the process) down with it,
//! which is what happens when the build profile aborts on panic.

use clap::Parser;
use lib_fgstock::configs::EngineConfig;
use lib_fgstock::core::RealtimeEngine;
use lib_fgstock::datasets::{DashboardDataSource, MockDataset};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(about = "Prints the live dashboard feed for a while")]
struct Args {
    /// Seconds to keep the feed running.
    #[arg(long, default_value_t = 30)]
    seconds: u64,

    /// Milliseconds between metric updates.
    #[arg(long, default_value_t = 2_000)]
    metric_interval_ms: u64,

    /// Milliseconds between insights.
    #[arg(long, default_value_t = 3_000)]
    insight_interval_ms: u64,

    /// Generator seed. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

fn print_grids(dataset: &dyn DashboardDataSource) {
    println!("--- Pending orders ---");
    dataset.pending_orders().iter().for_each(|row| println!("{}", row));
    println!("--- Stock ageing ---");
    dataset.stock_ageing().iter().for_each(|row| println!("{}", row));
    println!("--- Non-moving items ---");
    dataset.non_moving_items().iter().for_each(|row| println!("{}", row));
    println!("--- Fast-moving items ---");
    dataset.fast_moving_items().iter().for_each(|row| println!("{}", row));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = EngineConfig {
        metric_interval_ms: args.metric_interval_ms,
        insight_interval_ms: args.insight_interval_ms,
        seed: args.seed,
        ..EngineConfig::default()
    };

    let dataset = MockDataset::new();
    print_grids(&dataset);

    let engine = RealtimeEngine::new(config, &dataset)?;

    engine.subscribe_connection_status(|status| {
        println!("[{}] status   -> {}", chrono::Local::now().format("%H:%M:%S"), status);
    });
    engine.subscribe_metric_updates(|_| panic!("faulty observer, ignore"));

    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    engine.subscribe_metric_updates(move |update| {
        counter.fetch_add(1, Ordering::Relaxed);
        match serde_json::to_string(update) {
            Ok(json) => println!("[{}] metric   -> {}", chrono::Local::now().format("%H:%M:%S"), json),
            Err(e) => eprintln!("[ERROR] could not serialize metric update: {}", e),
        }
    });
    engine.subscribe_insight_events(|insight| {
        println!(
            "[{}] insight  -> [{}] {} {}",
            chrono::Local::now().format("%H:%M:%S"),
            insight.category,
            insight.message,
            insight.value.as_deref().unwrap_or("")
        );
    });
    engine.subscribe_insight_ledger(|ledger| {
        let newest = ledger.first().map(|i| i.id.as_str()).unwrap_or("-");
        println!("[*] ledger holds {} insights, newest {}", ledger.len(), newest);
    });

    println!("[*] Connecting for {}s...", args.seconds);
    engine.connect();
    tokio::time::sleep(Duration::from_secs(args.seconds)).await;

    engine.disconnect();
    engine.teardown();

    println!("-----------------------------------------------");
    println!("{}", serde_json::to_string_pretty(&*engine.ledger_snapshot())?);
    println!("-----------------------------------------------");

    let latency_ms = engine.config().connect_latency_ms;
    let expected = (args.seconds * 1_000).saturating_sub(latency_ms) / args.metric_interval_ms.max(1);
    let delivered = delivered.load(Ordering::Relaxed);
    println!("[*] {} metric updates delivered past the faulty observer", delivered);
    if expected > 0 && delivered == 0 {
        anyhow::bail!("metric observers stopped receiving after a panicking observer");
    }
    Ok(())
}
