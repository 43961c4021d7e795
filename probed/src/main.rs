use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use probed::{new_detector, Config, EnrichPolicy};
use std::sync::Arc;

/// probed — kernel-level syscall observability agent.
#[derive(Parser, Debug)]
#[command(name = "probed", version, about = "Multi-source eBPF event aggregator")]
struct Args {
    /// Path to a TOML config file. Overrides the PROBED_CONFIG env var.
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.config {
        std::env::set_var("PROBED_CONFIG", path);
    }

    let config = Config::load();
    env_logger::Builder::new()
        .parse_filters(&config.logging.level)
        .init();

    info!("probed starting (queue_capacity={}, lossy_drop={})", config.runtime.queue_capacity, config.runtime.lossy_drop);

    let metrics = Arc::new(probed::Metrics::new());
    let policy = if config.runtime.drop_on_enrich_failure {
        EnrichPolicy::Drop
    } else {
        EnrichPolicy::Omit
    };
    let mut aggregator = new_detector(
        config.runtime.queue_capacity,
        config.runtime.lossy_drop,
        policy,
        metrics.clone(),
    );

    // Real kernel probes are attached by a platform-specific integration
    // that supplies HookInfo/MapInfo capabilities and pushes ProbeHandle
    // implementations via `aggregator.add(...)`; that integration is out
    // of scope here (see module docs on `probed::module`). With nothing
    // added, `start()` spawns zero pumps and `next()` will report
    // end-of-stream immediately once `close()` is called.
    aggregator
        .start()
        .context("failed to start the event aggregator")?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received, closing aggregator");
                aggregator.close();
                break;
            }
            event = aggregator.next() => {
                match event {
                    Ok(event) => info!("{}", serde_json::to_string(&event).unwrap_or_else(|_| event.event_name.clone())),
                    Err(probed::ProbeError::AggregatorClosed) => {
                        info!("aggregator drained with no probes registered; exiting");
                        break;
                    }
                    Err(e) => warn!("aggregator error ({}): {e}", e.originator()),
                }
            }
        }
    }

    // Drain whatever was already in flight before the signal.
    while let Ok(event) = aggregator.next().await {
        info!("{}", serde_json::to_string(&event).unwrap_or_else(|_| event.event_name.clone()));
    }

    info!(
        "probed exiting: {} events total, per-probe: {:?}",
        aggregator.total(),
        aggregator.per_probe()
    );
    Ok(())
}
