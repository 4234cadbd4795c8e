use ringlog_config::StoreConfig;
use ringlog_store::{CappedStore, ThreadScheduler, shutdown};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/ringlog/config.toml".to_string());
    let config = StoreConfig::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    // Run every registered store's close hook before the process actually
    // unwinds on an unhandled panic, so a flushed header isn't lost to a bug
    // in the producer/consumer loop.
    let default_panic_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        shutdown::run_all();
        default_panic_hook(panic_info);
    }));

    let store = CappedStore::open(
        &config.path,
        config.size_kb,
        Duration::from_millis(config.flush_interval_ms),
        &ThreadScheduler::new(),
    )?;

    info!(
        "RINGLOG: opened {path} (capacity={capacity_kb}KB)",
        path = &config.path,
        capacity_kb = store.capacity_kb(),
    );

    // `ctrlc` intercepts SIGINT/SIGTERM; route it through the same shutdown
    // registry a bare `kill -TERM` or an atexit would otherwise rely on,
    // rather than reaching into this one store directly.
    ctrlc::set_handler(move || {
        info!("RINGLOG: shutdown signal received, flushing and closing");
        shutdown::run_all();
        std::process::exit(0);
    })?;

    run_demo_producer_consumer(store);
    Ok(())
}

/// Stands in for the outer profiler's producer/consumer loop: one thread
/// appends samples, another drains and logs whichever the writer just
/// produced.
fn run_demo_producer_consumer(store: Arc<CappedStore>) {
    let producer = store.clone();
    let producer_handle = std::thread::spawn(move || {
        let mut counter: u64 = 0;
        loop {
            let payload = format!("sample-{counter}");
            match producer.write(payload.as_bytes()) {
                Ok(-1) => info!("RINGLOG: sample dropped, larger than capacity"),
                Ok(id) => info!(id, "RINGLOG: wrote sample"),
                Err(err) => {
                    info!(error = %err, "RINGLOG: write failed, stopping producer");
                    break;
                }
            }
            counter += 1;
            std::thread::sleep(Duration::from_millis(200));
        }
    });

    let _ = producer_handle.join();
}
