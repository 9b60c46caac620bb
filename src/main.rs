use anyhow::Result;
use colored::Colorize;
use greeks_snapshot::api_server_axum;
use greeks_snapshot::app_config::AppConfig;
use greeks_snapshot::logging;
use greeks_snapshot::pipeline::SnapshotPipeline;
use greeks_snapshot::smartapi::TRACKED_INDICES;
use greeks_snapshot::store::SnapshotStore;
use std::sync::Arc;

/// Start the trigger server; snapshot runs happen on POST /api/snapshot.
async fn run_server(config: Arc<AppConfig>) -> Result<()> {
    println!("{}", "=".repeat(60).blue());
    println!("{}", "Greeks Snapshot Server".green().bold());
    println!("{}", "=".repeat(60).blue());
    println!();

    let store = SnapshotStore::open(&config.db_path, TRACKED_INDICES)?;
    api_server_axum::start_server(config, store).await
}

/// Execute a single snapshot run and exit (no HTTP trigger involved).
async fn run_once(config: Arc<AppConfig>) -> Result<()> {
    println!("{}", "=".repeat(60).blue());
    println!("{}", "Greeks Snapshot - single run".green().bold());
    println!("{}", "=".repeat(60).blue());
    println!(
        "{} Tracking {} indices",
        "→".cyan(),
        TRACKED_INDICES.len()
    );
    println!();

    let store = SnapshotStore::open(&config.db_path, TRACKED_INDICES)?;
    let pipeline = SnapshotPipeline::new(config, store.clone());
    pipeline.run().await;

    println!();
    for cfg in TRACKED_INDICES {
        let count = store.count(cfg.name).await.unwrap_or(0);
        println!("{} {}: {} contracts stored", "✓".green(), cfg.name.yellow(), count);
    }
    println!("{}", "Done!".green().bold());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let config = AppConfig::from_env();
    if let Err(e) = config.validate() {
        eprintln!("{} Configuration error: {}", "✗".red(), e);
        eprintln!("Required: SMARTAPI_API_KEY, SMARTAPI_CLIENT_ID, SMARTAPI_PIN, SMARTAPI_TOTP_SECRET");
        std::process::exit(1);
    }
    let mode = config.mode.clone();
    let config = Arc::new(config);

    match mode.as_str() {
        "server" => run_server(config).await?,
        "once" => run_once(config).await?,
        _ => {
            eprintln!("Invalid mode '{}'. Use 'server' or 'once'", mode);
            eprintln!("Set GREEKS_MODE environment variable to control execution mode");
            eprintln!("Examples:");
            eprintln!("  GREEKS_MODE=server GREEKS_PORT=3001 cargo run   # trigger server");
            eprintln!("  GREEKS_MODE=once cargo run                      # one snapshot run");
            std::process::exit(1);
        }
    }

    Ok(())
}
