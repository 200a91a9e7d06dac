/// Bot Dashboard - main entry point
/// Connects to the bot's activity stream, serves the HTTP fallback API,
/// and prints a live status feed until interrupted.

use anyhow::Result;
use dotenvy::dotenv;
use std::time::Duration;

use bot_dashboard::api::{start_api_server, ApiConfig};
use bot_dashboard::client::LiveStateClient;
use bot_dashboard::settings::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cfg = Config::from_env()?;

    // Start the HTTP fallback API (if enabled)
    if cfg.api_enabled {
        let api_config = ApiConfig {
            enabled: cfg.api_enabled,
            port: cfg.api_port,
        };
        match start_api_server(api_config, cfg.state_file.clone(), cfg.actions_file.clone())
            .await
        {
            Ok(_handle) => {
                println!("HTTP API server started on http://127.0.0.1:{}", cfg.api_port);
                println!("  - GET /health - Health check");
                println!("  - GET /api/bot-state - Bot state snapshot (flat-file backed)");
                println!("  - GET /api/actions - Recent bot actions, newest first");
            }
            Err(e) => {
                eprintln!("Warning: Failed to start API server: {}", e);
            }
        }
    }

    let client = LiveStateClient::new(cfg.clone());
    client.start().await;
    println!("🚀 Dashboard client started. Stream: {}", cfg.ws_url);

    let view = client.view();

    // Log connectivity transitions as they happen
    let transitions_view = view.clone();
    tokio::spawn(async move {
        let mut changes = transitions_view.subscribe();
        let mut was_connected = false;
        while changes.changed().await.is_ok() {
            let connected = transitions_view.read().await.is_connected();
            if connected != was_connected {
                if connected {
                    println!("🔌 Stream online");
                } else {
                    let v = transitions_view.read().await;
                    match &v.last_error {
                        Some(e) => println!("🔌 Stream offline ({})", e),
                        None => println!("🔌 Stream offline"),
                    }
                }
                was_connected = connected;
            }
        }
    });

    // Periodic heartbeat with a summary of the current view
    let heartbeat_view = view.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        interval.tick().await;
        loop {
            interval.tick().await;
            let v = heartbeat_view.read().await;
            let (buys, sells, last_price) = match &v.state {
                Some(s) => (s.total_buys, s.total_sells, s.last_price),
                None => (0, 0, None),
            };
            println!(
                "💓 [{}] connected={} | {} buys / {} sells | last price: {} | {} trades, {} actions in view",
                chrono::Utc::now().format("%H:%M:%S"),
                v.is_connected(),
                buys,
                sells,
                last_price
                    .map(|p| format!("{:.8}", p))
                    .unwrap_or_else(|| "-".to_string()),
                v.trades.len(),
                v.actions.len(),
            );
        }
    });

    tokio::signal::ctrl_c().await?;
    println!("\nReceived shutdown signal, shutting down...");
    client.stop().await;

    Ok(())
}
