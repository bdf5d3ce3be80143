use dotenvy::dotenv;
use std::sync::Arc;
use team_tracker::config::Settings;
use team_tracker::logging::{self, Redactor};
use team_tracker::{keepalive, runner};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Compile redaction patterns before logging starts
    let redactor = Arc::new(Redactor::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);
    logging::init(redactor);

    info!("Starting Team Tracker Bot...");

    let settings = init_settings();

    keepalive::spawn(settings.keepalive_addr);

    runner::run_bot(settings).await;

    Ok(())
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}
