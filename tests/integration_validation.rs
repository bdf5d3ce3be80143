use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use std::path::Path;
use team_tracker::config::Settings;
use team_tracker::storage::{ActivityStore, Database};
use teloxide::prelude::*;
use tempfile::TempDir;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::test]
#[ignore = "Requires real credentials"]
async fn test_credentials_validation() -> Result<()> {
    load_dotenv();
    init_tracing();

    info!("Starting integration test for credentials validation...");
    let settings = Settings::new().map_err(|e| anyhow!("Settings::new() failed: {e}"))?;

    validate_telegram_token(&settings).await?;
    validate_storage().await?;

    info!("Credentials validation test passed successfully.");
    Ok(())
}

fn load_dotenv() {
    let env_path = Path::new("../.env");
    if env_path.exists() {
        let _ = dotenvy::from_path(env_path);
    } else {
        dotenv().ok();
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

async fn validate_telegram_token(settings: &Settings) -> Result<()> {
    assert!(
        !settings.telegram_token.is_empty(),
        "TELEGRAM_TOKEN is missing (check .env file or loading logic)"
    );

    let bot = Bot::new(settings.telegram_token.clone());
    let me = bot
        .get_me()
        .await
        .map_err(|e| anyhow!("getMe failed, token rejected: {e}"))?;
    info!("Token belongs to @{}", me.username());

    assert_eq!(
        settings.bot_username_or(me.username()),
        me.username(),
        "BOT_USERNAME does not match the account behind the token"
    );
    Ok(())
}

async fn validate_storage() -> Result<()> {
    let dir = TempDir::new()?;
    let db = Database::new(dir.path().join("validation.db")).await?;
    db.check_connection().await?;
    db.register_group(1, "validation").await?;
    assert_eq!(db.list_groups().await?.len(), 1);
    info!("Storage migrations applied and writable.");
    Ok(())
}
