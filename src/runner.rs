use crate::access::{AccessGate, TelegramMembership};
use crate::bot;
use crate::bot::handlers::Command;
use crate::config::Settings;
use crate::storage::{Database, MessageEvent};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatMemberUpdated, Me};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

/// Run the Telegram bot until interrupted.
pub async fn run_bot(settings: Arc<Settings>) {
    let store = init_storage(&settings).await;

    let bot = Bot::new(settings.telegram_token.clone());

    let gate = Arc::new(AccessGate::new(
        Arc::new(TelegramMembership::new(bot.clone())),
        settings.membership_check_timeout(),
        settings.membership_check_concurrency,
    ));
    info!(
        "Access gate initialized (timeout: {}s, concurrency: {}).",
        settings.membership_check_timeout_secs, settings.membership_check_concurrency
    );

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to publish command list: {e}");
    }

    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![store, gate, settings])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn init_storage(settings: &Settings) -> Arc<Database> {
    match Database::new(&settings.database_path).await {
        Ok(db) => {
            if let Err(e) = db.check_connection().await {
                error!("Database connection check returned error: {e}");
            }
            Arc::new(db)
        }
        Err(e) => {
            error!(
                "Failed to open database at {}: {}",
                settings.database_path.display(),
                e
            );
            std::process::exit(1);
        }
    }
}

/// Dispatch tree: one branch per inbound event kind.
///
/// | Event                               | Endpoint               |
/// |-------------------------------------|------------------------|
/// | inline button press                 | `handle_button`        |
/// | bot added to a group                | `handle_bot_added`     |
/// | known command                       | `handle_command`       |
/// | plain group text                    | `handle_group_message` |
#[must_use]
pub fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_button))
        .branch(
            Update::filter_my_chat_member()
                .filter(|update: ChatMemberUpdated| bot::handlers::bot_joined(&update))
                .endpoint(handle_bot_added),
        )
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::filter_map(|msg: Message| bot::handlers::group_message_event(&msg))
                        .endpoint(handle_group_message),
                ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    store: Arc<Database>,
    gate: Arc<AccessGate>,
    settings: Arc<Settings>,
    me: Me,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => bot::handlers::start(bot, msg, settings, me).await,
        Command::Check(target) => {
            bot::handlers::check(bot, msg, target, store, gate, settings, me).await
        }
        Command::Groups => bot::handlers::groups(bot, msg, store, settings, me).await,
        Command::Help => bot::handlers::help(bot, msg, settings).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_group_message(
    event: MessageEvent,
    store: Arc<Database>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::record_group_message(event, store).await {
        error!("Failed to record group message: {}", e);
    }
    respond(())
}

async fn handle_bot_added(
    bot: Bot,
    update: ChatMemberUpdated,
    store: Arc<Database>,
    settings: Arc<Settings>,
    me: Me,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::bot_added(bot, update, store, settings, me).await {
        error!("Group join handler error: {}", e);
    }
    respond(())
}

async fn handle_button(
    bot: Bot,
    q: CallbackQuery,
    store: Arc<Database>,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::callbacks::handle_button(bot, q, store, settings).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
