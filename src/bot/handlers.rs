use crate::access::{AccessGate, ReportOutcome};
use crate::bot::messaging::send_html;
use crate::bot::views;
use crate::config::Settings;
use crate::report::{format_group_list, format_report, no_access_message};
use crate::storage::{ActivityStore, Database, MessageEvent, StorageError};
use anyhow::Result;
use std::sync::Arc;
use teloxide::{
    prelude::*,
    types::{ChatMemberUpdated, Me, ParseMode, User},
    utils::command::BotCommands,
};
use tracing::{debug, error, info};

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the main menu
    #[command(description = "Show the main menu.")]
    Start,
    /// Report a user's activity in groups shared with the caller
    #[command(description = "Show a user's message activity: /check @username")]
    Check(String),
    /// List tracked groups
    #[command(description = "List tracked groups.")]
    Groups,
    /// Show help
    #[command(description = "Show help.")]
    Help,
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Handle under which a sender's messages are recorded.
///
/// Users without a Telegram username get `user_<id>`.
#[must_use]
pub fn sender_handle(user: &User) -> String {
    user.username
        .clone()
        .unwrap_or_else(|| format!("user_{}", user.id.0))
}

const USERNAME_MIN_LEN: usize = 5;
const USERNAME_MAX_LEN: usize = 32;

/// Normalise the `/check` argument into a username.
///
/// Returns `None` when the argument is missing or is not a valid Telegram
/// username (5 to 32 ASCII letters, digits or underscores).
#[must_use]
pub fn parse_target(raw: &str) -> Option<String> {
    let target = raw.split_whitespace().next()?.trim_start_matches('@');
    let valid = (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&target.len())
        && target.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then(|| target.to_string())
}

/// Reply to a `/check` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckReply {
    /// Missing or malformed username
    Usage,
    /// The command has no sender
    UnknownCaller,
    /// Caller shares no tracked group
    NoAccess,
    /// Storage could not be read
    Failure,
    /// Rendered HTML report
    Report(String),
}

impl CheckReply {
    /// Text to send
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Usage => views::CHECK_USAGE,
            Self::UnknownCaller => views::UNKNOWN_CALLER,
            Self::NoAccess => no_access_message(),
            Self::Failure => views::GENERIC_FAILURE,
            Self::Report(html) => html,
        }
    }

    /// Whether the reply carries the "Back to Menu" button
    #[must_use]
    pub const fn has_menu_button(&self) -> bool {
        matches!(self, Self::NoAccess | Self::Report(_))
    }
}

/// Turn the access-gated lookup for `target` into a reply.
#[must_use]
pub fn report_reply(target: &str, outcome: Result<ReportOutcome, StorageError>) -> CheckReply {
    match outcome {
        Ok(ReportOutcome::Report(rows)) => {
            debug!("Report for @{target} covers {} group(s).", rows.len());
            CheckReply::Report(format_report(target, &rows))
        }
        Ok(ReportOutcome::NoAccess) => CheckReply::NoAccess,
        Err(e) => {
            error!("Failed to build report for @{target}: {e}");
            CheckReply::Failure
        }
    }
}

/// The event to record for a message, if it is trackable.
///
/// Only plain text that is not a command, posted by a known user in a group
/// or supergroup, is tracked.
#[must_use]
pub fn group_message_event(msg: &Message) -> Option<MessageEvent> {
    if !(msg.chat.is_group() || msg.chat.is_supergroup()) {
        return None;
    }
    let text = msg.text()?;
    if text.starts_with('/') {
        return None;
    }
    let user = msg.from.as_ref()?;
    let title = msg.chat.title().unwrap_or("Untitled group");

    Some(MessageEvent::now(
        user.id.0.cast_signed(),
        sender_handle(user),
        msg.chat.id.0,
        title,
    ))
}

/// Whether a `my_chat_member` update means the bot just joined a group.
#[must_use]
pub fn bot_joined(update: &ChatMemberUpdated) -> bool {
    (update.chat.is_group() || update.chat.is_supergroup())
        && !update.old_chat_member.kind.is_present()
        && update.new_chat_member.kind.is_present()
}

fn bot_username<'a>(settings: &'a Settings, me: &'a Me) -> &'a str {
    settings.bot_username_or(me.user.username.as_deref().unwrap_or_default())
}

async fn redirect_to_dm(
    bot: &Bot,
    msg: &Message,
    notice: &str,
    settings: &Settings,
    me: &Me,
) -> Result<()> {
    bot.send_message(msg.chat.id, notice)
        .reply_markup(views::dm_redirect_keyboard(bot_username(settings, me)))
        .await?;
    Ok(())
}

/// Start handler
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn start(bot: Bot, msg: Message, settings: Arc<Settings>, me: Me) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    info!("User {user_id} initiated /start command.");

    if !msg.chat.is_private() {
        return redirect_to_dm(&bot, &msg, views::DM_ONLY_START, &settings, &me).await;
    }

    bot.send_message(msg.chat.id, views::WELCOME)
        .parse_mode(ParseMode::Html)
        .reply_markup(views::main_menu_keyboard())
        .await?;
    Ok(())
}

/// `/check` handler
///
/// # Errors
///
/// Returns an error if a reply cannot be sent. Storage failures are
/// reported to the caller and logged, not returned.
pub async fn check(
    bot: Bot,
    msg: Message,
    raw_target: String,
    store: Arc<Database>,
    gate: Arc<AccessGate>,
    settings: Arc<Settings>,
    me: Me,
) -> Result<()> {
    if !msg.chat.is_private() {
        return redirect_to_dm(&bot, &msg, views::DM_ONLY_CHECK, &settings, &me).await;
    }

    let reply = match (parse_target(&raw_target), msg.from.as_ref()) {
        (None, _) => CheckReply::Usage,
        (Some(_), None) => CheckReply::UnknownCaller,
        (Some(target), Some(caller)) => {
            let caller_id = caller.id.0.cast_signed();
            info!("User {caller_id} requested activity report for @{target}.");
            let store: &dyn ActivityStore = store.as_ref();
            let reply = report_reply(&target, gate.activity_report(store, caller_id, &target).await);
            if reply == CheckReply::NoAccess {
                info!("User {caller_id} shares no tracked group; report denied.");
            }
            reply
        }
    };

    match reply {
        CheckReply::Report(ref html) => {
            send_html(&bot, msg.chat.id, html, Some(views::back_to_menu_keyboard())).await?;
        }
        _ => {
            let mut req = bot.send_message(msg.chat.id, reply.text());
            if reply.has_menu_button() {
                req = req.reply_markup(views::back_to_menu_keyboard());
            }
            req.await?;
        }
    }

    Ok(())
}

/// `/groups` handler
///
/// # Errors
///
/// Returns an error if a reply cannot be sent.
pub async fn groups(
    bot: Bot,
    msg: Message,
    store: Arc<Database>,
    settings: Arc<Settings>,
    me: Me,
) -> Result<()> {
    if !msg.chat.is_private() {
        return redirect_to_dm(&bot, &msg, views::DM_ONLY_COMMAND, &settings, &me).await;
    }

    match store.list_groups().await {
        Ok(groups) => send_html(&bot, msg.chat.id, &format_group_list(&groups), None).await?,
        Err(e) => {
            error!("Failed to list tracked groups: {e}");
            bot.send_message(msg.chat.id, views::GENERIC_FAILURE).await?;
        }
    }
    Ok(())
}

/// `/help` handler
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn help(bot: Bot, msg: Message, settings: Arc<Settings>) -> Result<()> {
    bot.send_message(msg.chat.id, views::help_text(settings.support_contact.as_deref()))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Record a tracked group message and make sure its group is registered.
///
/// # Errors
///
/// Returns an error if the store is unreachable.
pub async fn record_group_message(event: MessageEvent, store: Arc<Database>) -> Result<()> {
    store.record_at(&event).await?;
    store.register_group(event.group_id, &event.group_title).await?;
    debug!(
        "Recorded message from {} in group {}.",
        event.username, event.group_id
    );
    Ok(())
}

/// Register a group the bot was just added to and greet its members.
///
/// # Errors
///
/// Returns an error if registration or the greeting fails.
pub async fn bot_added(
    bot: Bot,
    update: ChatMemberUpdated,
    store: Arc<Database>,
    settings: Arc<Settings>,
    me: Me,
) -> Result<()> {
    let chat = &update.chat;
    let title = chat.title().unwrap_or("Untitled group");
    info!("Bot added to group {} ({title}).", chat.id);

    store.register_group(chat.id.0, title).await?;

    bot.send_message(chat.id, views::GROUP_WELCOME)
        .parse_mode(ParseMode::Html)
        .reply_markup(views::dm_redirect_keyboard(bot_username(&settings, &me)))
        .await?;
    Ok(())
}
