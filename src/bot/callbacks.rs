use crate::bot::messaging::edit_html;
use crate::bot::views::{self, ButtonAction};
use crate::config::Settings;
use crate::report::format_group_list;
use crate::storage::{ActivityStore, Database};
use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ParseMode};
use tracing::{debug, error};

/// Handle inline keyboard presses.
///
/// Every press is acknowledged; unknown data is otherwise ignored.
///
/// # Errors
///
/// Returns an error if Telegram API calls fail.
pub async fn handle_button(
    bot: Bot,
    q: CallbackQuery,
    store: Arc<Database>,
    settings: Arc<Settings>,
) -> Result<()> {
    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(action) = q.data.as_deref().and_then(ButtonAction::from_data) else {
        debug!("Ignoring unknown callback data {:?}", q.data);
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        debug!("Callback {action:?} has no message attached");
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    match action {
        ButtonAction::CheckUser => {
            bot.edit_message_text(chat_id, message_id, views::CHECK_PROMPT)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        ButtonAction::SelectCommunity => {
            let text = match store.list_groups().await {
                Ok(groups) => format_group_list(&groups),
                Err(e) => {
                    error!("Failed to list tracked groups: {e}");
                    views::GENERIC_FAILURE.to_string()
                }
            };
            edit_html(&bot, chat_id, message_id, &text, None).await?;
        }
        ButtonAction::Help => {
            let help = views::help_text(settings.support_contact.as_deref());
            bot.edit_message_text(chat_id, message_id, help)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        ButtonAction::BackToMenu => {
            bot.edit_message_text(chat_id, message_id, views::BACK_TO_MENU)
                .reply_markup(views::main_menu_keyboard())
                .await?;
        }
    }

    Ok(())
}
