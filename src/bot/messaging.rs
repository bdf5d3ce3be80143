//! Sending and editing HTML messages within Telegram's size limit.

use crate::report::{split_for_telegram, TELEGRAM_MESSAGE_LIMIT};
use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId, ParseMode};

/// Sends HTML text, splitting it into several messages if needed.
///
/// The keyboard, if any, is attached to the last part.
///
/// # Errors
///
/// Returns an error if any part fails to send.
pub async fn send_html(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    let parts = split_for_telegram(text, TELEGRAM_MESSAGE_LIMIT);
    let last = parts.len().saturating_sub(1);

    for (i, part) in parts.into_iter().enumerate() {
        let mut req = bot.send_message(chat_id, part).parse_mode(ParseMode::Html);
        if i == last {
            if let Some(kb) = keyboard.clone() {
                req = req.reply_markup(kb);
            }
        }
        req.await?;
    }

    Ok(())
}

/// Replaces a message's text with HTML, sending any overflow as new messages.
///
/// # Errors
///
/// Returns an error if the edit or an overflow message fails.
pub async fn edit_html(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    let mut parts = split_for_telegram(text, TELEGRAM_MESSAGE_LIMIT).into_iter();
    let Some(first) = parts.next() else {
        return Ok(());
    };
    let overflow: Vec<String> = parts.collect();

    let mut req = bot
        .edit_message_text(chat_id, message_id, first)
        .parse_mode(ParseMode::Html);
    if overflow.is_empty() {
        if let Some(kb) = keyboard.clone() {
            req = req.reply_markup(kb);
        }
    }
    req.await?;

    if !overflow.is_empty() {
        send_html(bot, chat_id, &overflow.join("\n"), keyboard).await?;
    }

    Ok(())
}
