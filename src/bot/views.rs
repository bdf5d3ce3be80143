//! Keyboards, callback data and fixed texts
//!
//! Contains every static piece of UI the bot shows.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::warn;
use url::Url;

// ─────────────────────────────────────────────────────────────────────────────
// Callback data
// ─────────────────────────────────────────────────────────────────────────────

/// Inline button presses the bot understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Explain how to run `/check`
    CheckUser,
    /// Show the tracked group list
    SelectCommunity,
    /// Show help
    Help,
    /// Return to the main menu
    BackToMenu,
}

impl ButtonAction {
    /// Callback data carried by the button
    #[must_use]
    pub const fn data(self) -> &'static str {
        match self {
            Self::CheckUser => "check_user",
            Self::SelectCommunity => "select_community",
            Self::Help => "help",
            Self::BackToMenu => "back_to_menu",
        }
    }

    /// Decode callback data; `None` for anything unknown
    #[must_use]
    pub fn from_data(data: &str) -> Option<Self> {
        [
            Self::CheckUser,
            Self::SelectCommunity,
            Self::Help,
            Self::BackToMenu,
        ]
        .into_iter()
        .find(|action| action.data() == data)
    }

    fn button(self, label: &str) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(label, self.data())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// Main menu shown by `/start` and "Back to Menu"
#[must_use]
pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![ButtonAction::CheckUser.button("👤 Check User")],
        vec![ButtonAction::SelectCommunity.button("🌐 Select Community")],
        vec![ButtonAction::Help.button("🆘 Help")],
    ])
}

/// Single "Back to Menu" button attached to reports
#[must_use]
pub fn back_to_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        ButtonAction::BackToMenu.button("🔙 Back to Menu")
    ]])
}

/// Link that opens a private chat with the bot
///
/// # Errors
///
/// Returns an error if `bot_username` does not form a valid URL.
pub fn dm_link(bot_username: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("https://t.me/{}", bot_username.trim_start_matches('@')))
}

/// Keyboard pointing group users to the private chat
#[must_use]
pub fn dm_redirect_keyboard(bot_username: &str) -> InlineKeyboardMarkup {
    let mut rows = Vec::with_capacity(2);
    if bot_username.trim_start_matches('@').is_empty() {
        warn!("No bot username known; omitting DM link");
    } else {
        match dm_link(bot_username) {
            Ok(url) => rows.push(vec![InlineKeyboardButton::url("🧑‍💻 Open Bot in DM", url)]),
            Err(e) => warn!("Cannot build DM link for @{bot_username}: {e}"),
        }
    }
    rows.push(vec![ButtonAction::Help.button("🆘 Help")]);
    InlineKeyboardMarkup::new(rows)
}

// ─────────────────────────────────────────────────────────────────────────────
// Texts
// ─────────────────────────────────────────────────────────────────────────────

/// Welcome shown in private chat
pub const WELCOME: &str =
    "👋 Welcome to <b>EmTeamTrackerBot!</b>\n\nUse the buttons below to navigate.";

/// Header when returning to the menu
pub const BACK_TO_MENU: &str = "🔙 Back to Main Menu:";

/// Prompt shown by the "Check User" button
pub const CHECK_PROMPT: &str = "🔍 Please type the command: <code>/check @username</code>";

/// Reply to `/check` without a target
pub const CHECK_USAGE: &str = "Usage: /check @username";

/// Reply when the sender of a command is unknown
pub const UNKNOWN_CALLER: &str = "Error: Could not identify user.";

/// Reply when storage fails during a request
pub const GENERIC_FAILURE: &str = "⚠️ Something went wrong while reading activity data. Please try again later.";

/// Notice for `/start` used in a group
pub const DM_ONLY_START: &str = "⚠️ This bot works best in DM. Click below to continue:";

/// Notice for `/check` used in a group
pub const DM_ONLY_CHECK: &str = "⚠️ For full features, please DM me.";

/// Notice for other commands used in a group
pub const DM_ONLY_COMMAND: &str = "⚠️ Please use this command in DM.";

const HELP: &str = "📌 <b>EmTeamTrackerBot Help</b>\n\n\
    🔸 <code>/check @username</code> - See messages from your allowed communities\n\
    🔸 <code>/groups</code> - View tracked group list\n\
    🔸 Use only in DM for full functionality";

/// Help text, with a support line when a contact is configured
#[must_use]
pub fn help_text(support_contact: Option<&str>) -> String {
    match support_contact
        .map(|c| c.trim_start_matches('@'))
        .filter(|c| !c.is_empty())
    {
        Some(contact) => format!(
            "{HELP}\n\n💬 Contact @{} for support",
            html_escape::encode_text(contact)
        ),
        None => HELP.to_string(),
    }
}

/// Greeting posted when the bot joins a group
pub const GROUP_WELCOME: &str = "👋 <b>Hello Everyone!</b>\n\n\
    Thank you for adding <b>EmTeamTrackerBot</b> to this community.\n\n\
    🔎 This bot helps track and analyze user message activity across groups.\n\
    To use advanced features, please DM me directly.";

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_button_data_round_trip() {
        for action in [
            ButtonAction::CheckUser,
            ButtonAction::SelectCommunity,
            ButtonAction::Help,
            ButtonAction::BackToMenu,
        ] {
            assert_eq!(ButtonAction::from_data(action.data()), Some(action));
        }
        assert_eq!(ButtonAction::from_data("weekly_report"), None);
        assert_eq!(ButtonAction::from_data(""), None);
    }

    #[test]
    fn test_main_menu_layout() {
        let menu = main_menu_keyboard();
        let data: Vec<String> = menu
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(d) => Some(d.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(data, vec!["check_user", "select_community", "help"]);
    }

    #[test]
    fn test_dm_link() {
        assert_eq!(dm_link("@EmTrack_bot").unwrap().as_str(), "https://t.me/EmTrack_bot");
        assert_eq!(dm_link("EmTrack_bot").unwrap().as_str(), "https://t.me/EmTrack_bot");
    }

    #[test]
    fn test_dm_redirect_keyboard_has_link_and_help() {
        let kb = dm_redirect_keyboard("EmTrack_bot");
        assert_eq!(kb.inline_keyboard.len(), 2);
        assert!(matches!(
            &kb.inline_keyboard[0][0].kind,
            InlineKeyboardButtonKind::Url(url) if url.as_str() == "https://t.me/EmTrack_bot"
        ));
        assert!(matches!(
            &kb.inline_keyboard[1][0].kind,
            InlineKeyboardButtonKind::CallbackData(d) if d == "help"
        ));
    }

    #[test]
    fn test_dm_redirect_keyboard_without_username() {
        for name in ["", "@"] {
            let kb = dm_redirect_keyboard(name);
            assert_eq!(kb.inline_keyboard.len(), 1);
            assert!(matches!(
                &kb.inline_keyboard[0][0].kind,
                InlineKeyboardButtonKind::CallbackData(d) if d == "help"
            ));
        }
    }

    #[test]
    fn test_help_text_support_line() {
        assert!(!help_text(None).contains("Contact"));
        assert!(!help_text(Some("")).contains("Contact"));
        assert!(help_text(Some("@Emranrx")).ends_with("💬 Contact @Emranrx for support"));
        assert!(help_text(Some("Emranrx")).ends_with("💬 Contact @Emranrx for support"));
    }
}
