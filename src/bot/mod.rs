/// Inline keyboard callbacks
pub mod callbacks;
/// Command and chat event handlers
pub mod handlers;
/// Sending HTML within Telegram's size limit
pub mod messaging;
/// Keyboards, callback data and fixed texts
pub mod views;
