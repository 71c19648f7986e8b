//! Turning raw Telegram text into console events

use crate::gateway::redact_credentials;
use crate::runtime::Inbound;

/// Maximum characters of user text that reach the logs
pub const MAX_LOG_TEXT_LENGTH: usize = 50;

/// Map slash commands to their events; everything else is prompt input
pub fn parse_text(text: &str) -> Inbound {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix('/') {
        let command = rest.split_whitespace().next().unwrap_or_default();
        // Group chats append the bot name: /start@mongo_console_bot
        let command = command.split('@').next().unwrap_or(command);
        match command {
            "start" => return Inbound::Start,
            "cancel" => return Inbound::Cancel,
            "stop" => return Inbound::Stop,
            _ => {}
        }
    }
    Inbound::Text(text.to_string())
}

/// Render user text safe for logs: connection strings lose their password
/// and everything is truncated
pub fn mask_for_logging(text: &str) -> String {
    let text = text.trim();
    let masked = if text.starts_with("mongodb://") || text.starts_with("mongodb+srv://") {
        redact_credentials(text)
    } else {
        text.to_string()
    };

    if masked.chars().count() > MAX_LOG_TEXT_LENGTH {
        let head: String = masked.chars().take(MAX_LOG_TEXT_LENGTH).collect();
        format!("{head}...[truncated]")
    } else {
        masked
    }
}
