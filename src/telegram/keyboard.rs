//! Menu to inline keyboard conversion

use crate::menu::Menu;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// One keyboard row per menu row; callback data is the encoded token
pub fn build_keyboard(menu: &Menu) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = menu
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|entry| InlineKeyboardButton::callback(entry.label.clone(), entry.token.encode()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}
