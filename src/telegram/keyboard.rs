//! Inline keyboards

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::kruzhok::Choice;

/// Builds an inline keyboard from rows of callback choices
pub fn inline_keyboard(rows: &[Vec<Choice>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|choice| InlineKeyboardButton::callback(choice.label.clone(), choice.data.clone()))
            .collect::<Vec<_>>()
    }))
}
