use crate::game::markup::{ITEM_TAG, OBJECT_TAG, render_markers};
use console::style;
use std::fmt::Display;

/// White bold: titles
pub fn header<D: Display>(text: D) -> String {
    style(text).white().bold().to_string()
}

/// Dim: hints, secondary text
pub fn dim<D: Display>(text: D) -> String {
    style(text).dim().to_string()
}

/// Yellow: warnings, rejected actions
pub fn yellow<D: Display>(text: D) -> String {
    style(text).yellow().to_string()
}

/// Cyan underlined: URLs, links
pub fn url<D: Display>(text: D) -> String {
    style(text).cyan().underlined().to_string()
}

/// Interactable object in story text
pub fn object<D: Display>(text: D) -> String {
    style(text).white().on_black().bold().to_string()
}

/// Collectable item in story text
pub fn item<D: Display>(text: D) -> String {
    style(text).white().on_blue().to_string()
}

/// Story text with `<object>` / `<item>` markers replaced by highlighting.
pub fn story(text: &str) -> String {
    render_markers(text, |tag, name| match tag {
        OBJECT_TAG => object(name),
        ITEM_TAG => item(name),
        _ => name.to_string(),
    })
}
