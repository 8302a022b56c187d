//! Named terminal styles. Rendering code refers to what is shown (a folder, a tag, a
//! timestamp), never to raw colors.

use console::Style;
use once_cell::sync::Lazy;

pub static FOLDER: Lazy<Style> = Lazy::new(|| Style::new().bold());
pub static TITLE: Lazy<Style> = Lazy::new(Style::new);
pub static TAG: Lazy<Style> = Lazy::new(|| Style::new().cyan());
pub static NOTE: Lazy<Style> = Lazy::new(|| Style::new().italic());
pub static BADGE: Lazy<Style> = Lazy::new(|| Style::new().magenta());
pub static MUTED: Lazy<Style> = Lazy::new(|| Style::new().color256(246));
pub static TIME: Lazy<Style> = Lazy::new(|| Style::new().color256(246).italic());
pub static ID: Lazy<Style> = Lazy::new(|| Style::new().dim());

pub static SUCCESS: Lazy<Style> = Lazy::new(|| Style::new().green());
pub static WARNING: Lazy<Style> = Lazy::new(|| Style::new().yellow());
