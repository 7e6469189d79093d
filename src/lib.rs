// Library exports for barelyml

pub mod blocks;
pub mod config;
pub mod convert;
pub mod display;
pub mod document;
pub mod draw_context;
pub mod image;
pub mod inline;
pub mod links;
pub mod palette;
pub mod styled_text;
pub mod svg;
pub mod table;
pub mod text_layout;

pub use config::{ConfigError, DisplayConfig};
pub use display::MarkupDisplay;
pub use document::{Document, ParseContext};
pub use palette::Palette;
