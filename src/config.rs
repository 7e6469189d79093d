use crate::draw_context::Font;
use crate::palette::Palette;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse config: {0}")]
    InvalidToml(#[from] toml::de::Error),
}

/// Layout configuration of a `MarkupDisplay`, in pixel-equivalent units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Side, top and bottom margin of the content
    pub margin: f32,
    /// Vertical space after every block
    pub block_spacing: f32,
    pub table_cell_margin: f32,
    pub table_gap: f32,
    /// List indent per leading whitespace character
    pub list_indent_per_space: f32,
    /// Gutter between a list label and the item text
    pub list_label_gap: f32,
    pub admonition_icon_size: f32,
    pub admonition_margin: f32,
    pub admonition_line_width: f32,
    pub font_size: f32,
    /// Palette name for body text; the palette's `default` entry otherwise
    pub text_colour: Option<String>,
    /// Palette name for the document background
    pub background: String,
    /// Palette name for table cells
    pub table_background: String,
    /// Palette name for table header cells
    pub table_header_background: String,
    /// Replaces the default palette when present
    pub palette: Option<Palette>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            margin: 20.0,
            block_spacing: 5.0,
            table_cell_margin: 10.0,
            table_gap: 2.0,
            list_indent_per_space: 10.0,
            list_label_gap: 10.0,
            admonition_icon_size: 20.0,
            admonition_margin: 10.0,
            admonition_line_width: 2.0,
            font_size: 15.0,
            text_colour: None,
            background: "white".to_string(),
            table_background: "lightgray".to_string(),
            table_header_background: "lightcyan".to_string(),
            palette: None,
        }
    }
}

impl DisplayConfig {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: DisplayConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(config.sanitized())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DisplayConfig = toml::from_str(content)?;
        Ok(config.sanitized())
    }

    /// The configured palette, or the default one, with `text_colour`
    /// applied as its `default` entry
    pub fn palette(&self) -> Palette {
        let mut palette = self.palette.clone().unwrap_or_default();
        if let Some(name) = &self.text_colour {
            match palette.get(name).map(str::to_string) {
                Some(hex) => palette.set("default", hex),
                None => tracing::warn!(colour = name.as_str(), "unknown text colour, keeping the default"),
            }
        }
        palette
    }

    pub fn font(&self) -> Font {
        Font::new(self.font_size)
    }

    /// Background colour resolved against `palette`, white if unknown
    pub fn background_colour(&self, palette: &Palette) -> u32 {
        palette.resolve(&self.background).unwrap_or(0xFFFFFFFF)
    }

    pub fn table_colours(&self, palette: &Palette) -> (u32, u32) {
        let cell = palette.resolve(&self.table_background).unwrap_or(0xAAAAAAFF);
        let header = palette
            .resolve(&self.table_header_background)
            .unwrap_or(cell);
        (cell, header)
    }

    // Negative or non-finite values would break the layout arithmetic
    fn sanitized(mut self) -> Self {
        let defaults = DisplayConfig::default();
        let fields = [
            (&mut self.margin, defaults.margin, "margin"),
            (&mut self.block_spacing, defaults.block_spacing, "block_spacing"),
            (&mut self.table_cell_margin, defaults.table_cell_margin, "table_cell_margin"),
            (&mut self.table_gap, defaults.table_gap, "table_gap"),
            (&mut self.list_indent_per_space, defaults.list_indent_per_space, "list_indent_per_space"),
            (&mut self.list_label_gap, defaults.list_label_gap, "list_label_gap"),
            (&mut self.admonition_icon_size, defaults.admonition_icon_size, "admonition_icon_size"),
            (&mut self.admonition_margin, defaults.admonition_margin, "admonition_margin"),
            (&mut self.admonition_line_width, defaults.admonition_line_width, "admonition_line_width"),
        ];
        for (value, default, name) in fields {
            if !value.is_finite() || *value < 0.0 {
                tracing::warn!(field = name, value = *value, "invalid layout value, using default");
                *value = default;
            }
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            tracing::warn!(value = self.font_size, "invalid font size, using default");
            self.font_size = defaults.font_size;
        }
        self
    }
}
