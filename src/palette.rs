// Colour palette
// Named colours used by <c:name> tags, admonition tabs and table backgrounds.
// Colours are packed as 0xRRGGBBAA throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque black, the text colour when the palette has no `default` entry
pub const BLACK: u32 = 0x000000FF;

/// Default palette: CGA 16 colours with some extensions
const DEFAULT_COLOURS: [(&str, &str); 22] = [
    ("black", "#000"),
    ("blue", "#00A"),
    ("green", "#0A0"),
    ("cyan", "#0AA"),
    ("red", "#A00"),
    ("magenta", "#A0A"),
    ("brown", "#A50"),
    ("lightgray", "#AAA"),
    ("darkgray", "#555"),
    ("lightblue", "#55F"),
    ("lightgreen", "#5F5"),
    ("lightcyan", "#5FF"),
    ("lightred", "#F55"),
    ("lightmagenta", "#F5F"),
    ("yellow", "#FF5"),
    ("white", "#FFF"),
    ("orange", "#FA5"),
    ("pink", "#F5F"),
    ("darkyellow", "#AA0"),
    ("purple", "#A0F"),
    ("gray", "#777"),
    ("linkcolour", "#00A"),
];

/// Parse `#RGB`, `#ARGB`, `#RRGGBB` or `#AARRGGBB` into 0xRRGGBBAA.
///
/// Three and four digit forms are expanded by doubling every digit. The
/// leading `#` is optional. Returns `None` for an empty value or anything
/// that is not hexadecimal.
pub fn parse_hex_colour(s: &str) -> Option<u32> {
    let digits = s.trim().trim_start_matches('#');
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let expanded: String = match digits.len() {
        3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => digits.to_string(),
        _ => return None,
    };
    let argb = if expanded.len() == 6 {
        format!("FF{expanded}")
    } else {
        expanded
    };

    let value = u32::from_str_radix(&argb, 16).ok()?;
    Some(value.rotate_left(8))
}

/// Name to hex-string mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    colours: BTreeMap<String, String>,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            colours: DEFAULT_COLOURS
                .iter()
                .map(|(name, hex)| (name.to_string(), hex.to_string()))
                .collect(),
        }
    }
}

impl Palette {
    /// A palette without any entries
    pub fn empty() -> Self {
        Palette {
            colours: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.colours.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, hex: impl Into<String>) {
        self.colours.insert(name.into(), hex.into());
    }

    /// Replace all entries at once
    pub fn replace(&mut self, other: Palette) {
        *self = other;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.colours.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.colours.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Look up a named colour. Unknown names and unparsable values give `None`.
    pub fn resolve(&self, name: &str) -> Option<u32> {
        let resolved = self.get(name).and_then(parse_hex_colour);
        if resolved.is_none() {
            tracing::trace!(name, "palette has no usable colour");
        }
        resolved
    }

    pub fn default_colour(&self) -> u32 {
        self.get("default")
            .and_then(parse_hex_colour)
            .unwrap_or(BLACK)
    }

    pub fn link_colour(&self) -> u32 {
        self.resolve("linkcolour")
            .or_else(|| self.resolve("blue"))
            .unwrap_or_else(|| self.default_colour())
    }
}
