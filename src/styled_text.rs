// Styled text model
// The output of the inline formatter: runs of uniformly styled text plus
// link ranges over the flattened text.

use crate::draw_context::Font;
use unicode_segmentation::UnicodeSegmentation;

/// Number of glyphs in `text`. Every extended grapheme cluster counts as
/// one glyph, whitespace and newlines included. Link offsets and the
/// layout's glyph walk both use this count.
pub fn glyph_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// A contiguous span sharing one font, colour and link target
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub font: Font,
    pub colour: u32,
    pub link: Option<String>,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, font: Font, colour: u32) -> Self {
        StyledRun {
            text: text.into(),
            font,
            colour,
            link: None,
        }
    }
}

/// Link target with a glyph range `[start, end)` into the flattened text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    pub target: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyledText {
    pub runs: Vec<StyledRun>,
    pub links: Vec<LinkSpan>,
    glyphs: usize,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run; empty text is dropped so run boundaries only ever
    /// separate visible content
    pub fn push(&mut self, run: StyledRun) {
        if run.text.is_empty() {
            return;
        }
        self.glyphs += glyph_len(&run.text);
        self.runs.push(run);
    }

    /// Record a link. Zero-length ranges are never stored.
    pub fn push_link(&mut self, target: impl Into<String>, start: usize, end: usize) {
        let target = target.into();
        if end > start && !target.is_empty() {
            self.links.push(LinkSpan { target, start, end });
        }
    }

    /// Glyphs emitted so far; the next run starts at this offset
    pub fn glyph_count(&self) -> usize {
        self.glyphs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}
