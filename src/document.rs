// Document builder
// A single forward pass over the lines of a markup string. Every line
// classifies as something; plain text is the fallback.

use crate::blocks::{
    AdmonitionBlock, Block, ImageBlock, ListItemBlock, TableBlock, TextBlock, is_admonition_line,
    is_html_image_line, is_image_line, is_list_item, table_style,
};
use crate::config::DisplayConfig;
use crate::image::ImageSource;
use crate::inline::{InlineFormatter, contains_bracket_link};
use crate::palette::Palette;
use crate::table::is_table_line;
use std::fmt;

/// Everything a block needs while parsing
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub palette: &'a Palette,
    pub config: &'a DisplayConfig,
    pub images: Option<&'a dyn ImageSource>,
}

impl<'a> ParseContext<'a> {
    pub fn new(palette: &'a Palette, config: &'a DisplayConfig) -> Self {
        ParseContext {
            palette,
            config,
            images: None,
        }
    }

    pub fn with_images(mut self, images: &'a dyn ImageSource) -> Self {
        self.images = Some(images);
        self
    }
}

/// Line classes in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    ListItem,
    Admonition,
    Image,
    HtmlImage,
    Table,
    LinkLine,
    Text,
}

impl LineKind {
    pub fn classify(line: &str) -> LineKind {
        if is_list_item(line) {
            LineKind::ListItem
        } else if is_admonition_line(line) {
            LineKind::Admonition
        } else if is_image_line(line) {
            LineKind::Image
        } else if is_html_image_line(line) {
            LineKind::HtmlImage
        } else if is_table_line(line) {
            LineKind::Table
        } else if contains_bracket_link(line) {
            LineKind::LinkLine
        } else {
            LineKind::Text
        }
    }
}

/// Ordered blocks of one markup string
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Build a document. Never fails: unrecognized content becomes text.
    pub fn parse(markup: &str, ctx: &ParseContext) -> Self {
        let lines: Vec<&str> = markup.lines().collect();
        let formatter = InlineFormatter::new(ctx.palette, ctx.config.font());
        let mut blocks = Vec::new();
        let mut li = 0;

        while li < lines.len() {
            let line = lines[li];
            let kind = LineKind::classify(line);
            tracing::trace!(line = li, ?kind, "classified line");

            match kind {
                LineKind::ListItem => {
                    blocks.push(Block::ListItem(ListItemBlock::new(
                        line,
                        &formatter,
                        ctx.config.list_indent_per_space,
                        ctx.config.list_label_gap,
                    )));
                    li += 1;
                }
                LineKind::Admonition => {
                    blocks.push(Block::Admonition(AdmonitionBlock::new(line, &formatter, ctx.config)));
                    li += 1;
                }
                LineKind::Image => {
                    blocks.push(Block::Image(ImageBlock::parse(line, &formatter, ctx.images)));
                    li += 1;
                }
                LineKind::HtmlImage => {
                    blocks.push(Block::Image(ImageBlock::parse_html(line, &formatter, ctx.images)));
                    li += 1;
                }
                LineKind::Table => {
                    let start = li;
                    while li < lines.len() && is_table_line(lines[li]) {
                        li += 1;
                    }
                    blocks.push(Block::Table(TableBlock::new(
                        &lines[start..li],
                        &formatter,
                        table_style(ctx.config, ctx.palette),
                    )));
                }
                LineKind::LinkLine => {
                    blocks.push(Block::Text(TextBlock::link_line(line, &formatter)));
                    li += 1;
                }
                LineKind::Text => {
                    let start = li;
                    li = text_block_end(&lines, li);
                    blocks.push(Block::Text(TextBlock::new(&lines[start..li], &formatter)));
                }
            }
        }

        tracing::debug!(lines = lines.len(), blocks = blocks.len(), "parsed document");
        Document { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}

/// Index one past the last line of the text block starting at `start`.
///
/// The block runs until a line of another kind, or until a blank line that
/// is followed by a non-blank one. Blank lines at the end of the input stay
/// in the block.
fn text_block_end(lines: &[&str], start: usize) -> usize {
    let mut li = start;
    let mut block_end = false;

    while li < lines.len() && !block_end && LineKind::classify(lines[li]) == LineKind::Text {
        block_end = lines[li].is_empty();
        li += 1;
        block_end &= lines.get(li).is_some_and(|next| !next.is_empty());
    }

    // the first line always belongs to the block
    li.max(start + 1)
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            writeln!(f, "{i}: {}", block.summary())?;
        }
        Ok(())
    }
}
