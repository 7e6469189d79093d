// Document blocks
// One structural unit of a document each. Blocks know their height for a
// given width, paint themselves into a rectangle and report link regions
// relative to their own origin. Layout is cached for the last width.

use crate::config::DisplayConfig;
use crate::draw_context::{DrawContext, Rect, TextMetrics};
use crate::image::{ImageSource, Raster};
use crate::inline::{InlineFormatter, consume_bracket_links};
use crate::links::{LinkRegion, link_regions};
use crate::palette::Palette;
use crate::styled_text::{StyledRun, StyledText};
use crate::table::{TableLayout, TableModel, TableStyle};
use crate::text_layout::TextLayout;
use std::fmt;

/// Height of an image block whose raster could not be resolved
pub const MISSING_IMAGE_HEIGHT: f32 = 20.0;

const BULLET: &str = "•";

/// Inset of the "not found" message inside the placeholder
const PLACEHOLDER_INSET: f32 = 5.0;

// MARK: - Line classification

/// `N. ` preceded only by whitespace, or `- ` preceded only by whitespace
pub fn is_list_item(line: &str) -> bool {
    ordered_label(line).is_some() || unordered_indent(line).is_some()
}

/// Returns (leading whitespace count, number, text after `". "`)
fn ordered_label(line: &str) -> Option<(usize, &str, &str)> {
    let dot = line.find(". ").filter(|&i| i > 0)?;
    let before = &line[..dot];
    let number = before.trim_start();
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let leading = before.chars().count() - number.chars().count();
    Some((leading, number, &line[dot + 2..]))
}

/// Returns (leading whitespace count, text after `"- "`)
fn unordered_indent(line: &str) -> Option<(usize, &str)> {
    let hyphen = line.find("- ")?;
    let before = &line[..hyphen];
    if !before.chars().all(char::is_whitespace) {
        return None;
    }
    Some((before.chars().count(), &line[hyphen + 2..]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmonitionKind {
    Info,
    Hint,
    Important,
    Caution,
    Warning,
    Quote,
}

const ADMONITION_KEYWORDS: [(&str, AdmonitionKind); 5] = [
    ("INFO: ", AdmonitionKind::Info),
    ("HINT: ", AdmonitionKind::Hint),
    ("IMPORTANT: ", AdmonitionKind::Important),
    ("CAUTION: ", AdmonitionKind::Caution),
    ("WARNING: ", AdmonitionKind::Warning),
];

impl AdmonitionKind {
    /// Classify a line, returning the kind and the text after the keyword
    pub fn classify(line: &str) -> Option<(AdmonitionKind, &str)> {
        ADMONITION_KEYWORDS
            .iter()
            .find_map(|(keyword, kind)| line.strip_prefix(*keyword).map(|rest| (*kind, rest)))
            .or_else(|| {
                line.strip_prefix('>').map(|rest| {
                    (AdmonitionKind::Quote, rest.strip_prefix(' ').unwrap_or(rest))
                })
            })
    }

    /// Palette name of the accent colour
    pub fn colour_name(self) -> &'static str {
        match self {
            AdmonitionKind::Info => "blue",
            AdmonitionKind::Hint => "green",
            AdmonitionKind::Important => "red",
            AdmonitionKind::Caution => "yellow",
            AdmonitionKind::Warning => "orange",
            AdmonitionKind::Quote => "gray",
        }
    }
}

impl fmt::Display for AdmonitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdmonitionKind::Info => "info",
            AdmonitionKind::Hint => "hint",
            AdmonitionKind::Important => "important",
            AdmonitionKind::Caution => "caution",
            AdmonitionKind::Warning => "warning",
            AdmonitionKind::Quote => "quote",
        };
        f.write_str(name)
    }
}

pub fn is_admonition_line(line: &str) -> bool {
    AdmonitionKind::classify(line).is_some()
}

/// `{{...}}` alone on the line, or wrapped in a `[[...]]` link
pub fn is_image_line(line: &str) -> bool {
    let trimmed = line.trim_end();
    (line.starts_with("{{") && trimmed.ends_with("}}"))
        || (line.starts_with("[[")
            && trimmed.ends_with("]]")
            && line.contains("{{")
            && line.contains("}}"))
}

pub fn is_html_image_line(line: &str) -> bool {
    line.contains("<img") && line.contains("src=") && line.contains('>')
}

// MARK: - Cached text layout

#[derive(Debug, Clone, PartialEq)]
struct SizedText {
    width: f32,
    layout: TextLayout,
    links: Vec<LinkRegion>,
}

/// Styled text plus its layout for the last requested width
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedText {
    pub text: StyledText,
    sized: Option<SizedText>,
}

impl WrappedText {
    pub fn new(text: StyledText) -> Self {
        WrappedText { text, sized: None }
    }

    fn sized(&mut self, width: f32, metrics: &dyn TextMetrics) -> &SizedText {
        let width = width.max(0.0);
        if self.sized.as_ref().is_some_and(|s| s.width != width) {
            self.sized = None;
        }
        let text = &self.text;
        self.sized.get_or_insert_with(|| {
            let layout = TextLayout::new(text, width, metrics);
            let links = link_regions(text, &layout, metrics);
            SizedText { width, layout, links }
        })
    }

    pub fn height_for_width(&mut self, width: f32, metrics: &dyn TextMetrics) -> f32 {
        self.sized(width, metrics).layout.height()
    }

    pub fn draw(&mut self, ctx: &mut dyn DrawContext, x: f32, y: f32, width: f32) {
        let sized = self.sized(width, &*ctx);
        sized.layout.draw(ctx, x, y);
    }

    fn links(&self) -> &[LinkRegion] {
        self.sized.as_ref().map_or(&[], |s| s.links.as_slice())
    }
}

fn translated(regions: &[LinkRegion], dx: f32, dy: f32) -> impl Iterator<Item = LinkRegion> + '_ {
    regions.iter().map(move |r| LinkRegion {
        target: r.target.clone(),
        rect: r.rect.translated(dx, dy),
    })
}

// MARK: - Blocks

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub content: WrappedText,
}

impl TextBlock {
    pub fn new(lines: &[&str], formatter: &InlineFormatter) -> Self {
        TextBlock {
            content: WrappedText::new(formatter.format_lines(lines)),
        }
    }

    /// A single line holding `[[...]]` links
    pub fn link_line(line: &str, formatter: &InlineFormatter) -> Self {
        TextBlock::new(&[consume_bracket_links(line).as_str()], formatter)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItemBlock {
    /// Number plus `.`, a bullet, or nothing for the unlabelled fallback
    pub label: Option<WrappedText>,
    pub content: WrappedText,
    pub indent: f32,
    pub gap: f32,
}

impl ListItemBlock {
    pub fn new(line: &str, formatter: &InlineFormatter, indent_per_space: f32, gap: f32) -> Self {
        let line = consume_bracket_links(line);
        let label_text = |label: &str| {
            let mut text = StyledText::new();
            text.push(StyledRun::new(label, formatter.font(), formatter.default_colour()));
            Some(WrappedText::new(text))
        };

        let (label, indent, body) = if let Some((leading, number, rest)) = ordered_label(&line) {
            (label_text(&format!("{number}.")), leading, rest.trim_start())
        } else if let Some((leading, rest)) = unordered_indent(&line) {
            (label_text(BULLET), leading, rest.trim_start())
        } else {
            (None, 0, line.as_str())
        };

        ListItemBlock {
            label,
            content: WrappedText::new(formatter.format_text(body)),
            indent: indent_per_space * indent as f32,
            gap,
        }
    }

    fn text_offset(&self) -> f32 {
        self.indent + self.gap
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdmonitionBlock {
    pub kind: AdmonitionKind,
    pub content: WrappedText,
    pub accent: u32,
    pub icon_size: f32,
    pub margin: f32,
    pub line_width: f32,
}

impl AdmonitionBlock {
    pub fn new(line: &str, formatter: &InlineFormatter, config: &DisplayConfig) -> Self {
        let line = consume_bracket_links(line);
        let (kind, body) = AdmonitionKind::classify(&line).unwrap_or((AdmonitionKind::Quote, line.as_str()));
        let accent = formatter
            .palette()
            .resolve(kind.colour_name())
            .unwrap_or_else(|| formatter.default_colour());

        AdmonitionBlock {
            kind,
            content: WrappedText::new(formatter.format_text(body)),
            accent,
            icon_size: config.admonition_icon_size,
            margin: config.admonition_margin,
            line_width: config.admonition_line_width,
        }
    }

    fn text_offset(&self) -> f32 {
        self.icon_size + self.margin + self.line_width
    }

    fn text_width(&self, width: f32) -> f32 {
        width - self.icon_size - 2.0 * (self.margin + self.line_width)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub filename: String,
    pub max_width: Option<f32>,
    pub image: Option<Raster>,
    /// Target of a surrounding `[[target|...]]`
    pub link: Option<String>,
    pub colour: u32,
    pub message: WrappedText,
}

impl ImageBlock {
    /// Parse `{{name?maxWidth}}`, optionally wrapped in a link
    pub fn parse(line: &str, formatter: &InlineFormatter, images: Option<&dyn ImageSource>) -> Self {
        let link = wrapping_link(line);
        let inner = line
            .split_once("{{")
            .map(|(_, rest)| rest.split_once("}}").map_or(rest, |(name, _)| name))
            .unwrap_or_default();
        let (filename, max_width) = match inner.split_once('?') {
            Some((name, width)) => (name, parse_leading_int(width)),
            None => (inner, None),
        };

        Self::resolve(filename, max_width, link, formatter, images)
    }

    /// Parse `<img src="..." width="...">`, optionally wrapped in a link
    pub fn parse_html(line: &str, formatter: &InlineFormatter, images: Option<&dyn ImageSource>) -> Self {
        let tag = line
            .split_once("<img")
            .map(|(_, rest)| rest.split_once('>').map_or(rest, |(tag, _)| tag))
            .unwrap_or_default();
        let attribute = |name: &str| {
            tag.split_once(&format!("{name}=\""))
                .map(|(_, rest)| rest.split_once('"').map_or(rest, |(value, _)| value))
        };

        let filename = attribute("src").unwrap_or_default();
        let max_width = attribute("width").and_then(parse_leading_int);
        Self::resolve(filename, max_width, wrapping_link(line), formatter, images)
    }

    fn resolve(
        filename: &str,
        max_width: Option<f32>,
        link: Option<String>,
        formatter: &InlineFormatter,
        images: Option<&dyn ImageSource>,
    ) -> Self {
        let colour = formatter.default_colour();
        let mut message = String::new();
        let image = match images {
            Some(source) => source.resolve_image(filename).filter(Raster::is_valid),
            None => {
                message.push_str("no file source. ");
                None
            }
        };
        if image.is_none() {
            tracing::debug!(filename, "image not resolved, using placeholder");
            message.push_str(filename);
            message.push_str(" not found.");
        }

        let mut text = StyledText::new();
        text.push(StyledRun::new(message, formatter.font(), colour));

        ImageBlock {
            filename: filename.to_string(),
            max_width,
            image,
            link,
            colour,
            message: WrappedText::new(text),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.image.is_none()
    }

    /// Width actually covered by the image
    fn image_width(&self, width: f32) -> f32 {
        self.max_width.map_or(width, |max| max.min(width))
    }

    fn height(&self, width: f32) -> f32 {
        match &self.image {
            Some(image) => self.image_width(width) * image.height as f32 / image.width as f32,
            None => MISSING_IMAGE_HEIGHT,
        }
    }
}

/// Target of a `[[target|...]]` wrapped around the whole line
fn wrapping_link(line: &str) -> Option<String> {
    line.trim()
        .strip_prefix("[[")
        .and_then(|inner| inner.split_once('|'))
        .map(|(target, _)| target.trim().to_string())
        .filter(|target| !target.is_empty())
}

/// Leading decimal digits as a positive width; anything else is no limit
fn parse_leading_int(s: &str) -> Option<f32> {
    let s = s.trim_start();
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse::<u32>().ok().filter(|&w| w > 0).map(|w| w as f32)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub model: TableModel,
    pub style: TableStyle,
    layout: Option<TableLayout>,
    links: Vec<LinkRegion>,
    scroll_x: f32,
    viewport_width: f32,
}

impl TableBlock {
    pub fn new<S: AsRef<str>>(lines: &[S], formatter: &InlineFormatter, style: TableStyle) -> Self {
        TableBlock {
            model: TableModel::parse(lines, formatter),
            style,
            layout: None,
            links: Vec::new(),
            scroll_x: 0.0,
            viewport_width: 0.0,
        }
    }

    fn measured(&mut self, metrics: &dyn TextMetrics) -> &TableLayout {
        let model = &self.model;
        let style = &self.style;
        let links = &mut self.links;
        self.layout.get_or_insert_with(|| {
            let layout = TableLayout::measure(model, style, metrics);
            *links = layout.link_regions(model, style, metrics);
            layout
        })
    }

    /// Natural width of the table, without margins
    pub fn width_required(&mut self, metrics: &dyn TextMetrics) -> f32 {
        self.measured(metrics).width
    }

    pub fn scroll_x(&self) -> f32 {
        self.scroll_x
    }

    /// Scroll horizontally by `dx`, clamped to the overflow. Returns the
    /// new offset.
    pub fn scroll_by(&mut self, dx: f32) -> f32 {
        let max = self
            .layout
            .as_ref()
            .map_or(0.0, |l| l.max_scroll(&self.style, self.viewport_width));
        self.scroll_x = (self.scroll_x + dx).clamp(0.0, max);
        self.scroll_x
    }
}

/// A structural unit of a document
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(TextBlock),
    ListItem(ListItemBlock),
    Admonition(AdmonitionBlock),
    Image(ImageBlock),
    Table(TableBlock),
}

impl Block {
    /// Only tables may extend beyond the side margins
    pub fn can_extend_beyond_margin(&self) -> bool {
        matches!(self, Block::Table(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Block::Text(_) => "text",
            Block::ListItem(_) => "list-item",
            Block::Admonition(_) => "admonition",
            Block::Image(_) => "image",
            Block::Table(_) => "table",
        }
    }

    /// The block's styled content, where it has one
    pub fn styled_text(&self) -> Option<&StyledText> {
        match self {
            Block::Text(b) => Some(&b.content.text),
            Block::ListItem(b) => Some(&b.content.text),
            Block::Admonition(b) => Some(&b.content.text),
            Block::Image(_) | Block::Table(_) => None,
        }
    }

    /// Height needed at `width`; lays the block out as a side effect
    pub fn height_for_width(&mut self, width: f32, metrics: &dyn TextMetrics) -> f32 {
        match self {
            Block::Text(b) => b.content.height_for_width(width, metrics),
            // an empty item still needs room for its label
            Block::ListItem(b) => {
                let offset = b.text_offset();
                let label = b
                    .label
                    .as_mut()
                    .map_or(0.0, |l| l.height_for_width(f32::INFINITY, metrics));
                b.content.height_for_width(width - offset, metrics).max(label)
            }
            Block::Admonition(b) => {
                let text_width = b.text_width(width);
                b.content.height_for_width(text_width, metrics).max(b.icon_size)
            }
            Block::Image(b) => {
                if b.is_missing() {
                    b.message
                        .height_for_width(width - 2.0 * PLACEHOLDER_INSET, metrics);
                }
                b.height(width)
            }
            // tables ignore the width and scroll instead
            Block::Table(b) => {
                b.viewport_width = width;
                b.measured(metrics).height
            }
        }
    }

    /// Link rectangles relative to the block's origin. Valid after
    /// `height_for_width`.
    pub fn link_regions(&self, width: f32) -> Vec<LinkRegion> {
        match self {
            Block::Text(b) => b.content.links().to_vec(),
            Block::ListItem(b) => translated(b.content.links(), b.text_offset(), 0.0).collect(),
            Block::Admonition(b) => translated(b.content.links(), b.text_offset(), 0.0).collect(),
            Block::Image(b) => match &b.link {
                Some(target) => vec![LinkRegion {
                    target: target.clone(),
                    rect: Rect::new(0.0, 0.0, b.image_width(width), b.height(width)),
                }],
                None => Vec::new(),
            },
            Block::Table(b) => translated(&b.links, -b.scroll_x, 0.0).collect(),
        }
    }

    /// Paint into `bounds`, laying out for `bounds.w` if needed
    pub fn paint(&mut self, ctx: &mut dyn DrawContext, bounds: Rect) {
        let (x, y, width) = (bounds.x, bounds.y, bounds.w);
        match self {
            Block::Text(b) => b.content.draw(ctx, x, y, width),
            Block::ListItem(b) => {
                let offset = b.text_offset();
                if let Some(label) = &mut b.label {
                    label.draw(ctx, x + b.indent, y, f32::INFINITY);
                }
                b.content.draw(ctx, x + offset, y, width - offset);
            }
            Block::Admonition(b) => {
                let height = bounds.h;
                ctx.set_color(b.accent);
                ctx.draw_rect_filled(Rect::new(x, y, b.icon_size, b.icon_size));
                ctx.draw_rect_filled(Rect::new(x + b.icon_size, y, b.line_width, height));
                ctx.draw_rect_filled(Rect::new(x + width - b.line_width, y, b.line_width, height));
                let offset = b.text_offset();
                let text_width = b.text_width(width);
                b.content.draw(ctx, x + offset, y, text_width);
            }
            Block::Image(b) => {
                let height = b.height(width);
                match &b.image {
                    Some(image) => {
                        ctx.draw_image(image, Rect::new(x, y, b.image_width(width), height));
                    }
                    None => {
                        let rect = Rect::new(x, y, width, height);
                        ctx.set_color(b.colour);
                        ctx.draw_rect_outline(rect);
                        ctx.draw_line(rect.x, rect.y, rect.right(), rect.bottom());
                        ctx.draw_line(rect.right(), rect.y, rect.x, rect.bottom());
                        let inner = rect.reduced(PLACEHOLDER_INSET, PLACEHOLDER_INSET);
                        ctx.push_clip(inner);
                        b.message.draw(ctx, inner.x, inner.y, inner.w);
                        ctx.pop_clip();
                    }
                }
            }
            Block::Table(b) => {
                b.measured(&*ctx);
                if let Some(layout) = &b.layout {
                    ctx.push_clip(bounds);
                    layout.paint(&b.model, &b.style, ctx, x - b.scroll_x, y);
                    ctx.pop_clip();
                }
            }
        }
    }

    /// One-line description used by the document outline
    pub fn summary(&self) -> String {
        const PREVIEW: usize = 40;
        let preview = |text: &StyledText| {
            let plain = text.plain_text().replace(" \n", " ");
            let mut chars = plain.chars();
            let mut short: String = chars.by_ref().take(PREVIEW).collect();
            if chars.next().is_some() {
                short.push('…');
            }
            format!("{short:?}")
        };

        match self {
            Block::Text(b) => format!("text {}", preview(&b.content.text)),
            Block::ListItem(b) => {
                let label = b
                    .label
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |l| l.text.plain_text());
                format!("list-item {label} indent={} {}", b.indent, preview(&b.content.text))
            }
            Block::Admonition(b) => format!("admonition {} {}", b.kind, preview(&b.content.text)),
            Block::Image(b) => {
                let size = match &b.image {
                    Some(image) => format!("{}x{}", image.width, image.height),
                    None => "missing".to_string(),
                };
                let link = b
                    .link
                    .as_ref()
                    .map(|l| format!(" -> {l}"))
                    .unwrap_or_default();
                format!("image {:?} {size}{link}", b.filename)
            }
            Block::Table(b) => format!(
                "table {} rows x {} columns",
                b.model.rows.len(),
                b.model.column_count()
            ),
        }
    }
}

/// Table style from the layout configuration
pub fn table_style(config: &DisplayConfig, palette: &Palette) -> TableStyle {
    let (background, header_background) = config.table_colours(palette);
    TableStyle {
        cell_margin: config.table_cell_margin,
        gap: config.table_gap,
        left_margin: config.margin,
        background,
        header_background,
    }
}
