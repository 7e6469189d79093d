// Markup display
// The document container: owns the parsed document, places its blocks in a
// vertically scrolling viewport and routes pointer input to links.

use crate::blocks::Block;
use crate::config::DisplayConfig;
use crate::convert::{asciidoc_to_barelyml, dokuwiki_to_barelyml, markdown_to_barelyml};
use crate::document::{Document, ParseContext};
use crate::draw_context::{CursorKind, DrawContext, Rect, TextMetrics};
use crate::image::ImageSource;
use crate::links::{LinkOpener, LinkRegistry, NoopLinkOpener};
use crate::palette::Palette;

/// Pointer travel beyond which a press counts as a drag, not a click
pub const CLICK_SLOP: f32 = 20.0;

pub struct MarkupDisplay {
    config: DisplayConfig,
    palette: Palette,
    images: Option<Box<dyn ImageSource>>,
    opener: Box<dyn LinkOpener>,

    markup: String,
    document: Document,

    // Viewport
    width: f32,
    height: f32,
    scroll_y: f32,

    // Layout cache
    bounds: Vec<Rect>,
    content_height: f32,
    layout_valid: bool,
    links: LinkRegistry,

    // Pointer state
    press: Option<(f32, f32)>,
    cursor: CursorKind,
}

impl MarkupDisplay {
    pub fn new(config: DisplayConfig) -> Self {
        let palette = config.palette();
        MarkupDisplay {
            config,
            palette,
            images: None,
            opener: Box::new(NoopLinkOpener),
            markup: String::new(),
            document: Document::default(),
            width: 0.0,
            height: 0.0,
            scroll_y: 0.0,
            bounds: Vec::new(),
            content_height: 0.0,
            layout_valid: false,
            links: LinkRegistry::new(),
            press: None,
            cursor: CursorKind::Default,
        }
    }

    /// Replace the content. The document is rebuilt from scratch.
    pub fn set_markup_string(&mut self, markup: &str) {
        self.markup = markup.to_string();
        self.rebuild();
    }

    pub fn set_markdown_string(&mut self, markdown: &str) {
        self.set_markup_string(&markdown_to_barelyml(markdown));
    }

    pub fn set_dokuwiki_string(&mut self, dokuwiki: &str) {
        self.set_markup_string(&dokuwiki_to_barelyml(dokuwiki));
    }

    pub fn set_asciidoc_string(&mut self, asciidoc: &str) {
        self.set_markup_string(&asciidoc_to_barelyml(asciidoc));
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Replace the palette wholesale
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette.replace(palette);
        self.rebuild();
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_config(&mut self, config: DisplayConfig) {
        self.palette = config.palette();
        self.config = config;
        self.rebuild();
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn set_image_source(&mut self, images: impl ImageSource + 'static) {
        self.images = Some(Box::new(images));
        self.rebuild();
    }

    pub fn set_link_opener(&mut self, opener: impl LinkOpener + 'static) {
        self.opener = Box::new(opener);
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn rebuild(&mut self) {
        let mut ctx = ParseContext::new(&self.palette, &self.config);
        if let Some(images) = self.images.as_deref() {
            ctx = ctx.with_images(images);
        }
        self.document = Document::parse(&self.markup, &ctx);
        self.layout_valid = false;
        self.links.clear();
        self.bounds.clear();
    }

    /// Set the viewport size and lay the blocks out again, keeping the
    /// relative scroll position
    pub fn resize(&mut self, width: f32, height: f32, metrics: &dyn TextMetrics) {
        let relative = if self.content_height > 0.0 {
            self.scroll_y / self.content_height
        } else {
            0.0
        };

        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.layout_valid = false;
        self.layout(metrics);
        self.set_scroll(relative * self.content_height);
    }

    /// Compute block bounds for the current width
    fn layout(&mut self, metrics: &dyn TextMetrics) {
        if self.layout_valid {
            return;
        }

        let margin = self.config.margin;
        let inner_width = self.width - 2.0 * margin;
        let mut y = margin;
        self.bounds.clear();

        for block in self.document.blocks_mut() {
            let wide = block.can_extend_beyond_margin();
            let block_width = if wide { self.width } else { inner_width };
            let h = block.height_for_width(block_width, metrics) + self.config.block_spacing;
            self.bounds.push(if wide {
                Rect::new(0.0, y, self.width, h)
            } else {
                Rect::new(margin, y, inner_width, h)
            });
            y += h;
        }

        self.content_height = y + margin;
        self.layout_valid = true;
        // new content may be shorter than the old scroll position
        self.set_scroll(self.scroll_y);
        self.rebuild_links();
        tracing::debug!(
            width = self.width,
            blocks = self.bounds.len(),
            content_height = self.content_height,
            "laid out document"
        );
    }

    fn rebuild_links(&mut self) {
        self.links.clear();
        for (block, bounds) in self.document.blocks().iter().zip(&self.bounds) {
            self.links
                .extend_translated(&block.link_regions(bounds.w), bounds.x, bounds.y);
        }
    }

    /// Block rectangles in document coordinates, valid after `resize`
    pub fn block_bounds(&self) -> &[Rect] {
        &self.bounds
    }

    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    pub fn links(&self) -> &LinkRegistry {
        &self.links
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// Scroll vertically, clamped to the content
    pub fn set_scroll(&mut self, y: f32) {
        let max = (self.content_height - self.height).max(0.0);
        self.scroll_y = y.clamp(0.0, max);
    }

    /// Scroll the table at `index` horizontally. Other blocks ignore this.
    pub fn scroll_table(&mut self, index: usize, dx: f32) {
        if let Some(Block::Table(table)) = self.document.blocks_mut().get_mut(index) {
            table.scroll_by(dx);
            self.rebuild_links();
        }
    }

    pub fn draw(&mut self, ctx: &mut dyn DrawContext) {
        self.layout(&*ctx);

        let viewport = Rect::new(0.0, 0.0, self.width, self.height);
        ctx.set_color(self.config.background_colour(&self.palette));
        ctx.draw_rect_filled(viewport);
        ctx.push_clip(viewport);

        let top = self.scroll_y;
        let bottom = self.scroll_y + self.height;
        for (block, bounds) in self.document.blocks_mut().iter_mut().zip(&self.bounds) {
            if bounds.bottom() < top || bounds.y > bottom {
                continue;
            }
            block.paint(ctx, bounds.translated(0.0, -self.scroll_y));
        }

        ctx.pop_clip();
    }

    fn link_at(&self, x: f32, y: f32) -> Option<&str> {
        self.links.hit(x, y + self.scroll_y)
    }

    /// Hover query in viewport coordinates
    pub fn mouse_move(&mut self, x: f32, y: f32) -> CursorKind {
        self.cursor = if self.link_at(x, y).is_some() {
            CursorKind::Pointer
        } else {
            CursorKind::Default
        };
        self.cursor
    }

    pub fn cursor(&self) -> CursorKind {
        self.cursor
    }

    pub fn mouse_down(&mut self, x: f32, y: f32) {
        self.press = Some((x, y));
    }

    /// Release; opens the link under the pointer unless the press turned
    /// into a drag. Returns the opened target.
    pub fn mouse_up(&mut self, x: f32, y: f32) -> Option<String> {
        let (px, py) = self.press.take()?;
        if (x - px).hypot(y - py) >= CLICK_SLOP {
            return None;
        }
        let target = self.link_at(x, y)?.to_string();
        tracing::debug!(target, "opening link");
        self.opener.open_external(&target);
        Some(target)
    }
}

impl Default for MarkupDisplay {
    fn default() -> Self {
        MarkupDisplay::new(DisplayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::SvgDrawContext;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn display(markup: &str, width: f32) -> MarkupDisplay {
        let mut display = MarkupDisplay::default();
        display.set_markup_string(markup);
        display.resize(width, 200.0, &SvgDrawContext::new(1, 1));
        display
    }

    #[test]
    fn test_block_placement() {
        let display = display("hello\n| a |", 300.0);
        let bounds = display.block_bounds();
        // text: 18px line + 5 spacing, inset by the margin
        assert_eq!(bounds[0], Rect::new(20.0, 20.0, 260.0, 23.0));
        // table: full width
        assert_eq!(bounds[1].x, 0.0);
        assert_eq!(bounds[1].w, 300.0);
        assert_eq!(display.content_height(), bounds[1].bottom() + 20.0);
    }

    #[test]
    fn test_resize_is_idempotent() {
        let mut display = display("some text that wraps at narrow widths\n- item", 120.0);
        let first = display.block_bounds().to_vec();
        display.resize(120.0, 200.0, &SvgDrawContext::new(1, 1));
        assert_eq!(display.block_bounds(), first.as_slice());
    }

    #[test]
    fn test_scroll_is_clamped_and_relative() {
        let markup = (0..40).map(|i| format!("- item {i}")).collect::<Vec<_>>().join("\n");
        let mut display = display(&markup, 300.0);
        display.set_scroll(-10.0);
        assert_eq!(display.scroll_y(), 0.0);
        display.set_scroll(1.0e6);
        assert_eq!(display.scroll_y(), display.content_height() - 200.0);

        display.set_scroll(display.content_height() / 4.0);
        let before = display.scroll_y() / display.content_height();
        display.resize(300.0, 200.0, &SvgDrawContext::new(1, 1));
        assert_eq!(display.scroll_y() / display.content_height(), before);
    }

    #[test]
    fn test_click_opens_link_and_drag_does_not() {
        let opened = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&opened);

        let mut display = display("[[http://x.test|Click]]", 300.0);
        display.set_link_opener(move |url: &str| sink.borrow_mut().push(url.to_string()));

        let rect = display.links().regions()[0].rect;
        let (x, y) = (rect.x + 1.0, rect.y + 1.0);
        assert_eq!(display.mouse_move(x, y), CursorKind::Pointer);
        assert_eq!(display.mouse_move(1.0, 1.0), CursorKind::Default);

        display.mouse_down(x, y);
        assert_eq!(display.mouse_up(x, y).as_deref(), Some("http://x.test"));

        display.mouse_down(x + 50.0, y);
        assert_eq!(display.mouse_up(x, y), None);

        display.mouse_down(1.0, 1.0);
        assert_eq!(display.mouse_up(1.0, 1.0), None);

        assert_eq!(*opened.borrow(), vec!["http://x.test".to_string()]);
    }

    #[test]
    fn test_markdown_and_dokuwiki_entry_points() {
        let mut display = MarkupDisplay::default();
        display.set_markdown_string("* item");
        assert_eq!(display.markup(), "- item");
        display.set_dokuwiki_string("====== Title ======");
        assert_eq!(display.markup(), "# Title");
        display.set_asciidoc_string("NOTE: heads up");
        assert_eq!(display.markup(), "INFO: heads up");
    }

    #[test]
    fn test_draw_paints_background_and_blocks() {
        let mut display = MarkupDisplay::default();
        display.set_markup_string("INFO: careful");
        let mut ctx = SvgDrawContext::new(300, 100);
        display.resize(300.0, 100.0, &ctx);
        display.draw(&mut ctx);
        let svg = ctx.finish();
        assert!(svg.contains(r##"width="300" height="100" fill="#ffffff""##));
        assert!(svg.contains(">careful</text>"));
    }

    #[test]
    fn test_replacing_content_clamps_scroll() {
        let markup = (0..60).map(|i| format!("- item {i}")).collect::<Vec<_>>().join("\n");
        let mut display = display(&markup, 300.0);
        display.set_scroll(1.0e6);
        assert!(display.scroll_y() > 0.0);

        display.set_markup_string("short");
        let mut ctx = SvgDrawContext::new(300, 200);
        display.draw(&mut ctx);
        assert_eq!(display.scroll_y(), 0.0);
        assert!(ctx.finish().contains(">short</text>"));
    }

    #[test]
    fn test_empty_list_item_reserves_a_line() {
        let display = display("1. \nnext", 300.0);
        let bounds = display.block_bounds();
        // 18px label line + 5 spacing
        assert_eq!(bounds[0].h, 23.0);
        assert_eq!(bounds[1].y, bounds[0].bottom());
    }

    #[test]
    fn test_table_scroll_moves_links() {
        let mut display = display("| [[http://x.test|a]] | bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb |", 200.0);
        let before = display.links().regions()[0].rect.x;
        display.scroll_table(0, 30.0);
        assert_eq!(display.links().regions()[0].rect.x, before - 30.0);
    }
}
