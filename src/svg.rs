// SVG-based DrawContext implementation
// Generates SVG output from a rendered document. Metrics are approximate
// but deterministic, which makes the output usable in tests.

use crate::draw_context::{DrawContext, Font, Rect, TextMetrics};
use crate::image::Raster;
use std::fmt::Write;
use unicode_segmentation::UnicodeSegmentation;

/// SVG-based drawing context that generates SVG markup
pub struct SvgDrawContext {
    svg_content: String,
    current_color: u32,
    current_font: Font,
    /// Ids of the active clip paths, innermost last
    clip_stack: Vec<usize>,
    next_clip_id: usize,
}

impl SvgDrawContext {
    /// Create a new SVG drawing context
    pub fn new(width: i32, height: i32) -> Self {
        let mut svg_content = String::new();
        writeln!(
            svg_content,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            width, height, width, height
        )
        .unwrap();

        SvgDrawContext {
            svg_content,
            current_color: 0x000000FF,
            current_font: Font::new(15.0),
            clip_stack: Vec::new(),
            next_clip_id: 0,
        }
    }

    /// Get the generated SVG content
    pub fn finish(mut self) -> String {
        self.svg_content.push_str("</svg>\n");
        self.svg_content
    }

    /// Convert RGBA color to SVG color string
    fn color_to_svg(color: u32) -> String {
        let r = (color >> 24) & 0xFF;
        let g = (color >> 16) & 0xFF;
        let b = (color >> 8) & 0xFF;
        let a = color & 0xFF;

        if a == 0xFF {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("rgba({}, {}, {}, {:.2})", r, g, b, a as f32 / 255.0)
        }
    }

    fn escape_xml(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }

    fn clip_attr(&self) -> String {
        match self.clip_stack.last() {
            Some(id) => format!(r#" clip-path="url(#clip-{})""#, id),
            None => String::new(),
        }
    }
}

impl TextMetrics for SvgDrawContext {
    // Approximate character width: 0.6 * font size per glyph
    fn text_width(&self, text: &str, font: &Font) -> f32 {
        text.graphemes(true).count() as f32 * font.size * 3.0 / 5.0
    }

    fn ascent(&self, font: &Font) -> f32 {
        font.size * 4.0 / 5.0
    }

    fn descent(&self, font: &Font) -> f32 {
        font.size / 5.0
    }

    fn cap_height(&self, font: &Font) -> f32 {
        font.size * 7.0 / 10.0
    }

    fn line_height(&self, font: &Font) -> f32 {
        font.size * 6.0 / 5.0
    }
}

impl DrawContext for SvgDrawContext {
    fn set_color(&mut self, color: u32) {
        self.current_color = color;
    }

    fn set_font(&mut self, font: &Font) {
        self.current_font = *font;
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32) {
        if text.is_empty() {
            return;
        }
        let weight = if self.current_font.variant.is_bold() { "bold" } else { "normal" };
        let style = if self.current_font.variant.is_italic() { "italic" } else { "normal" };
        writeln!(
            self.svg_content,
            r#"  <text x="{}" y="{}" fill="{}" font-family="Helvetica, Arial, sans-serif" font-size="{}" font-weight="{}" font-style="{}" xml:space="preserve"{}>{}</text>"#,
            x,
            y,
            Self::color_to_svg(self.current_color),
            self.current_font.size,
            weight,
            style,
            self.clip_attr(),
            Self::escape_xml(text)
        )
        .unwrap();
    }

    fn draw_rect_filled(&mut self, rect: Rect) {
        writeln!(
            self.svg_content,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}"{}/>"#,
            rect.x,
            rect.y,
            rect.w,
            rect.h,
            Self::color_to_svg(self.current_color),
            self.clip_attr()
        )
        .unwrap();
    }

    fn draw_rect_outline(&mut self, rect: Rect) {
        writeln!(
            self.svg_content,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-width="1"{}/>"#,
            rect.x,
            rect.y,
            rect.w,
            rect.h,
            Self::color_to_svg(self.current_color),
            self.clip_attr()
        )
        .unwrap();
    }

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        writeln!(
            self.svg_content,
            r#"  <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"{}/>"#,
            x1,
            y1,
            x2,
            y2,
            Self::color_to_svg(self.current_color),
            self.clip_attr()
        )
        .unwrap();
    }

    fn draw_image(&mut self, image: &Raster, rect: Rect) {
        // pixel data is not embedded, only the placement
        writeln!(
            self.svg_content,
            r##"  <rect class="image" data-size="{}x{}" x="{}" y="{}" width="{}" height="{}" fill="#dddddd"{}/>"##,
            image.width,
            image.height,
            rect.x,
            rect.y,
            rect.w,
            rect.h,
            self.clip_attr()
        )
        .unwrap();
    }

    fn push_clip(&mut self, rect: Rect) {
        writeln!(
            self.svg_content,
            r#"  <defs><clipPath id="clip-{}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath></defs>"#,
            self.next_clip_id, rect.x, rect.y, rect.w, rect.h
        )
        .unwrap();
        self.clip_stack.push(self.next_clip_id);
        self.next_clip_id += 1;
    }

    fn pop_clip(&mut self) {
        self.clip_stack.pop();
    }
}
