// Drawing backend trait - abstracts over the host's drawing primitives

use crate::image::Raster;

/// Axis-aligned rectangle in pixel-equivalent units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Half-open containment: the right and bottom edges are outside
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            w: self.right().max(other.right()) - x,
            h: self.bottom().max(other.bottom()) - y,
        }
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn reduced(&self, dx: f32, dy: f32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            w: (self.w - 2.0 * dx).max(0.0),
            h: (self.h - 2.0 * dy).max(0.0),
        }
    }
}

/// Font variant: cross product of {regular, bold} x {regular, italic}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontVariant {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontVariant {
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => FontVariant::Regular,
            (true, false) => FontVariant::Bold,
            (false, true) => FontVariant::Italic,
            (true, true) => FontVariant::BoldItalic,
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, FontVariant::Bold | FontVariant::BoldItalic)
    }

    pub fn is_italic(&self) -> bool {
        matches!(self, FontVariant::Italic | FontVariant::BoldItalic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    pub size: f32,
    pub variant: FontVariant,
}

impl Font {
    pub fn new(size: f32) -> Self {
        Font {
            size,
            variant: FontVariant::Regular,
        }
    }

    pub fn with_variant(self, variant: FontVariant) -> Self {
        Font { variant, ..self }
    }

    pub fn with_size(self, size: f32) -> Self {
        Font { size, ..self }
    }

    pub fn bold(self) -> Self {
        self.with_variant(FontVariant::from_flags(true, self.variant.is_italic()))
    }
}

/// Pointer shape requested while hovering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorKind {
    #[default]
    Default,
    Pointer,
}

/// Text measurement, all that layout needs from a backend
pub trait TextMetrics {
    fn text_width(&self, text: &str, font: &Font) -> f32;
    fn ascent(&self, font: &Font) -> f32;
    fn descent(&self, font: &Font) -> f32;
    fn cap_height(&self, font: &Font) -> f32;
    fn line_height(&self, font: &Font) -> f32;
}

pub trait DrawContext: TextMetrics {
    fn set_color(&mut self, color: u32);
    fn set_font(&mut self, font: &Font);
    /// Draw text with its baseline at `y`
    fn draw_text(&mut self, text: &str, x: f32, y: f32);
    fn draw_rect_filled(&mut self, rect: Rect);
    fn draw_rect_outline(&mut self, rect: Rect);
    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32);
    fn draw_image(&mut self, image: &Raster, rect: Rect);
    fn push_clip(&mut self, rect: Rect);
    fn pop_clip(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_union_and_contains() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 10.0, 10.0);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0.0, 0.0, 30.0, 15.0));
        assert!(u.contains(29.0, 14.0));
        assert!(!u.contains(30.0, 14.0));
    }

    #[test]
    fn test_font_variant_flags() {
        assert_eq!(FontVariant::from_flags(true, true), FontVariant::BoldItalic);
        assert!(Font::new(15.0).bold().variant.is_bold());
        let italic = Font::new(15.0).with_variant(FontVariant::Italic);
        assert_eq!(italic.bold().variant, FontVariant::BoldItalic);
    }
}
