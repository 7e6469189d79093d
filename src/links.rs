// Link registry and hit testing
// Link spans are resolved against a text layout into one rectangle per
// visual line; the registry answers point queries in document space.

use crate::draw_context::{Rect, TextMetrics};
use crate::styled_text::StyledText;
use crate::text_layout::TextLayout;

#[derive(Debug, Clone, PartialEq)]
pub struct LinkRegion {
    pub target: String,
    pub rect: Rect,
}

/// Resolve the link spans of `text` against its `layout`.
///
/// Walks the glyph runs in order; a link covering glyphs on several lines
/// yields one rectangle per line. Rectangles are trimmed vertically to the
/// band between cap height and descent around each line's baseline.
pub fn link_regions(text: &StyledText, layout: &TextLayout, metrics: &dyn TextMetrics) -> Vec<LinkRegion> {
    let mut regions = Vec::new();

    for link in &text.links {
        for line in &layout.lines {
            let mut line_rect: Option<Rect> = None;

            for run in &line.glyph_runs {
                let first = run.first_glyph;
                let last = first + run.glyph_count();
                let start = link.start.max(first);
                let end = link.end.min(last);
                if start >= end {
                    continue;
                }

                let x0 = run.glyph_x(start - first);
                let x1 = run.glyph_x(end - first);
                let top = line.baseline - metrics.cap_height(&run.font);
                let bottom = line.baseline + metrics.descent(&run.font);
                let rect = Rect::new(x0, top, x1 - x0, bottom - top);
                line_rect = Some(match line_rect {
                    Some(r) => r.union(&rect),
                    None => rect,
                });
            }

            if let Some(rect) = line_rect.filter(|r| !r.is_empty()) {
                regions.push(LinkRegion {
                    target: link.target.clone(),
                    rect,
                });
            }
        }
    }

    regions
}

/// All link rectangles of a laid out document, in document coordinates
#[derive(Debug, Clone, Default)]
pub struct LinkRegistry {
    regions: Vec<LinkRegion>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn extend_translated(&mut self, regions: &[LinkRegion], dx: f32, dy: f32) {
        self.regions.extend(regions.iter().map(|r| LinkRegion {
            target: r.target.clone(),
            rect: r.rect.translated(dx, dy),
        }));
    }

    pub fn regions(&self) -> &[LinkRegion] {
        &self.regions
    }

    /// First link whose rectangle contains the point
    pub fn hit(&self, x: f32, y: f32) -> Option<&str> {
        self.regions
            .iter()
            .find(|r| r.rect.contains(x, y))
            .map(|r| r.target.as_str())
    }
}

/// Link activation capability
pub trait LinkOpener {
    fn open_external(&mut self, url: &str);
}

/// Opener that only logs the request
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLinkOpener;

impl LinkOpener for NoopLinkOpener {
    fn open_external(&mut self, url: &str) {
        tracing::debug!(url, "link activated, no opener installed");
    }
}

impl<F> LinkOpener for F
where
    F: FnMut(&str),
{
    fn open_external(&mut self, url: &str) {
        self(url)
    }
}
