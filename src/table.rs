// Table layout engine
// Tables never wrap: every cell is measured unconstrained, columns take the
// widest cell and rows the tallest. Tables scroll horizontally on their own.

use crate::draw_context::{DrawContext, Rect, TextMetrics};
use crate::inline::{InlineFormatter, consume_bracket_links};
use crate::links::{LinkRegion, link_regions};
use crate::styled_text::StyledText;
use crate::text_layout::TextLayout;

const DELIMITERS: [char; 2] = ['^', '|'];

pub fn is_table_line(line: &str) -> bool {
    line.starts_with(DELIMITERS)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub text: StyledText,
    pub is_header: bool,
}

/// Row-major cells; rows may be ragged
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableModel {
    pub rows: Vec<Vec<TableCell>>,
}

/// Split one table line into `(is_header, raw cell text)` pairs.
///
/// The delimiter in front of a cell decides whether it is a header. Text
/// after the last delimiter does not form a cell.
pub fn split_cells(line: &str) -> Vec<(bool, &str)> {
    let mut cells = Vec::new();
    let mut rest = line;

    while rest.contains(DELIMITERS) {
        let Some(first) = rest.chars().next() else {
            break;
        };
        let is_header = first == '^';
        rest = &rest[first.len_utf8()..];
        match rest.find(DELIMITERS) {
            Some(next) => {
                cells.push((is_header, rest[..next].trim()));
                rest = &rest[next..];
            }
            None => break,
        }
    }

    cells
}

impl TableModel {
    /// Build the model from consecutive table lines. Header cells are
    /// formatted with a bold base font.
    pub fn parse<S: AsRef<str>>(lines: &[S], formatter: &InlineFormatter) -> Self {
        let header_formatter = InlineFormatter::new(formatter.palette(), formatter.font().bold());

        let rows = lines
            .iter()
            .map(|line| {
                let line = consume_bracket_links(line.as_ref());
                split_cells(&line)
                    .into_iter()
                    .map(|(is_header, raw)| {
                        let f = if is_header { &header_formatter } else { formatter };
                        TableCell {
                            text: f.format_text(raw),
                            is_header,
                        }
                    })
                    .collect()
            })
            .collect();

        TableModel { rows }
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }
}

/// Cell spacing and colours
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStyle {
    pub cell_margin: f32,
    pub gap: f32,
    /// Horizontal offset of the first column inside the block
    pub left_margin: f32,
    pub background: u32,
    pub header_background: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellLayout {
    pub layout: TextLayout,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableLayout {
    pub column_widths: Vec<f32>,
    pub row_heights: Vec<f32>,
    pub cells: Vec<Vec<CellLayout>>,
    pub width: f32,
    pub height: f32,
}

impl TableLayout {
    pub fn measure(model: &TableModel, style: &TableStyle, metrics: &dyn TextMetrics) -> Self {
        let cells: Vec<Vec<CellLayout>> = model
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        let layout = TextLayout::new(&cell.text, f32::INFINITY, metrics);
                        CellLayout {
                            width: layout.width(),
                            height: layout.height(),
                            layout,
                        }
                    })
                    .collect()
            })
            .collect();

        let mut column_widths: Vec<f32> = Vec::new();
        for row in &cells {
            for (j, cell) in row.iter().enumerate() {
                match column_widths.get_mut(j) {
                    Some(w) => *w = w.max(cell.width),
                    None => column_widths.push(cell.width),
                }
            }
        }

        let row_heights: Vec<f32> = cells
            .iter()
            .map(|row| row.iter().map(|c| c.height).fold(0.0, f32::max))
            .collect();

        let span = |sizes: &[f32]| -> f32 {
            if sizes.is_empty() {
                return 0.0;
            }
            let total: f32 = sizes.iter().map(|s| s + 2.0 * style.cell_margin + style.gap).sum();
            total - style.gap
        };

        let (width, height) = if model.is_empty() {
            (0.0, 0.0)
        } else {
            (span(&column_widths), span(&row_heights))
        };

        TableLayout {
            column_widths,
            row_heights,
            cells,
            width,
            height,
        }
    }

    /// Top left corner of every cell's text, relative to the table origin
    fn cell_origins(&self, style: &TableStyle) -> Vec<Vec<(f32, f32)>> {
        let mut origins = Vec::with_capacity(self.cells.len());
        let mut y = 0.0;
        for (i, row) in self.cells.iter().enumerate() {
            let mut x = style.left_margin;
            let mut row_origins = Vec::with_capacity(row.len());
            for j in 0..row.len() {
                row_origins.push((x, y));
                x += self.column_widths[j] + 2.0 * style.cell_margin + style.gap;
            }
            origins.push(row_origins);
            y += self.row_heights[i] + 2.0 * style.cell_margin + style.gap;
        }
        origins
    }

    /// Total horizontal extent including the left margin and trailing gap
    pub fn extent(&self, style: &TableStyle) -> f32 {
        self.width + style.left_margin + style.gap
    }

    /// Largest useful horizontal scroll offset for a viewport of `viewport_width`
    pub fn max_scroll(&self, style: &TableStyle, viewport_width: f32) -> f32 {
        (self.extent(style) - viewport_width).max(0.0)
    }

    pub fn paint(&self, model: &TableModel, style: &TableStyle, ctx: &mut dyn DrawContext, origin_x: f32, origin_y: f32) {
        for (i, row) in self.cell_origins(style).into_iter().enumerate() {
            for (j, (x, y)) in row.into_iter().enumerate() {
                let cell = &model.rows[i][j];
                ctx.set_color(if cell.is_header {
                    style.header_background
                } else {
                    style.background
                });
                ctx.draw_rect_filled(Rect::new(
                    origin_x + x,
                    origin_y + y,
                    self.column_widths[j] + 2.0 * style.cell_margin,
                    self.row_heights[i] + 2.0 * style.cell_margin,
                ));
                self.cells[i][j].layout.draw(
                    ctx,
                    origin_x + x + style.cell_margin,
                    origin_y + y + style.cell_margin,
                );
            }
        }
    }

    /// Link rectangles of all cells, relative to the table origin
    pub fn link_regions(&self, model: &TableModel, style: &TableStyle, metrics: &dyn TextMetrics) -> Vec<LinkRegion> {
        let mut regions = Vec::new();
        for (i, row) in self.cell_origins(style).into_iter().enumerate() {
            for (j, (x, y)) in row.into_iter().enumerate() {
                let text = &model.rows[i][j].text;
                if text.links.is_empty() {
                    continue;
                }
                let dx = x + style.cell_margin;
                let dy = y + style.cell_margin;
                regions.extend(
                    link_regions(text, &self.cells[i][j].layout, metrics)
                        .into_iter()
                        .map(|r| LinkRegion {
                            target: r.target,
                            rect: r.rect.translated(dx, dy),
                        }),
                );
            }
        }
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw_context::Font;
    use crate::palette::Palette;
    use crate::svg::SvgDrawContext;

    fn style() -> TableStyle {
        TableStyle {
            cell_margin: 10.0,
            gap: 2.0,
            left_margin: 20.0,
            background: 0xAAAAAAFF,
            header_background: 0x55FFFFFF,
        }
    }

    fn parse(lines: &[&str]) -> TableModel {
        let palette = Palette::default();
        TableModel::parse(lines, &InlineFormatter::new(&palette, Font::new(10.0)))
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(split_cells("^ A ^ B ^"), vec![(true, "A"), (true, "B")]);
        assert_eq!(split_cells("| 1 ^ 2 |"), vec![(false, "1"), (true, "2")]);
        assert_eq!(split_cells("| open"), Vec::<(bool, &str)>::new());
        assert_eq!(split_cells("|a|b"), vec![(false, "a")]);
    }

    #[test]
    fn test_header_flags_and_bold_font() {
        let model = parse(&["^ A ^ B ^", "| 1 | 22 |"]);
        assert!(model.rows[0].iter().all(|c| c.is_header));
        assert!(model.rows[1].iter().all(|c| !c.is_header));
        assert!(model.rows[0][0].text.runs[0].font.variant.is_bold());
        assert!(!model.rows[1][0].text.runs[0].font.variant.is_bold());
    }

    #[test]
    fn test_column_widths_take_widest_cell() {
        let metrics = SvgDrawContext::new(100, 100);
        let model = parse(&["^ A ^ B ^", "| 1 | 22 |"]);
        let layout = TableLayout::measure(&model, &style(), &metrics);
        assert_eq!(layout.column_widths, vec![6.0, 12.0]);
        assert_eq!(layout.row_heights, vec![12.0, 12.0]);
        // (6 + 20 + 2) + (12 + 20 + 2) - 2
        assert_eq!(layout.width, 60.0);
        assert_eq!(layout.height, 66.0);
    }

    #[test]
    fn test_ragged_rows() {
        let metrics = SvgDrawContext::new(100, 100);
        let model = parse(&["| a | b | ccc |", "| dddd |"]);
        let layout = TableLayout::measure(&model, &style(), &metrics);
        assert_eq!(layout.column_widths, vec![24.0, 6.0, 18.0]);
        assert_eq!(model.column_count(), 3);
    }

    #[test]
    fn test_empty_table_measures_zero() {
        let metrics = SvgDrawContext::new(100, 100);
        let model = parse(&["|", "^"]);
        assert!(model.is_empty());
        let layout = TableLayout::measure(&model, &style(), &metrics);
        assert_eq!((layout.width, layout.height), (0.0, 0.0));
    }

    #[test]
    fn test_bracket_link_does_not_split_row() {
        let metrics = SvgDrawContext::new(100, 100);
        let model = parse(&["| see [[http://x.test|docs]] | x |"]);
        assert_eq!(model.rows[0].len(), 2);
        assert_eq!(model.rows[0][0].text.plain_text(), "see docs");

        let layout = TableLayout::measure(&model, &style(), &metrics);
        let regions = layout.link_regions(&model, &style(), &metrics);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].target, "http://x.test");
        // left margin 20 + cell margin 10 + "see " 24
        assert_eq!(regions[0].rect.x, 54.0);
    }

    #[test]
    fn test_max_scroll() {
        let metrics = SvgDrawContext::new(100, 100);
        let model = parse(&["^ A ^ B ^", "| 1 | 22 |"]);
        let layout = TableLayout::measure(&model, &style(), &metrics);
        assert_eq!(layout.extent(&style()), 82.0);
        assert_eq!(layout.max_scroll(&style(), 50.0), 32.0);
        assert_eq!(layout.max_scroll(&style(), 500.0), 0.0);
    }
}
