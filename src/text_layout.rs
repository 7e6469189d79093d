// Text layout
// Greedy word wrapping of styled runs into positioned glyph runs.

use crate::draw_context::{DrawContext, Font, TextMetrics};
use crate::styled_text::StyledText;
use unicode_segmentation::UnicodeSegmentation;

/// A piece of one styled run placed on a line
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    /// Index of the source run in `StyledText::runs`
    pub run_index: usize,
    pub text: String,
    pub font: Font,
    pub colour: u32,
    /// Left edge relative to the layout origin
    pub x: f32,
    /// Glyph offset of the first glyph in the flattened text
    pub first_glyph: usize,
    /// Advance width of every glyph in `text`
    pub advances: Vec<f32>,
}

impl GlyphRun {
    pub fn glyph_count(&self) -> usize {
        self.advances.len()
    }

    pub fn width(&self) -> f32 {
        self.advances.iter().sum()
    }

    /// x position of the left edge of glyph `i` (0..=glyph_count)
    pub fn glyph_x(&self, i: usize) -> f32 {
        self.x + self.advances.iter().take(i).sum::<f32>()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub top: f32,
    pub baseline: f32,
    pub height: f32,
    /// Width up to the last non-whitespace glyph
    pub width: f32,
    pub glyph_runs: Vec<GlyphRun>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLayout {
    pub lines: Vec<LayoutLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Space,
    Break,
}

#[derive(Debug, Clone)]
struct Piece {
    run_index: usize,
    text: String,
    first_glyph: usize,
    advances: Vec<f32>,
}

impl Piece {
    fn width(&self) -> f32 {
        self.advances.iter().sum()
    }
}

#[derive(Debug)]
struct Token {
    kind: TokenKind,
    pieces: Vec<Piece>,
}

impl Token {
    fn width(&self) -> f32 {
        self.pieces.iter().map(Piece::width).sum()
    }
}

fn classify(grapheme: &str) -> TokenKind {
    if grapheme == "\n" || grapheme == "\r\n" {
        TokenKind::Break
    } else if grapheme.chars().all(char::is_whitespace) {
        TokenKind::Space
    } else {
        TokenKind::Word
    }
}

/// Split styled text into words, whitespace and hard breaks. Words may
/// span several runs ("bo*ld*" is one word made of two pieces).
fn tokenize(text: &StyledText, metrics: &dyn TextMetrics) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut glyph = 0;

    for (run_index, run) in text.runs.iter().enumerate() {
        for g in run.text.graphemes(true) {
            let kind = classify(g);
            let advance = if kind == TokenKind::Break {
                0.0
            } else {
                metrics.text_width(g, &run.font)
            };

            let extend = kind != TokenKind::Break
                && tokens.last().is_some_and(|t| t.kind == kind);
            if !extend {
                tokens.push(Token {
                    kind,
                    pieces: Vec::new(),
                });
            }
            let Some(token) = tokens.last_mut() else {
                continue;
            };

            match token.pieces.last_mut() {
                Some(piece) if piece.run_index == run_index => {
                    piece.text.push_str(g);
                    piece.advances.push(advance);
                }
                _ => token.pieces.push(Piece {
                    run_index,
                    text: g.to_string(),
                    first_glyph: glyph,
                    advances: vec![advance],
                }),
            }
            glyph += 1;
        }
    }

    tokens
}

/// Line under construction
#[derive(Default)]
struct LineBuilder {
    placed: Vec<(Piece, f32)>,
    x: f32,
    content_right: f32,
    has_word: bool,
    /// Font of the hard break that ended this line, for empty lines
    break_font: Option<Font>,
}

impl LineBuilder {
    fn place(&mut self, token: Token) {
        let is_word = token.kind == TokenKind::Word;
        for piece in token.pieces {
            let w = piece.width();
            self.placed.push((piece, self.x));
            self.x += w;
        }
        if is_word {
            self.has_word = true;
            self.content_right = self.x;
        }
    }
}

impl TextLayout {
    /// Lay out `text` wrapped at `max_width`. Pass `f32::INFINITY` for the
    /// unconstrained (intrinsic) layout.
    pub fn new(text: &StyledText, max_width: f32, metrics: &dyn TextMetrics) -> Self {
        let mut finished: Vec<LineBuilder> = Vec::new();
        let mut line = LineBuilder::default();
        let mut wrapped = false;

        for token in tokenize(text, metrics) {
            match token.kind {
                TokenKind::Break => {
                    line.break_font = token
                        .pieces
                        .first()
                        .map(|p| text.runs[p.run_index].font);
                    finished.push(std::mem::take(&mut line));
                    wrapped = false;
                }
                TokenKind::Space => {
                    // whitespace at a wrap point is not drawn
                    if wrapped && line.placed.is_empty() {
                        continue;
                    }
                    line.place(token);
                }
                TokenKind::Word => {
                    if line.has_word && line.x + token.width() > max_width {
                        finished.push(std::mem::take(&mut line));
                        wrapped = true;
                    }
                    line.place(token);
                }
            }
        }
        if !line.placed.is_empty() || !finished.is_empty() {
            finished.push(line);
        }

        let fallback = text.runs.first().map(|r| r.font);
        let mut lines = Vec::with_capacity(finished.len());
        let mut top = 0.0;
        for builder in finished {
            let laid = build_line(builder, text, top, fallback, metrics);
            top += laid.height;
            lines.push(laid);
        }

        TextLayout { lines }
    }

    pub fn height(&self) -> f32 {
        self.lines.iter().map(|l| l.height).sum()
    }

    /// Width of the widest line
    pub fn width(&self) -> f32 {
        self.lines.iter().map(|l| l.width).fold(0.0, f32::max)
    }

    pub fn glyph_runs(&self) -> impl Iterator<Item = (&LayoutLine, &GlyphRun)> {
        self.lines
            .iter()
            .flat_map(|line| line.glyph_runs.iter().map(move |run| (line, run)))
    }

    pub fn draw(&self, ctx: &mut dyn DrawContext, origin_x: f32, origin_y: f32) {
        for (line, run) in self.glyph_runs() {
            if run.text.trim().is_empty() {
                continue;
            }
            ctx.set_font(&run.font);
            ctx.set_color(run.colour);
            ctx.draw_text(&run.text, origin_x + run.x, origin_y + line.baseline);
        }
    }
}

fn build_line(
    builder: LineBuilder,
    text: &StyledText,
    top: f32,
    fallback: Option<Font>,
    metrics: &dyn TextMetrics,
) -> LayoutLine {
    let mut glyph_runs: Vec<GlyphRun> = Vec::new();
    for (piece, x) in builder.placed {
        match glyph_runs.last_mut() {
            Some(last)
                if last.run_index == piece.run_index
                    && last.first_glyph + last.glyph_count() == piece.first_glyph =>
            {
                last.text.push_str(&piece.text);
                last.advances.extend(piece.advances);
            }
            _ => {
                let run = &text.runs[piece.run_index];
                glyph_runs.push(GlyphRun {
                    run_index: piece.run_index,
                    text: piece.text,
                    font: run.font,
                    colour: run.colour,
                    x,
                    first_glyph: piece.first_glyph,
                    advances: piece.advances,
                });
            }
        }
    }

    let mut fonts: Vec<Font> = glyph_runs.iter().map(|r| r.font).collect();
    if let Some(font) = builder.break_font.or(fallback) {
        if fonts.is_empty() {
            fonts.push(font);
        }
    }

    let ascent = fonts.iter().map(|f| metrics.ascent(f)).fold(0.0, f32::max);
    let height = fonts.iter().map(|f| metrics.line_height(f)).fold(0.0, f32::max);

    LayoutLine {
        top,
        baseline: top + ascent,
        height,
        width: builder.content_right,
        glyph_runs,
    }
}

/// Natural size of the text without any width constraint
pub fn intrinsic_size(text: &StyledText, metrics: &dyn TextMetrics) -> (f32, f32) {
    let layout = TextLayout::new(text, f32::INFINITY, metrics);
    (layout.width(), layout.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::InlineFormatter;
    use crate::palette::Palette;
    use crate::svg::SvgDrawContext;

    fn styled(text: &str) -> StyledText {
        let palette = Palette::default();
        InlineFormatter::new(&palette, Font::new(10.0)).format_text(text)
    }

    // SvgDrawContext: 6px per glyph at size 10, 12px line height
    #[test]
    fn test_single_line() {
        let metrics = SvgDrawContext::new(100, 100);
        let layout = TextLayout::new(&styled("hello world"), 1000.0, &metrics);
        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.width(), 66.0);
        assert_eq!(layout.height(), 12.0);
    }

    #[test]
    fn test_wraps_at_word_boundary() {
        let metrics = SvgDrawContext::new(100, 100);
        // "hello " is 36px, "world" 30px
        let layout = TextLayout::new(&styled("hello world"), 50.0, &metrics);
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[0].width, 30.0);
        assert_eq!(layout.lines[1].glyph_runs[0].text, "world");
        assert_eq!(layout.lines[1].glyph_runs[0].first_glyph, 6);
        assert_eq!(layout.lines[1].glyph_runs[0].x, 0.0);
    }

    #[test]
    fn test_long_word_overflows_instead_of_looping() {
        let metrics = SvgDrawContext::new(100, 100);
        let layout = TextLayout::new(&styled("abcdefghij"), 12.0, &metrics);
        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.width(), 60.0);
    }

    #[test]
    fn test_word_spanning_runs_is_not_split() {
        let metrics = SvgDrawContext::new(100, 100);
        let layout = TextLayout::new(&styled("aa bo*ld*"), 30.0, &metrics);
        assert_eq!(layout.lines.len(), 2);
        let second: Vec<&str> = layout.lines[1]
            .glyph_runs
            .iter()
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(second, vec!["bo", "ld"]);
        assert_eq!(layout.lines[1].glyph_runs[1].x, 12.0);
    }

    #[test]
    fn test_hard_breaks_and_trailing_blank_line() {
        let metrics = SvgDrawContext::new(100, 100);
        let layout = TextLayout::new(&styled("one\ntwo\n"), 1000.0, &metrics);
        // "one \n" "two" - `lines()` drops the trailing newline
        assert_eq!(layout.lines.len(), 2);

        let paragraph = InlineFormatter::new(&Palette::default(), Font::new(10.0))
            .format_lines(&["para", ""]);
        let layout = TextLayout::new(&paragraph, 1000.0, &metrics);
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.height(), 24.0);
    }

    #[test]
    fn test_empty_text_has_no_height() {
        let metrics = SvgDrawContext::new(100, 100);
        let layout = TextLayout::new(&StyledText::new(), 100.0, &metrics);
        assert!(layout.lines.is_empty());
        assert_eq!(intrinsic_size(&StyledText::new(), &metrics), (0.0, 0.0));
    }

    #[test]
    fn test_same_width_is_idempotent() {
        let metrics = SvgDrawContext::new(100, 100);
        let text = styled("some *styled* text that wraps around");
        let a = TextLayout::new(&text, 80.0, &metrics);
        let b = TextLayout::new(&text, 80.0, &metrics);
        assert_eq!(a, b);
    }
}
