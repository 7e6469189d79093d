// Inline formatter
// Turns one paragraph of BarelyML into styled runs and link spans.
// The scan state is an explicit value threaded through `scan_line`.

use crate::draw_context::{Font, FontVariant};
use crate::palette::{Palette, parse_hex_colour};
use crate::styled_text::{StyledRun, StyledText};

/// Heading prefixes, longest first, with their size factors
const HEADINGS: [(&str, f32); 5] = [
    ("##### ", 1.1),
    ("#### ", 1.25),
    ("### ", 1.42),
    ("## ", 1.7),
    ("# ", 2.1),
];

/// Separator appended between the physical lines of a paragraph
pub const LINE_SEPARATOR: &str = " \n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenLink {
    pub target: String,
    /// Glyph offset where the link text starts
    pub start: usize,
}

/// Scanner state carried from one marker to the next
#[derive(Debug, Clone, PartialEq)]
pub struct FormatterState {
    pub bold: bool,
    pub italic: bool,
    pub colour: u32,
    pub link: Option<OpenLink>,
    base: Font,
}

impl FormatterState {
    pub fn new(base: Font, colour: u32) -> Self {
        FormatterState {
            bold: false,
            italic: false,
            colour,
            link: None,
            base,
        }
    }

    /// Current font: the base font with the toggled flags applied on top
    pub fn font(&self) -> Font {
        let bold = self.base.variant.is_bold() || self.bold;
        let italic = self.base.variant.is_italic() || self.italic;
        self.base.with_variant(FontVariant::from_flags(bold, italic))
    }

    fn link_target(&self) -> Option<String> {
        self.link.as_ref().map(|l| l.target.clone())
    }
}

/// Split a heading prefix off a line: returns (level, remainder)
pub fn heading_level(line: &str) -> Option<(usize, &str)> {
    HEADINGS
        .iter()
        .find_map(|(prefix, _)| line.strip_prefix(prefix).map(|rest| (prefix.len() - 1, rest)))
}

pub struct InlineFormatter<'a> {
    palette: &'a Palette,
    font: Font,
    default_colour: u32,
}

impl<'a> InlineFormatter<'a> {
    pub fn new(palette: &'a Palette, font: Font) -> Self {
        InlineFormatter {
            palette,
            font,
            default_colour: palette.default_colour(),
        }
    }

    pub fn palette(&self) -> &'a Palette {
        self.palette
    }

    pub fn font(&self) -> Font {
        self.font
    }

    pub fn default_colour(&self) -> u32 {
        self.default_colour
    }

    /// Format a block of text, one physical line per `\n`
    pub fn format_text(&self, text: &str) -> StyledText {
        let lines: Vec<&str> = text.lines().collect();
        self.format_lines(&lines)
    }

    /// Format physical lines joined by `" \n"`. Bold, italic and colour
    /// carry over from one line to the next; heading lines scan with their
    /// own state.
    pub fn format_lines<S: AsRef<str>>(&self, lines: &[S]) -> StyledText {
        let mut out = StyledText::new();
        let mut state = FormatterState::new(self.font, self.default_colour);

        for (i, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if let Some((level, rest)) = heading_level(line) {
                let heading = FormatterState::new(self.heading_font(level), self.default_colour);
                let end = self.scan_line(heading, rest, &mut out);
                close_link(end, &mut out);
            } else {
                state = self.scan_line(state, line, &mut out);
            }

            if i + 1 < lines.len() {
                let mut separator = StyledRun::new(LINE_SEPARATOR, state.font(), self.default_colour);
                separator.link = state.link_target();
                out.push(separator);
            }
        }

        close_link(state, &mut out);
        out
    }

    fn heading_font(&self, level: usize) -> Font {
        let factor = HEADINGS
            .iter()
            .find(|(prefix, _)| prefix.len() - 1 == level)
            .map(|(_, f)| *f)
            .unwrap_or(1.0);
        self.font.with_size(self.font.size * factor).bold()
    }

    /// Scan one physical line, emitting runs into `out`
    pub fn scan_line(&self, mut state: FormatterState, line: &str, out: &mut StyledText) -> FormatterState {
        let mut rest = line;

        while !rest.is_empty() {
            let Some(idx) = rest.find(['*', '_', '<']) else {
                emit(&state, rest, out);
                break;
            };
            emit(&state, &rest[..idx], out);

            match rest.as_bytes()[idx] {
                b'*' => {
                    state.bold = !state.bold;
                    rest = &rest[idx + 1..];
                }
                b'_' => {
                    state.italic = !state.italic;
                    rest = &rest[idx + 1..];
                }
                _ => {
                    let after = &rest[idx + 1..];
                    match after.find('>') {
                        Some(close) => {
                            let tag = &after[..close];
                            if !self.apply_tag(&mut state, tag, out) {
                                // not a tag: the whole <...> is literal text
                                emit(&state, &rest[idx..idx + close + 2], out);
                            }
                            rest = &after[close + 1..];
                        }
                        None => {
                            emit(&state, "<", out);
                            rest = after;
                        }
                    }
                }
            }
        }

        state
    }

    /// Apply a recognized tag to the state. Returns false for anything that
    /// is not one of the known tag forms.
    fn apply_tag(&self, state: &mut FormatterState, tag: &str, out: &mut StyledText) -> bool {
        if let Some(hex) = tag.strip_prefix("c#") {
            if hex.trim().is_empty() {
                state.colour = self.default_colour;
            } else if let Some(colour) = parse_hex_colour(hex) {
                state.colour = colour;
            } else {
                tracing::trace!(tag, "unparsable colour, keeping current colour");
            }
            true
        } else if let Some(name) = tag.strip_prefix("c:") {
            if let Some(colour) = self.palette.resolve(name.trim()) {
                state.colour = colour;
            }
            true
        } else if tag.starts_with("/c") {
            state.colour = self.default_colour;
            true
        } else if let Some(target) = tag.strip_prefix("l:") {
            close_link_in_place(state, out);
            let target = target.trim();
            if !target.is_empty() {
                state.link = Some(OpenLink {
                    target: target.to_string(),
                    start: out.glyph_count(),
                });
            }
            state.colour = self.palette.link_colour();
            true
        } else if tag.starts_with("/l") {
            close_link_in_place(state, out);
            state.colour = self.default_colour;
            true
        } else {
            false
        }
    }
}

fn emit(state: &FormatterState, text: &str, out: &mut StyledText) {
    if text.is_empty() {
        return;
    }
    let mut run = StyledRun::new(text, state.font(), state.colour);
    run.link = state.link_target();
    out.push(run);
}

fn close_link_in_place(state: &mut FormatterState, out: &mut StyledText) {
    if let Some(open) = state.link.take() {
        let end = out.glyph_count();
        out.push_link(open.target, open.start, end);
    }
}

fn close_link(mut state: FormatterState, out: &mut StyledText) {
    close_link_in_place(&mut state, out);
}

/// Rewrite `[[target|label]]` and `[[target]]` into link tags with a bold
/// label, left to right. Unterminated brackets are left alone.
pub fn consume_bracket_links(line: &str) -> String {
    let mut output = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find("[[") {
        let inner_start = open + 2;
        let Some(close) = rest[inner_start..].find("]]") else {
            break;
        };
        let inner = &rest[inner_start..inner_start + close];
        let (target, label) = inner.split_once('|').unwrap_or((inner, inner));

        output.push_str(&rest[..open]);
        output.push_str("<l:");
        output.push_str(target);
        output.push_str(">*");
        output.push_str(label);
        output.push_str("*</l>");
        rest = &rest[inner_start + close + 2..];
    }

    output.push_str(rest);
    output
}

/// True if the line holds a complete `[[...]]` pair
pub fn contains_bracket_link(line: &str) -> bool {
    line.find("[[")
        .is_some_and(|open| line[open + 2..].contains("]]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::BLACK;

    fn format(text: &str) -> StyledText {
        let palette = Palette::default();
        InlineFormatter::new(&palette, Font::new(15.0)).format_text(text)
    }

    fn texts(styled: &StyledText) -> Vec<&str> {
        styled.runs.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_bold_and_italic_runs() {
        let styled = format("*bold* and _ital_");
        assert_eq!(texts(&styled), vec!["bold", " and ", "ital"]);
        assert_eq!(styled.runs[0].font.variant, FontVariant::Bold);
        assert_eq!(styled.runs[1].font.variant, FontVariant::Regular);
        assert_eq!(styled.runs[2].font.variant, FontVariant::Italic);
    }

    #[test]
    fn test_odd_marker_leaves_bold_on() {
        let styled = format("a *b c");
        assert_eq!(texts(&styled), vec!["a ", "b c"]);
        assert_eq!(styled.runs[1].font.variant, FontVariant::Bold);
    }

    #[test]
    fn test_bold_italic_combination() {
        let styled = format("*_both_*");
        assert_eq!(styled.runs.len(), 1);
        assert_eq!(styled.runs[0].font.variant, FontVariant::BoldItalic);
    }

    #[test]
    fn test_named_colour_and_reset() {
        let styled = format("<c:red>hi</c>there");
        assert_eq!(texts(&styled), vec!["hi", "there"]);
        assert_eq!(styled.runs[0].colour, 0xAA0000FF);
        assert_eq!(styled.runs[1].colour, BLACK);
    }

    #[test]
    fn test_closing_tags_match_by_prefix() {
        let styled = format("<c:red>hi</color>there <l:http://x.test>go</l >on");
        assert_eq!(texts(&styled), vec!["hi", "there ", "go", "on"]);
        assert_eq!(styled.runs[1].colour, BLACK);
        assert_eq!((styled.links[0].start, styled.links[0].end), (8, 10));
        assert_eq!(styled.runs[3].link, None);
    }

    #[test]
    fn test_hex_colour() {
        let styled = format("<c#00FF00>green</c>");
        assert_eq!(styled.runs[0].colour, 0x00FF00FF);
    }

    #[test]
    fn test_unknown_colour_name_keeps_colour() {
        let styled = format("<c:red>a<c:nosuch>b");
        assert_eq!(styled.runs[0].colour, 0xAA0000FF);
        assert_eq!(styled.runs[1].colour, 0xAA0000FF);
    }

    #[test]
    fn test_unknown_tag_is_literal() {
        let styled = format("a <b> c");
        assert_eq!(styled.plain_text(), "a <b> c");
    }

    #[test]
    fn test_markers_inside_unknown_tag_stay_literal() {
        let styled = format("x <not *a* tag> y");
        assert_eq!(styled.plain_text(), "x <not *a* tag> y");
        assert!(styled.runs.iter().all(|r| r.font.variant == FontVariant::Regular));
    }

    #[test]
    fn test_unterminated_angle_bracket() {
        let styled = format("1 < 2 and *3*");
        assert_eq!(styled.plain_text(), "1 < 2 and 3");
        assert_eq!(styled.runs.last().unwrap().font.variant, FontVariant::Bold);
    }

    #[test]
    fn test_link_tags() {
        let styled = format("go <l:http://x.test>here</l> now");
        assert_eq!(styled.plain_text(), "go here now");
        assert_eq!(styled.links.len(), 1);
        let link = &styled.links[0];
        assert_eq!(link.target, "http://x.test");
        assert_eq!((link.start, link.end), (3, 7));
        assert_eq!(styled.runs[1].link.as_deref(), Some("http://x.test"));
        assert_eq!(styled.runs[1].colour, 0x0000AAFF);
        assert_eq!(styled.runs[2].colour, BLACK);
    }

    #[test]
    fn test_link_closes_at_paragraph_end() {
        let styled = format("<l:target>open ended");
        assert_eq!(styled.links.len(), 1);
        assert_eq!(styled.links[0].end, 10);
    }

    #[test]
    fn test_empty_link_is_not_recorded() {
        let styled = format("<l:target></l>text");
        assert!(styled.links.is_empty());
    }

    #[test]
    fn test_heading_line() {
        let styled = format("# Title\nbody");
        assert_eq!(texts(&styled), vec!["Title", " \n", "body"]);
        assert_eq!(styled.runs[0].font.size, 15.0 * 2.1);
        assert!(styled.runs[0].font.variant.is_bold());
        assert_eq!(styled.runs[2].font, Font::new(15.0));
    }

    #[test]
    fn test_heading_needs_space() {
        let styled = format("#hashtag");
        assert_eq!(styled.runs[0].font, Font::new(15.0));
        assert_eq!(heading_level("### x"), Some((3, "x")));
        assert_eq!(heading_level("###### x"), None);
    }

    #[test]
    fn test_state_carries_across_lines() {
        let styled = format("*one\ntwo*");
        assert_eq!(texts(&styled), vec!["one", " \n", "two"]);
        assert!(styled.runs.iter().all(|r| r.font.variant == FontVariant::Bold));
    }

    #[test]
    fn test_scan_line_returns_state() {
        let palette = Palette::default();
        let formatter = InlineFormatter::new(&palette, Font::new(15.0));
        let mut out = StyledText::new();
        let state = FormatterState::new(Font::new(15.0), BLACK);
        let state = formatter.scan_line(state, "*a _b <c:blue>", &mut out);
        assert!(state.bold);
        assert!(state.italic);
        assert_eq!(state.colour, 0x0000AAFF);
    }

    #[test]
    fn test_consume_bracket_links() {
        assert_eq!(
            consume_bracket_links("see [[http://x.test|Click]]!"),
            "see <l:http://x.test>*Click*</l>!"
        );
        assert_eq!(
            consume_bracket_links("[[a]] and [[b|c]]"),
            "<l:a>*a*</l> and <l:b>*c*</l>"
        );
        assert_eq!(consume_bracket_links("[[open"), "[[open");
        assert!(contains_bracket_link("x [[y]]"));
        assert!(!contains_bracket_link("x ]] [[y"));
    }

    #[test]
    fn test_bracket_link_round_through_formatter() {
        let styled = format(&consume_bracket_links("[[http://x.test|Click]]"));
        assert_eq!(styled.plain_text(), "Click");
        assert_eq!(styled.links.len(), 1);
        assert_eq!((styled.links[0].start, styled.links[0].end), (0, 5));
        assert!(styled.runs[0].font.variant.is_bold());
    }
}
