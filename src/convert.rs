// Format converters
// Line-oriented rewriters between BarelyML and neighbouring dialects. All of
// them are best effort and lossy; none of them round-trips.

use regex::Regex;
use std::sync::LazyLock;

static MD_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]*)\)").unwrap());

static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").unwrap());

static MD_AUTOLINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<((?:https?://|mailto:)[^>\s]*)>").unwrap());

static BML_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\]|]*)(?:\|([^\]]*))?\]\]").unwrap());

static ASCIIDOC_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[ \t])((?:https?://|mailto:)[^\s\[]*)(?:\[([^\]]*)\])?").unwrap());

static ASCIIDOC_COLOUR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]#([^#]*)#").unwrap());

static BML_COLOUR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<c:([^>]*)>(.*?)</c>").unwrap());

/// Private-use character standing in for a bold marker during emphasis folding
const BOLD_PLACEHOLDER: &str = "\u{E000}";

/// Private-use character protecting `://` inside DokuWiki links
const URL_PLACEHOLDER: &str = "\u{E001}";

/// `| --- | --- |`: only pipes, hyphens and blanks, with at least one hyphen
fn is_separator_row(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| matches!(c, '|' | '-' | ' ' | '\t'))
}

/// Replace a list marker that is preceded only by whitespace with `- `
fn normalize_bullet(line: &str, marker: &str) -> Option<String> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with(marker) {
        return None;
    }
    let indent = &line[..line.len() - trimmed.len()];
    Some(format!("{indent}- {}", &trimmed[marker.len()..]))
}

/// Convert Markdown into BarelyML.
///
/// Handles `*`/`+` bullets, images, labelled links and autolinks, GFM
/// header rows and bold/italic markers. Everything else passes through.
pub fn markdown_to_barelyml(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut output: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_table = false;

    for (li, raw) in lines.iter().enumerate() {
        let mut line = normalize_bullet(raw, "* ")
            .or_else(|| normalize_bullet(raw, "+ "))
            .unwrap_or_else(|| raw.to_string());

        line = MD_IMAGE_RE.replace_all(&line, "{{$2}}").into_owned();
        line = MD_LINK_RE.replace_all(&line, "[[$2|$1]]").into_owned();
        line = MD_AUTOLINK_RE.replace_all(&line, "[[$1]]").into_owned();

        // separator rows are dropped once a table has started
        if in_table && is_separator_row(&line) {
            continue;
        }

        if line.trim_start().starts_with('|') {
            let next_is_separator = lines
                .get(li + 1)
                .is_some_and(|next| is_separator_row(next) && next.contains('-'));
            if !in_table && next_is_separator {
                in_table = true;
                line = line.replace('|', "^");
            }
        } else {
            in_table = false;
        }

        output.push(line);
    }

    fold_emphasis(&output.join("\n"))
}

/// `**`/`__` become bold `*`, single `*` and `<sub>` become italic `_`
fn fold_emphasis(text: &str) -> String {
    text.replace("**", BOLD_PLACEHOLDER)
        .replace("__", BOLD_PLACEHOLDER)
        .replace('*', "_")
        .replace("<sub>", "_")
        .replace("</sub>", "_")
        .replace(BOLD_PLACEHOLDER, "*")
}

const DOKUWIKI_HEADINGS: [(&str, &str); 5] = [
    ("====== ", "# "),
    ("===== ", "## "),
    ("==== ", "### "),
    ("=== ", "#### "),
    ("== ", "##### "),
];

/// Nesting levels supported for DokuWiki lists
const LIST_LEVELS: usize = 5;

/// Convert DokuWiki markup into BarelyML.
///
/// Ordered items are numbered per nesting level; a line that is not a
/// deeper ordered item restarts the numbering of all deeper levels.
pub fn dokuwiki_to_barelyml(dokuwiki: &str) -> String {
    let mut counters = [1usize; LIST_LEVELS];
    let mut output: Vec<String> = Vec::new();

    for raw in dokuwiki.lines() {
        let mut line = raw.to_string();

        if let Some((marker, title)) = DOKUWIKI_HEADINGS.iter().find_map(|(prefix, marker)| {
            raw.strip_prefix(*prefix)
                .map(|rest| (*marker, rest.trim_end_matches([' ', '='])))
        }) {
            line = format!("{marker}{title}");
        }

        let mut ordered_level = 0;
        for level in 1..=LIST_LEVELS {
            let marker = format!("{}- ", "  ".repeat(level));
            if let Some(rest) = line.strip_prefix(&marker) {
                let indent = " ".repeat(level - 1);
                line = format!("{indent}{}. {rest}", counters[level - 1]);
                counters[level - 1] += 1;
                ordered_level = level;
                break;
            }
        }
        for counter in counters.iter_mut().skip(ordered_level) {
            *counter = 1;
        }

        for level in 1..=LIST_LEVELS {
            let marker = format!("{}* ", "  ".repeat(level));
            if let Some(rest) = line.strip_prefix(&marker) {
                line = format!("{}- {rest}", " ".repeat(level - 1));
                break;
            }
        }

        output.push(line);
    }

    output
        .join("\n")
        .replace("[[http://", &format!("[[http{URL_PLACEHOLDER}"))
        .replace("[[https://", &format!("[[https{URL_PLACEHOLDER}"))
        .replace("**", "*")
        .replace("//", "_")
        .replace(URL_PLACEHOLDER, "://")
        .replace("<color #", "<c#")
        .replace("<color ", "<c:")
        .replace("</color>", "</c>")
}

/// Convert BarelyML into Markdown.
///
/// The first header row of a table gets a `| --- |` separator row; links
/// become Markdown links and bold markers are doubled.
pub fn barelyml_to_markdown(markup: &str) -> String {
    let mut output: Vec<String> = Vec::new();
    let mut in_table = false;

    for raw in markup.lines() {
        let mut line = raw.to_string();

        if line.starts_with('^') && !in_table {
            line = line.replace('^', "|");
            // text after the last delimiter is not a column
            let mut widths: Vec<usize> = line[1..].split('|').map(|c| c.chars().count()).collect();
            widths.pop();
            if !widths.is_empty() {
                line.push_str("\n|");
                for width in widths {
                    line.push(' ');
                    line.push_str(&"-".repeat(width.saturating_sub(2).max(3)));
                    line.push_str(" |");
                }
            }
        }
        in_table = line.starts_with(['^', '|']);

        line = BML_LINK_RE
            .replace_all(&line, |caps: &regex::Captures| match caps.get(2) {
                Some(label) => format!("[{}]({})", label.as_str(), &caps[1]),
                None => format!("<{}>", &caps[1]),
            })
            .into_owned();

        output.push(line);
    }

    output.join("\n").replace('*', "**")
}

/// Nesting levels of an ordered BarelyML item: `(leading spaces, text)`
fn ordered_item(line: &str) -> Option<(usize, &str)> {
    let dot = line.find(". ").filter(|&i| i > 0)?;
    let number = line[..dot].trim_start_matches(' ');
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let leading = dot - number.len();
    (leading < LIST_LEVELS).then_some((leading, &line[dot + 2..]))
}

/// Nesting levels of an unordered BarelyML item: `(leading spaces, text)`
fn unordered_item(line: &str) -> Option<(usize, &str)> {
    let rest = line.trim_start_matches(' ');
    let leading = line.len() - rest.len();
    let text = rest.strip_prefix("- ")?;
    (leading < LIST_LEVELS).then_some((leading, text))
}

/// Convert BarelyML into DokuWiki markup
pub fn barelyml_to_dokuwiki(markup: &str) -> String {
    let mut output: Vec<String> = Vec::new();

    for raw in markup.lines() {
        let mut line = raw.replace('*', "**").replace('_', "//");

        if let Some((prefix, title)) = DOKUWIKI_HEADINGS.iter().find_map(|(prefix, marker)| {
            line.strip_prefix(*marker).map(|title| (*prefix, title.to_string()))
        }) {
            line = format!("{prefix}{title} {}", prefix.trim_end());
        }

        if let Some((level, text)) = unordered_item(&line) {
            line = format!("{}* {text}", "  ".repeat(level + 1));
        } else if let Some((level, text)) = ordered_item(&line) {
            line = format!("{}- {text}", "  ".repeat(level + 1));
        }

        output.push(line);
    }

    output
        .join("\n")
        .replace("<c#", "<color #")
        .replace("<c:", "<color ")
        .replace("</c>", "</color>")
}

const ASCIIDOC_HEADINGS: [(&str, &str); 5] = [
    ("= ", "# "),
    ("== ", "## "),
    ("=== ", "### "),
    ("==== ", "#### "),
    ("===== ", "##### "),
];

const ASCIIDOC_ADMONITIONS: [(&str, &str); 2] = [("NOTE: ", "INFO: "), ("TIP: ", "HINT: ")];

/// `|===` and friends
fn is_asciidoc_table_delimiter(line: &str) -> bool {
    line.strip_prefix('|')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c == '='))
}

/// Convert AsciiDoc into BarelyML.
///
/// `|===` tables become `|`/`^` rows (a blank line after the first row
/// marks it as the header), `.`/`*` lists nest up to five levels, bare URLs
/// become links and `[name]#text#` becomes a colour tag. Attribute lines in
/// square brackets are dropped.
pub fn asciidoc_to_barelyml(asciidoc: &str) -> String {
    let lines: Vec<&str> = asciidoc.lines().collect();
    let mut counters = [1usize; LIST_LEVELS];
    let mut output: Vec<String> = Vec::new();
    let mut in_table = false;
    let mut table_columns = 0;
    let mut li = 0;

    while li < lines.len() {
        let raw = lines[li];
        let mut line = raw.to_string();
        let mut skip = raw.starts_with('[') && raw.ends_with(']');

        if is_asciidoc_table_delimiter(raw) {
            skip = true;
            in_table = !in_table;
            table_columns = 0;
        } else if !skip && raw.starts_with('|') {
            let mut found = raw.matches('|').count();
            if table_columns == 0 {
                table_columns = found;
                let header = lines.get(li + 1).is_some_and(|next| next.is_empty());
                line = if header {
                    format!("{} ^", raw.replace('^', "").replace('|', "^"))
                } else {
                    format!("{raw} |")
                };
            } else {
                // a row may spread its cells over several lines
                while found < table_columns
                    && lines
                        .get(li + 1)
                        .is_some_and(|next| next.starts_with('|') && !is_asciidoc_table_delimiter(next))
                {
                    li += 1;
                    line.push_str(lines[li]);
                    found += lines[li].matches('|').count();
                }
                line.push_str(" |");
            }
        }
        if in_table && line.is_empty() {
            skip = true;
        }

        if let Some((marker, title)) = ASCIIDOC_HEADINGS
            .iter()
            .find_map(|(prefix, marker)| line.strip_prefix(*prefix).map(|title| (*marker, title.to_string())))
        {
            line = format!("{marker}{title}");
        }

        let mut ordered_level = 0;
        for level in (1..=LIST_LEVELS).rev() {
            let marker = format!("{} ", ".".repeat(level));
            if let Some(rest) = line.strip_prefix(&marker) {
                line = format!("{}{}. {rest}", " ".repeat(level - 1), counters[level - 1]);
                counters[level - 1] += 1;
                ordered_level = level;
                break;
            }
        }
        for counter in counters.iter_mut().skip(ordered_level) {
            *counter = 1;
        }

        for level in (1..=LIST_LEVELS).rev() {
            let marker = format!("{} ", "*".repeat(level));
            if let Some(rest) = line.strip_prefix(&marker) {
                line = format!("{}- {rest}", " ".repeat(level - 1));
                break;
            }
        }

        if let Some((keyword, rest)) = ASCIIDOC_ADMONITIONS
            .iter()
            .find_map(|(from, to)| line.strip_prefix(*from).map(|rest| (*to, rest.to_string())))
        {
            line = format!("{keyword}{rest}");
        }

        line = ASCIIDOC_URL_RE
            .replace_all(&line, |caps: &regex::Captures| match caps.get(3) {
                Some(label) => format!("{}[[{}|{}]]", &caps[1], &caps[2], label.as_str()),
                None => format!("{}[[{}]]", &caps[1], &caps[2]),
            })
            .into_owned();

        if !skip {
            output.push(line);
        }
        li += 1;
    }

    let folded = output.join("\n").replace("**", "*").replace("__", "_");
    ASCIIDOC_COLOUR_RE.replace_all(&folded, "<c:$1>$2</c>").into_owned()
}

/// Convert BarelyML into AsciiDoc.
///
/// Tables are wrapped in `|===` with the first row separated by a blank
/// line; only web and mail links are rewritten.
pub fn barelyml_to_asciidoc(markup: &str) -> String {
    let lines: Vec<&str> = markup.lines().collect();
    let mut output: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_table = false;

    for (li, raw) in lines.iter().enumerate() {
        let mut line = raw.to_string();

        if raw.starts_with(['^', '|']) {
            if in_table {
                // drop the trailing delimiter
                let mut chars = raw.trim_end().chars();
                chars.next_back();
                line = chars.as_str().trim_end().to_string();
            } else {
                let row = raw.replace('^', "|");
                let cells = row.rsplit_once('|').map_or(row.as_str(), |(cells, _)| cells);
                line = format!("|===\n{}\n", cells.trim_end());
            }
            in_table = true;
            if !lines.get(li + 1).is_some_and(|next| next.starts_with(['^', '|'])) {
                line.push_str("\n|===");
                in_table = false;
            }
        }

        if let Some((prefix, title)) = ASCIIDOC_HEADINGS
            .iter()
            .find_map(|(prefix, marker)| line.strip_prefix(*marker).map(|title| (*prefix, title.to_string())))
        {
            line = format!("{prefix}{title}");
        }

        if let Some((level, text)) = unordered_item(&line) {
            line = format!("{} {text}", "*".repeat(level + 1));
        } else if let Some((level, text)) = ordered_item(&line) {
            line = format!("{} {text}", ".".repeat(level + 1));
        }

        line = BML_LINK_RE
            .replace_all(&line, |caps: &regex::Captures| {
                let target = &caps[1];
                if !["http://", "https://", "mailto:"].iter().any(|s| target.starts_with(s)) {
                    return caps[0].to_string();
                }
                match caps.get(2) {
                    Some(label) => format!("{target}[{}]", label.as_str()),
                    None => target.to_string(),
                }
            })
            .into_owned();

        if let Some((keyword, rest)) = ASCIIDOC_ADMONITIONS
            .iter()
            .find_map(|(to, from)| line.strip_prefix(*from).map(|rest| (*to, rest.to_string())))
        {
            line = format!("{keyword}{rest}");
        }

        output.push(line);
    }

    BML_COLOUR_RE
        .replace_all(&output.join("\n"), "[$1]#$2#")
        .into_owned()
}
