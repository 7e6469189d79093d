// End-to-end rendering through the SVG backend

use barelyml::blocks::Block;
use barelyml::svg::SvgDrawContext;
use barelyml::{DisplayConfig, MarkupDisplay};

fn render(markup: &str, width: i32, height: i32) -> String {
    render_with(DisplayConfig::default(), markup, width, height)
}

fn render_with(config: DisplayConfig, markup: &str, width: i32, height: i32) -> String {
    let mut display = MarkupDisplay::new(config);
    display.set_markup_string(markup);
    let mut ctx = SvgDrawContext::new(width, height);
    display.resize(width as f32, height as f32, &ctx);
    display.draw(&mut ctx);
    ctx.finish()
}

#[test]
fn test_single_line() {
    insta::assert_snapshot!(render("hi", 100, 40), @r##"
    <svg xmlns="http://www.w3.org/2000/svg" width="100" height="40" viewBox="0 0 100 40">
      <rect x="0" y="0" width="100" height="40" fill="#ffffff"/>
      <defs><clipPath id="clip-0"><rect x="0" y="0" width="100" height="40"/></clipPath></defs>
      <text x="20" y="32" fill="#000000" font-family="Helvetica, Arial, sans-serif" font-size="15" font-weight="normal" font-style="normal" xml:space="preserve" clip-path="url(#clip-0)">hi</text>
    </svg>
    "##);
}

#[test]
fn test_blocks_below_the_viewport_are_skipped() {
    let markup = (0..30).map(|i| format!("- row{i}")).collect::<Vec<_>>().join("\n");
    let svg = render(&markup, 200, 60);
    assert!(svg.contains(">row0</text>"));
    assert!(!svg.contains(">row29</text>"));
}

#[test]
fn test_colours_and_headings() {
    let svg = render("# Big\n<c:red>warm</c>", 300, 100);
    assert!(svg.contains(r#"font-weight="bold" font-style="normal" xml:space="preserve" clip-path="url(#clip-0)">Big</text>"#));
    assert!(svg.contains(r##"fill="#aa0000""##));
}

#[test]
fn test_admonition_draws_accent_tab() {
    let svg = render("WARNING: hot", 300, 100);
    assert!(svg.contains(">hot</text>"));
    // icon tab at the block origin
    assert!(svg.contains(r#"<rect x="20" y="20" width="20" height="20""#));
}

#[test]
fn test_missing_image_placeholder() {
    let svg = render("{{gone.png}}", 300, 100);
    assert!(svg.contains("<line "));
    assert!(svg.contains("gone.png"));
    assert!(svg.contains("found."));
}

#[test]
fn test_table_cells_and_header_background() {
    let svg = render("^ Name ^\n| value |", 300, 120);
    assert!(svg.contains(">Name</text>"));
    assert!(svg.contains(">value</text>"));
    // lightcyan header, lightgray body
    assert!(svg.contains(r##"fill="#55ffff""##));
    assert!(svg.contains(r##"fill="#aaaaaa""##));
}

#[test]
fn test_custom_palette_from_config() {
    let config = DisplayConfig::from_toml_str(
        r##"
        background = "paper"

        [palette]
        paper = "#FED"
        red = "#F00"
        "##,
    )
    .expect("valid config");
    let svg = render_with(config, "<c:red>x</c>", 100, 40);
    assert!(svg.contains(r##"fill="#ffeedd""##));
    assert!(svg.contains(r##"fill="#ff0000""##));
}

#[test]
fn test_wide_table_scrolls_independently() {
    let mut display = MarkupDisplay::default();
    display.set_markup_string("| aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa |\nafter");
    let ctx = SvgDrawContext::new(100, 100);
    display.resize(100.0, 100.0, &ctx);

    display.scroll_table(0, 1.0e6);
    let Block::Table(table) = &display.document().blocks()[0] else {
        panic!("expected a table");
    };
    let scrolled = table.scroll_x();
    assert!(scrolled > 0.0);

    // only tables scroll sideways
    display.scroll_table(1, 50.0);
    assert_eq!(display.document().blocks()[1].kind_name(), "text");
}
