// Behavioural properties of the document pipeline, checked end to end
// against the deterministic SVG metrics

use barelyml::blocks::{Block, MISSING_IMAGE_HEIGHT, table_style};
use barelyml::convert::markdown_to_barelyml;
use barelyml::draw_context::{FontVariant, TextMetrics};
use barelyml::image::Raster;
use barelyml::inline::InlineFormatter;
use barelyml::svg::SvgDrawContext;
use barelyml::table::{TableLayout, TableModel};
use barelyml::{DisplayConfig, Document, MarkupDisplay, Palette, ParseContext};
use rstest::rstest;

fn parse(markup: &str) -> Document {
    let palette = Palette::default();
    let config = DisplayConfig::default();
    Document::parse(markup, &ParseContext::new(&palette, &config))
}

fn metrics() -> SvgDrawContext {
    SvgDrawContext::new(1, 1)
}

#[rstest]
#[case("")]
#[case("\n\n\n")]
#[case("*")]
#[case("<c:")]
#[case("<c#zzzzzz>x</c>")]
#[case("[[")]
#[case("[[|]]")]
#[case("/l/l/l")]
#[case("^")]
#[case("|")]
#[case("{{")]
#[case("{{?}}")]
#[case(r#"<img src=">"#)]
#[case("INFO:")]
#[case("> ")]
#[case("1.")]
#[case("- ")]
#[case("#")]
#[case("######## deep")]
#[case("e\u{301}\u{1F469}\u{200D}\u{1F4BB} _*mixed*_ <c:red>colour")]
fn test_any_input_builds_and_lays_out(#[case] markup: &str) {
    let mut display = MarkupDisplay::default();
    display.set_markup_string(markup);
    let mut ctx = SvgDrawContext::new(200, 100);
    display.resize(200.0, 100.0, &ctx);
    display.draw(&mut ctx);
    assert!(ctx.finish().ends_with("</svg>\n"));
}

#[test]
fn test_building_is_idempotent() {
    let markup = "# Title\nSome *bold* text\n\n- item\n^ A ^\n| [[http://x.test|x]] |\nINFO: note\n{{pic.png?40}}";
    assert_eq!(parse(markup), parse(markup));
}

#[test]
fn test_bold_and_italic_runs() {
    let doc = parse("*bold* and _ital_");
    let text = doc.blocks()[0].styled_text().expect("text block");
    let runs: Vec<(&str, FontVariant)> = text
        .runs
        .iter()
        .map(|r| (r.text.as_str(), r.font.variant))
        .collect();
    assert_eq!(
        runs,
        vec![
            ("bold", FontVariant::Bold),
            (" and ", FontVariant::Regular),
            ("ital", FontVariant::Italic),
        ]
    );
}

#[test]
fn test_colour_applies_until_closed() {
    let palette = Palette::default();
    let doc = parse("<c:red>hi</c>there");
    let text = doc.blocks()[0].styled_text().expect("text block");
    assert_eq!(text.runs.len(), 2);
    assert_eq!(text.runs[0].text, "hi");
    assert_eq!(Some(text.runs[0].colour), palette.resolve("red"));
    assert_eq!(text.runs[1].text, "there");
    assert_eq!(text.runs[1].colour, palette.default_colour());
}

#[test]
fn test_table_columns_take_the_widest_cell() {
    let palette = Palette::default();
    let config = DisplayConfig::default();
    let formatter = InlineFormatter::new(&palette, config.font());
    let model = TableModel::parse(&["^ A ^ B ^", "| 1 | 22 |"], &formatter);

    assert!(model.rows[0].iter().all(|c| c.is_header));
    assert!(model.rows[1].iter().all(|c| !c.is_header));

    let metrics = metrics();
    let layout = TableLayout::measure(&model, &table_style(&config, &palette), &metrics);
    let font = config.font();
    let width = |s: &str| metrics.text_width(s, &font);
    assert_eq!(
        layout.column_widths,
        vec![width("A").max(width("1")), width("B").max(width("22"))]
    );
}

#[rstest]
#[case(300.0, 1)]
#[case(100.0, 2)]
fn test_link_yields_one_region_per_visual_line(#[case] width: f32, #[case] regions: usize) {
    let mut display = MarkupDisplay::default();
    display.set_markup_string("[[http://x.test|Click here]]");
    display.resize(width, 200.0, &metrics());

    let text = display.document().blocks()[0].styled_text().expect("text block");
    assert_eq!(text.links.len(), 1);
    assert_eq!(text.plain_text(), "Click here");

    let found = display.links().regions();
    assert_eq!(found.len(), regions);
    assert!(found.iter().all(|r| r.target == "http://x.test"));
}

#[test]
fn test_missing_image_uses_fallback_height() {
    let palette = Palette::default();
    let config = DisplayConfig::default();
    let failing = |_: &str| -> Option<Raster> { None };
    let ctx = ParseContext::new(&palette, &config).with_images(&failing);
    let mut doc = Document::parse("{{missing.png?100}}", &ctx);

    let block = &mut doc.blocks_mut()[0];
    let Block::Image(image) = &*block else {
        panic!("expected an image block");
    };
    assert!(image.is_missing());
    assert!(image.message.text.plain_text().contains("missing.png"));
    assert!(!image.message.text.plain_text().contains("no file source"));

    let metrics = metrics();
    assert_eq!(block.height_for_width(400.0, &metrics), MISSING_IMAGE_HEIGHT);
    assert_eq!(block.height_for_width(80.0, &metrics), MISSING_IMAGE_HEIGHT);
}

#[test]
fn test_resolved_image_scales_proportionally() {
    let palette = Palette::default();
    let config = DisplayConfig::default();
    let resolver = |_: &str| Some(Raster::blank(200, 100));
    let ctx = ParseContext::new(&palette, &config).with_images(&resolver);
    let mut doc = Document::parse("{{photo.png?100}}", &ctx);

    let metrics = metrics();
    let block = &mut doc.blocks_mut()[0];
    assert_eq!(block.height_for_width(400.0, &metrics), 50.0);
    assert_eq!(block.height_for_width(60.0, &metrics), 30.0);
}

#[rstest]
#[case("**bold** and *italic*", "*bold* and _italic_")]
#[case("![alt](pic.png)", "{{pic.png}}")]
#[case("[text](url)", "[[url|text]]")]
fn test_markdown_conversion(#[case] markdown: &str, #[case] expected: &str) {
    assert_eq!(markdown_to_barelyml(markdown), expected);
}
