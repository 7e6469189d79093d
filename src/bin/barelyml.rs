use anyhow::{Context, Result};
use barelyml::convert::{
    asciidoc_to_barelyml, barelyml_to_asciidoc, barelyml_to_dokuwiki, barelyml_to_markdown, dokuwiki_to_barelyml,
    markdown_to_barelyml,
};
use barelyml::document::{Document, ParseContext};
use barelyml::svg::SvgDrawContext;
use barelyml::{DisplayConfig, MarkupDisplay};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "barelyml")]
#[command(about = "Render and convert BarelyML documents", long_about = None)]
struct Args {
    /// Display settings (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a document to SVG
    Render {
        /// Input file (default: stdin)
        input: Option<PathBuf>,

        /// Source dialect
        #[arg(short = 'f', long = "from", value_enum, default_value_t = Dialect::Markup)]
        from: Dialect,

        /// Viewport width
        #[arg(short = 'W', long = "width", default_value = "600")]
        width: u32,

        /// Viewport height (default: the full document height)
        #[arg(short = 'H', long = "height")]
        height: Option<u32>,

        /// Output file (default: stdout)
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Convert between dialects
    Convert {
        /// Input file (default: stdin)
        input: Option<PathBuf>,

        /// Source dialect
        #[arg(short = 'f', long = "from", value_enum)]
        from: Dialect,

        /// Target dialect
        #[arg(short = 't', long = "to", value_enum, default_value_t = Target::Barelyml)]
        to: Target,
    },
    /// List the blocks a document classifies into
    Outline {
        /// Input file (default: stdin)
        input: Option<PathBuf>,

        /// Source dialect
        #[arg(short = 'f', long = "from", value_enum, default_value_t = Dialect::Markup)]
        from: Dialect,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Dialect {
    Markup,
    Markdown,
    Dokuwiki,
    Asciidoc,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Barelyml,
    Markdown,
    Dokuwiki,
    Asciidoc,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Render {
            input,
            from,
            width,
            height,
            output,
        } => {
            let markup = to_barelyml(&read_input(input.as_deref())?, from);
            let svg = render(&markup, config, width, height);
            write_output(output.as_deref(), &svg)?;
        }
        Commands::Convert { input, from, to } => {
            let source = read_input(input.as_deref())?;
            let markup = to_barelyml(&source, from);
            let converted = match to {
                Target::Barelyml => markup,
                Target::Markdown => barelyml_to_markdown(&markup),
                Target::Dokuwiki => barelyml_to_dokuwiki(&markup),
                Target::Asciidoc => barelyml_to_asciidoc(&markup),
            };
            write_output(None, &converted)?;
        }
        Commands::Outline { input, from } => {
            let markup = to_barelyml(&read_input(input.as_deref())?, from);
            let palette = config.palette();
            let document = Document::parse(&markup, &ParseContext::new(&palette, &config));
            write_output(None, &document.to_string())?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<DisplayConfig> {
    match path {
        Some(path) => DisplayConfig::load_from_path(path)
            .with_context(|| format!("Failed to load display settings from {}", path.display())),
        None => Ok(DisplayConfig::default()),
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, content).with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes()).context("Failed to write to stdout")?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n").context("Failed to write to stdout")?;
            }
            Ok(())
        }
    }
}

fn to_barelyml(source: &str, dialect: Dialect) -> String {
    match dialect {
        Dialect::Markup => source.to_string(),
        Dialect::Markdown => markdown_to_barelyml(source),
        Dialect::Dokuwiki => dokuwiki_to_barelyml(source),
        Dialect::Asciidoc => asciidoc_to_barelyml(source),
    }
}

fn render(markup: &str, config: DisplayConfig, width: u32, height: Option<u32>) -> String {
    let mut display = MarkupDisplay::new(config);
    display.set_markup_string(markup);

    // measure first when the height follows the content
    let height = height.unwrap_or_else(|| {
        display.resize(width as f32, 0.0, &SvgDrawContext::new(width as i32, 0));
        display.content_height().ceil() as u32
    });

    let mut ctx = SvgDrawContext::new(width as i32, height as i32);
    display.resize(width as f32, height as f32, &ctx);
    display.draw(&mut ctx);
    ctx.finish()
}
