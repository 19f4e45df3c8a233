//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use odt2epub_core::{Config, ConversionReport, Converter, InputKind, OutputKind};

/// Output kind selected on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// EPUB package
    #[default]
    Epub,
    /// Single HTML page with a sibling stylesheet
    Html,
}

impl From<OutputFormat> for OutputKind {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Epub => OutputKind::Epub,
            OutputFormat::Html => OutputKind::Html,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "odt2epub")]
#[command(author, version, about = "odt2epub is an odt to epub converter", long_about = None)]
struct Cli {
    /// Input file (.odt or .txt)
    input: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Suppress non-error messages
    #[arg(short, long)]
    quiet: bool,

    /// Output kind
    #[arg(short, long, value_enum, default_value = "epub")]
    format: OutputFormat,

    /// Configuration file (default: odt2epub.toml beside the input)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Book title (default: input file name)
    #[arg(long)]
    title: Option<String>,

    /// Embed the stylesheet in the HTML page
    #[arg(long)]
    inline_css: bool,

    /// Render every paragraph as a plain <p> without a class
    #[arg(long)]
    no_css_class: bool,

    /// Insert split markers before level-1 headings
    #[arg(long)]
    split_marker: bool,

    /// Do not embed a cover image
    #[arg(long)]
    no_cover: bool,
}

/// Command-line flags that take precedence over the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Book title
    pub title: Option<String>,
    /// Force an inline stylesheet
    pub inline_css: bool,
    /// Drop paragraph classes
    pub no_css_class: bool,
    /// Force split markers
    pub split_marker: bool,
    /// Disable the cover
    pub no_cover: bool,
}

impl ConfigOverrides {
    /// Apply the flags that were given
    pub fn apply(&self, config: &mut Config) {
        if let Some(title) = &self.title {
            config.book.title = Some(title.clone());
        }
        if self.inline_css {
            config.html.inline_css = true;
        }
        if self.no_css_class {
            config.html.keep_css_class = false;
        }
        if self.split_marker {
            config.html.insert_split_marker = true;
        }
        if self.no_cover {
            config.cover.enabled = false;
        }
    }
}

/// Install the stderr log subscriber
///
/// `-q` keeps errors only; the default shows warnings; each `-v` adds a
/// level. `RUST_LOG` directives are applied on top.
pub fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI application
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let overrides = ConfigOverrides {
        title: cli.title,
        inline_css: cli.inline_css,
        no_css_class: cli.no_css_class,
        split_marker: cli.split_marker,
        no_cover: cli.no_cover,
    };

    convert_command(
        &cli.input,
        cli.format,
        cli.config.as_deref(),
        &overrides,
        cli.quiet,
    )?;

    Ok(())
}

/// Execute a conversion
pub fn convert_command(
    input: &Path,
    format: OutputFormat,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
    quiet: bool,
) -> Result<ConversionReport> {
    if !input.is_file() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    InputKind::from_path(input)
        .with_context(|| format!("Expected an .odt or .txt file: {}", input.display()))?;

    let mut config = Config::discover(input, config_path).with_context(|| match config_path {
        Some(path) => format!("Failed to load configuration: {}", path.display()),
        None => format!("Failed to load configuration beside {}", input.display()),
    })?;
    overrides.apply(&mut config);

    if !quiet {
        println!("Parsing: {}", input.display());
    }

    let report = Converter::new(config)
        .convert(input, format.into())
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    if !quiet {
        for output in &report.outputs {
            println!("Output: {}", output.display());
        }
        if !report.diagnostics.is_empty() {
            println!("  {} warning(s), see log for details", report.diagnostics.len());
        }
    }

    Ok(report)
}
