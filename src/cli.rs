//! CLI definitions for vlmweave
//!
//! Kept out of main.rs so integration tests can parse arguments directly.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand, ValueEnum};

use crate::provider::ProviderKind;

/// Build clap styles.
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser, Debug)]
#[command(name = "vlmweave")]
#[command(about = "Render documents with vision-model analyses of their images woven in")]
#[command(
    long_about = "vlmweave renders container documents (docx, pptx, xlsx, odt, epub, zip)
and single image files to XHTML or plain text. Every embedded image is sent
to a vision language model while the document keeps rendering; each result
is placed right after its image, or at the end of the document if it was
not ready in time.

QUICK START:
    vlmweave render report.docx                 XHTML to stdout
    vlmweave render slides.pptx -f text -o out  Plain text to a file
    vlmweave config init                        Write a default config file

The API key is read from VLMWEAVE_API_KEY or the config file. Without one,
rendering still succeeds and every image carries an error marker."
)]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for `render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Xhtml,
    Text,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a document with image analyses
    #[command(long_about = "Render a document, analysing its embedded images in parallel.

Analysis failures never fail the render: each affected image gets an
'[analysis unavailable: ...]' marker instead. A summary is printed to
stderr when rendering finishes.

EXAMPLES:
    vlmweave render report.docx
    vlmweave render photo.png --provider anthropic
    vlmweave render deck.pptx --threads 2 --timeout 60 -o deck.xhtml
    vlmweave render book.epub --no-inline -f text")]
    Render(RenderArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Document to render
    #[arg(help = "Document or image file to render")]
    pub file: PathBuf,

    #[arg(long, short, value_enum, default_value_t = OutputFormat::Xhtml, help = "Output format")]
    pub format: OutputFormat,

    #[arg(long, short, help = "Write output to this file instead of stdout")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Provider: openai, anthropic or custom")]
    pub provider: Option<ProviderKind>,

    #[arg(long, help = "Model name sent to the provider")]
    pub model: Option<String>,

    #[arg(long, help = "Provider endpoint URL (required for custom)")]
    pub endpoint: Option<String>,

    #[arg(long, short = 't', help = "Number of analysis worker threads")]
    pub threads: Option<usize>,

    #[arg(long, help = "Seconds to wait for a result at its image")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Seconds to wait per result at the end of the document")]
    pub drain_timeout: Option<u64>,

    #[arg(long, help = "Only write results at the end of the document")]
    pub no_inline: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration (API key redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
}
