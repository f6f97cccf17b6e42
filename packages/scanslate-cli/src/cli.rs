//! Command line arguments backing the `scanslate` binary.
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use scanslate_core::{ExportContract, ExportFormat, ServiceMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
  name = "scanslate",
  about = "Recognize, translate and export text from images through a remote OCR service",
  version
)]
pub struct Args {
  #[command(subcommand)]
  pub command: Commands,

  #[command(flatten)]
  pub service: ServiceArgs,

  /// Log request details
  #[arg(long, short = 'v', global = true)]
  pub verbose: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ServiceArgs {
  /// Base URL of the OCR service
  #[arg(
    long,
    global = true,
    env = "SCANSLATE_BASE_URL",
    default_value = scanslate_core::config::DEFAULT_BASE_URL
  )]
  pub base_url: String,

  /// Give up on a request after this many seconds (0 waits forever)
  #[arg(long, global = true, default_value = "120")]
  pub timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// Run OCR on images and optionally export the result
  Ocr {
    /// Image files or directories of images
    inputs: Vec<PathBuf>,

    /// Also take an image from the clipboard
    #[arg(long)]
    paste: bool,

    /// API key forwarded to the service (keyed mode)
    #[arg(long, short = 'k', env = "SCANSLATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Endpoint family exposed by the service
    #[arg(long, short = 'm', value_enum, default_value_t = ModeArg::Keyed)]
    mode: ModeArg,

    /// How the service returns exported documents (defaults per mode)
    #[arg(long, value_enum)]
    contract: Option<ContractArg>,

    /// Export the result; may be repeated
    #[arg(long, short = 'e', value_enum)]
    export: Vec<FormatArg>,

    /// Directory that receives exported documents
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,

    /// Write the recognized Markdown to this file (markdown mode)
    #[arg(long)]
    markdown_out: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
  },
  /// Export an existing Markdown document through the service
  Export {
    /// Markdown file to export
    markdown: PathBuf,

    /// Images sent along with the document; may be repeated
    #[arg(long, short = 'i')]
    image: Vec<PathBuf>,

    /// Output format; may be repeated
    #[arg(long, short = 'f', value_enum, required = true)]
    format: Vec<FormatArg>,

    /// How the service returns exported documents
    #[arg(long, value_enum, default_value_t = ContractArg::Url)]
    contract: ContractArg,

    /// Directory that receives exported documents
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
  Keyed,
  Markdown,
}

impl From<ModeArg> for ServiceMode {
  fn from(mode: ModeArg) -> Self {
    match mode {
      ModeArg::Keyed => ServiceMode::Keyed,
      ModeArg::Markdown => ServiceMode::Markdown,
    }
  }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractArg {
  /// The response body is the document
  Binary,
  /// The response carries a download URL
  Url,
}

impl From<ContractArg> for ExportContract {
  fn from(contract: ContractArg) -> Self {
    match contract {
      ContractArg::Binary => ExportContract::BinaryStream,
      ContractArg::Url => ExportContract::DownloadUrl,
    }
  }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
  Docx,
  Pdf,
}

impl From<FormatArg> for ExportFormat {
  fn from(format: FormatArg) -> Self {
    match format {
      FormatArg::Docx => ExportFormat::Docx,
      FormatArg::Pdf => ExportFormat::Pdf,
    }
  }
}
