//! # scanslate-cli
//!
//! Terminal front end for [`scanslate_core`]: reads images from disk or the
//! clipboard, runs them through a remote OCR service and saves exported
//! documents.
//!
//! ## Quick Start
//!
//! ```ignore
//! use scanslate_cli::prelude::*;
//!
//! let options = OcrOptions {
//!     inputs: vec!["scan.png".into()],
//!     api_key: Some("my-key".to_string()),
//!     exports: vec![ExportFormat::Docx],
//!     ..Default::default()
//! };
//! let summary = run_ocr(options).await?;
//! println!("{} recognized, {} saved", summary.recognized, summary.exported.len());
//! ```

pub mod ingest;
pub mod runner;
pub mod terminal;

pub use ingest::{expand_inputs, paste_candidate, read_candidate};
pub use runner::{client_config, run_export, run_ocr, ExportOptions, OcrOptions, RunSummary};
pub use terminal::TerminalSink;

/// Prelude module for convenient imports
pub mod prelude {
  pub use crate::{
    client_config, expand_inputs, read_candidate, run_export, run_ocr, ExportOptions, OcrOptions,
    RunSummary, TerminalSink,
  };
  pub use scanslate_core::{ClientConfig, ExportContract, ExportFormat, ServiceMode};
}
