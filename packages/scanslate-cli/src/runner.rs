//! Drives a [`Workbench`] for the `ocr` and `export` commands.
use crate::ingest::{expand_inputs, paste_candidate, read_candidate};
use crate::terminal::TerminalSink;
use anyhow::{bail, Context, Result};
use scanslate_core::{
  CandidateFile, ClientConfig, ExportContract, ExportFormat, HttpOcrService, ServiceMode, Workbench,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

type TerminalWorkbench = Workbench<HttpOcrService, TerminalSink>;

/// Builds the client configuration from command line values. A zero timeout disables it.
pub fn client_config(
  mode: ServiceMode,
  contract: Option<ExportContract>,
  base_url: &str,
  timeout_secs: u64,
) -> ClientConfig {
  let mut config = ClientConfig::for_mode(mode).with_base_url(base_url);
  if let Some(contract) = contract {
    config = config.with_export_contract(contract);
  }
  config.timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
  config
}

/// Configuration for an `ocr` run.
pub struct OcrOptions {
  pub config: ClientConfig,
  pub inputs: Vec<PathBuf>,
  pub paste: bool,
  pub api_key: Option<String>,
  pub exports: Vec<ExportFormat>,
  pub output_dir: PathBuf,
  pub markdown_out: Option<PathBuf>,
  pub json: bool,
}

impl Default for OcrOptions {
  fn default() -> Self {
    Self {
      config: ClientConfig::default(),
      inputs: Vec::new(),
      paste: false,
      api_key: None,
      exports: Vec::new(),
      output_dir: PathBuf::from("."),
      markdown_out: None,
      json: false,
    }
  }
}

/// Configuration for an `export` run.
pub struct ExportOptions {
  pub config: ClientConfig,
  pub markdown: PathBuf,
  pub images: Vec<PathBuf>,
  pub formats: Vec<ExportFormat>,
  pub output_dir: PathBuf,
}

#[derive(Debug, Default)]
pub struct RunSummary {
  pub recognized: usize,
  pub exported: Vec<PathBuf>,
  pub failures: usize,
}

impl RunSummary {
  pub fn success(&self) -> bool {
    self.failures == 0
  }
}

/// Several formats from one session: keep it alive until the last export.
fn keep_session_for(config: &mut ClientConfig, formats: &[ExportFormat]) {
  if formats.len() > 1 {
    config.consume_on_export = false;
  }
}

pub async fn run_ocr(options: OcrOptions) -> Result<RunSummary> {
  let paths = expand_inputs(&options.inputs);
  if paths.is_empty() && !options.paste {
    bail!("no input images given");
  }

  let mut config = options.config.clone();
  keep_session_for(&mut config, &options.exports);
  let keyed = config.mode == ServiceMode::Keyed;
  if keyed && options.markdown_out.is_some() {
    warn!("--markdown-out only applies to markdown mode");
  }

  let service = HttpOcrService::new(&config).context("failed to set up the OCR client")?;
  let sink = TerminalSink::new(&options.output_dir, options.json);
  let mut workbench = Workbench::new(&config, service, sink);
  if let Some(api_key) = &options.api_key {
    workbench.set_api_key(api_key);
  }

  let mut summary = RunSummary::default();

  for path in &paths {
    match read_candidate(path).await {
      Ok(candidate) => {
        recognize(&mut workbench, candidate, keyed, &options.exports, &mut summary).await
      }
      Err(e) => {
        eprintln!("Error: {e:#}");
        summary.failures += 1;
      }
    }
  }

  if options.paste {
    match paste_candidate() {
      Ok(candidate) => {
        recognize(&mut workbench, candidate, keyed, &options.exports, &mut summary).await
      }
      Err(e) => {
        eprintln!("Error: {e:#}");
        summary.failures += 1;
      }
    }
  }

  if !keyed && summary.recognized > 0 {
    if let Some(path) = &options.markdown_out {
      fs::write(path, workbench.session().markdown())
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
      info!(path = %path.display(), "markdown written");
    }
    export_all(&mut workbench, &options.exports, &mut summary).await;
  }

  summary.exported = workbench.sink().delivered().to_vec();
  Ok(summary)
}

async fn recognize(
  workbench: &mut TerminalWorkbench,
  candidate: CandidateFile,
  keyed: bool,
  exports: &[ExportFormat],
  summary: &mut RunSummary,
) {
  if workbench.ingest_file(candidate).is_err() {
    summary.failures += 1;
    return;
  }
  if workbench.run_ocr().await.is_err() {
    summary.failures += 1;
    return;
  }
  summary.recognized += 1;

  // One image per session in keyed mode, so each gets its own documents.
  if keyed {
    export_all(workbench, exports, summary).await;
  }
}

async fn export_all(
  workbench: &mut TerminalWorkbench,
  formats: &[ExportFormat],
  summary: &mut RunSummary,
) {
  for format in formats {
    if workbench.export(*format).await.is_err() {
      summary.failures += 1;
    }
  }
}

pub async fn run_export(options: ExportOptions) -> Result<RunSummary> {
  let markdown = fs::read_to_string(&options.markdown)
    .await
    .with_context(|| format!("failed to read {}", options.markdown.display()))?;

  let mut config = options.config.clone();
  config.mode = ServiceMode::Markdown;
  keep_session_for(&mut config, &options.formats);

  let service = HttpOcrService::new(&config).context("failed to set up the OCR client")?;
  let sink = TerminalSink::new(&options.output_dir, false);
  let mut workbench = Workbench::new(&config, service, sink);
  let mut summary = RunSummary::default();

  for path in expand_inputs(&options.images) {
    let candidate = read_candidate(&path).await?;
    if workbench.ingest_file(candidate).is_err() {
      summary.failures += 1;
    }
  }
  workbench.edit_markdown(&markdown)?;

  export_all(&mut workbench, &options.formats, &mut summary).await;

  summary.exported = workbench.sink().delivered().to_vec();
  Ok(summary)
}
