//! A presentation sink for the terminal: results on stdout, notices on
//! stderr, exported documents written to an output directory.
use scanslate_core::{
  ActionKind, DownloadedFile, Notice, OcrResult, PendingImage, PresentationSink,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct TerminalSink {
  output_dir: PathBuf,
  json: bool,
  delivered: Vec<PathBuf>,
  notices: Vec<Notice>,
  triggers: HashMap<ActionKind, bool>,
}

impl TerminalSink {
  pub fn new(output_dir: impl Into<PathBuf>, json: bool) -> Self {
    Self {
      output_dir: output_dir.into(),
      json,
      delivered: Vec::new(),
      notices: Vec::new(),
      triggers: HashMap::new(),
    }
  }

  /// Paths of every document written so far.
  pub fn delivered(&self) -> &[PathBuf] {
    &self.delivered
  }

  /// Every notice shown, oldest first.
  pub fn notices(&self) -> &[Notice] {
    &self.notices
  }

  pub fn trigger_enabled(&self, action: ActionKind) -> bool {
    self.triggers.get(&action).copied().unwrap_or(false)
  }
}

/// First free path for `file_name` in `dir`, numbering copies as `name-1.ext`, `name-2.ext`, ...
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
  let candidate = dir.join(file_name);
  if !candidate.exists() {
    return candidate;
  }

  let path = Path::new(file_name);
  let stem = path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_else(|| file_name.to_string());
  let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

  (1..)
    .map(|n| match &extension {
      Some(ext) => dir.join(format!("{stem}-{n}.{ext}")),
      None => dir.join(format!("{stem}-{n}")),
    })
    .find(|p| !p.exists())
    .unwrap_or(candidate)
}

impl PresentationSink for TerminalSink {
  fn show_gallery(&mut self, images: &[PendingImage]) {
    let names: Vec<&str> = images.iter().map(|i| i.file_name()).collect();
    info!(count = images.len(), images = ?names, "image(s) ready for OCR/export");
  }

  fn show_result(&mut self, result: &OcrResult) {
    if self.json {
      match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: failed to serialize result: {e}"),
      }
      return;
    }

    match result {
      OcrResult::Translated(text) => {
        println!("--- Original ({} characters) ---", text.original_length);
        println!("{}", text.original_text);
        println!("--- Translation ({} characters) ---", text.translated_length);
        println!("{}", text.translated_text);
      }
      OcrResult::Markdown { markdown } => println!("{markdown}"),
    }
  }

  fn clear_result(&mut self) {
    debug!("result cleared");
  }

  fn show_error(&mut self, notice: &Notice) {
    eprintln!("Error: {}", notice.message);
    self.notices.push(notice.clone());
  }

  fn clear_error(&mut self) {}

  fn set_trigger_enabled(&mut self, action: ActionKind, enabled: bool) {
    self.triggers.insert(action, enabled);
  }

  fn deliver_file(&mut self, file: &DownloadedFile) -> io::Result<()> {
    std::fs::create_dir_all(&self.output_dir)?;
    let path = unique_path(&self.output_dir, &file.file_name);
    std::fs::write(&path, &file.bytes)?;
    if self.json {
      eprintln!("Saved {}", path.display());
    } else {
      println!("Saved {}", path.display());
    }
    self.delivered.push(path);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_unique_path_does_not_clobber() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(unique_path(dir.path(), "out.pdf"), dir.path().join("out.pdf"));

    std::fs::write(dir.path().join("out.pdf"), b"1").unwrap();
    std::fs::write(dir.path().join("out-1.pdf"), b"2").unwrap();
    assert_eq!(unique_path(dir.path(), "out.pdf"), dir.path().join("out-2.pdf"));
  }

  #[test]
  fn test_deliver_file_writes_into_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = TerminalSink::new(dir.path().join("exports"), false);
    let file = DownloadedFile {
      file_name: "result.docx".to_string(),
      media_type: "application/octet-stream".to_string(),
      bytes: b"PK".to_vec(),
    };

    sink.deliver_file(&file).unwrap();
    sink.deliver_file(&file).unwrap();

    assert_eq!(
      sink.delivered(),
      &[
        dir.path().join("exports/result.docx"),
        dir.path().join("exports/result-1.docx")
      ]
    );
    assert_eq!(std::fs::read(&sink.delivered()[0]).unwrap(), b"PK".to_vec());
  }
}
