//! Turns paths and the clipboard into candidate files for the workbench.
use anyhow::{anyhow, Context, Result};
use image::{ImageFormat, RgbaImage};
use scanslate_core::{media_type_for_path, CandidateFile};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

/// Extensions picked up when a directory is given as input.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Expands directories into the image files they contain, sorted by path.
/// Plain files are passed through untouched so the validation gate can judge them.
pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
  let mut expanded = Vec::new();

  for input in inputs {
    if !input.is_dir() {
      expanded.push(input.clone());
      continue;
    }

    let mut found: Vec<PathBuf> = WalkDir::new(input)
      .into_iter()
      .filter_map(|e| e.ok())
      .filter(|e| e.file_type().is_file())
      .map(|e| e.into_path())
      .filter(|path| has_image_extension(path))
      .collect();
    found.sort();

    debug!(dir = %input.display(), images = found.len(), "expanded directory");
    expanded.extend(found);
  }

  expanded
}

fn has_image_extension(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    .unwrap_or(false)
}

/// Reads a file into a candidate whose media type is declared from its extension.
pub async fn read_candidate(path: &Path) -> Result<CandidateFile> {
  let bytes = fs::read(path)
    .await
    .with_context(|| format!("failed to read {}", path.display()))?;
  let file_name = path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string());

  Ok(CandidateFile::new(file_name, media_type_for_path(path), bytes))
}

/// Grabs the clipboard image and encodes it as PNG.
pub fn paste_candidate() -> Result<CandidateFile> {
  let mut clipboard = arboard::Clipboard::new().context("clipboard is not available")?;
  let data = clipboard
    .get_image()
    .context("the clipboard does not hold an image")?;

  let image = RgbaImage::from_raw(data.width as u32, data.height as u32, data.bytes.into_owned())
    .ok_or_else(|| anyhow!("clipboard image has an unexpected size"))?;

  let mut png = Vec::new();
  image
    .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
    .context("failed to encode clipboard image")?;

  Ok(CandidateFile::new("clipboard.png", "image/png", png))
}
