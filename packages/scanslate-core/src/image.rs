use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::ValidationError;
use crate::validation::{validate, FileMeta};

/// A file handed over by a picker, a drop or a paste, not yet validated.
#[derive(Clone)]
pub struct CandidateFile {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn meta(&self) -> FileMeta<'_> {
        FileMeta {
            media_type: &self.media_type,
            size_bytes: self.bytes.len() as u64,
        }
    }
}

impl fmt::Debug for CandidateFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateFile")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// An accepted image waiting for OCR or export.
///
/// Only [`PendingImage::accept`] builds one, so a store holding these never
/// holds a file the validation gate turned away.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingImage {
    file_name: String,
    media_type: String,
    bytes: Vec<u8>,
}

impl PendingImage {
    pub fn accept(candidate: CandidateFile) -> Result<Self, ValidationError> {
        validate(&candidate.meta())?;
        Ok(Self {
            file_name: candidate.file_name,
            media_type: candidate.media_type,
            bytes: candidate.bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Encodes the payload as `data:<media type>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.bytes))
    }
}

impl fmt::Debug for PendingImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingImage")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// Declared media type for a path, judged by extension alone.
pub fn media_type_for_path(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_encoding() {
        let image =
            PendingImage::accept(CandidateFile::new("a.png", "image/png", b"abc".to_vec())).unwrap();
        assert_eq!(image.to_data_url(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_accept_rejects_unsupported_type() {
        let result = PendingImage::accept(CandidateFile::new("a.gif", "image/gif", vec![0; 4]));
        assert!(matches!(result, Err(ValidationError::UnsupportedType { .. })));
    }

    #[test]
    fn test_media_type_for_path() {
        assert_eq!(media_type_for_path(Path::new("scan.JPG")), "image/jpeg");
        assert_eq!(media_type_for_path(Path::new("scan.png")), "image/png");
        assert_eq!(media_type_for_path(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(media_type_for_path(Path::new("no_extension")), "application/octet-stream");
    }
}
