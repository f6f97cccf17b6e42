use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::image::PendingImage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedText {
    pub original_text: String,
    pub translated_text: String,
    pub original_length: u64,
    pub translated_length: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OcrResult {
    Translated(TranslatedText),
    Markdown { markdown: String },
}

#[derive(Debug, Clone)]
pub struct OcrRequest {
    pub image: PendingImage,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportContent {
    Translated {
        original_text: String,
        translated_text: String,
    },
    /// `images` are data URLs in upload order.
    Markdown { markdown: String, images: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub content: ExportContent,
}

/// A document ready to hand to the user. Dropped once delivered.
#[derive(Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for DownloadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadedFile")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    File(DownloadedFile),
    DownloadUrl(String),
}

/// The remote OCR, translation and document service.
///
/// Calls are not safe to retry blindly: the service may generate files as a
/// side effect.
#[async_trait]
pub trait OcrService: Send + Sync {
    async fn recognize(&self, request: &OcrRequest) -> Result<OcrResult, RequestError>;

    async fn export(&self, request: &ExportRequest) -> Result<ExportOutcome, RequestError>;

    async fn download(&self, url: &str) -> Result<DownloadedFile, RequestError>;
}
