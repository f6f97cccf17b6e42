//! # scanslate-core
//!
//! Client-side orchestration for a remote OCR and translation service: a user
//! hands over an image, the service recognizes (and optionally translates)
//! it, and the result can be exported as DOCX or PDF.
//!
//! ```text
//! picker / drop / paste
//!     │
//!     ▼
//! validation::validate()      ← type and size gate
//!     │
//!     ▼
//! Session (ImageStore)        ← pending images, credential, results
//!     │
//!     ▼
//! OcrService                  ← recognize / export / download
//!     │
//!     ▼
//! PresentationSink            ← gallery, results, notices, triggers
//! ```
//!
//! [`Workbench`] owns all of the above and is the type most callers need.

pub mod config;
pub mod error;
pub mod http;
pub mod image;
pub mod reporter;
pub mod service;
pub mod session;
pub mod sink;
pub mod store;
pub mod validation;
pub mod workbench;

pub use config::{ClientConfig, ExportContract, ServiceMode};
pub use error::{RequestError, SessionError, ValidationError};
pub use http::HttpOcrService;
pub use image::{media_type_for_path, CandidateFile, PendingImage};
pub use reporter::{categorize, ErrorCategory, ErrorReporter, Notice};
pub use service::{
    DownloadedFile, ExportContent, ExportFormat, ExportOutcome, ExportRequest, OcrRequest,
    OcrResult, OcrService, TranslatedText,
};
pub use session::{ActionKind, Phase, RequestState, Session, SessionConfig, Settlement};
pub use sink::PresentationSink;
pub use store::{ImageStore, StoreMode};
pub use validation::{validate, FileMeta, ACCEPTED_MEDIA_TYPES, MAX_IMAGE_BYTES};
pub use workbench::Workbench;
