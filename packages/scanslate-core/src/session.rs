//! Session state: pending images, credential, results and per-action request
//! state, plus the transitions that move between them.
//!
//! The phase is always derived from the underlying data, so predicates such
//! as [`Session::can_submit_ocr`] are recomputed on every call rather than
//! cached.
//!
//! ```text
//! Empty ─select─▶ ImageSelected ─start_ocr─▶ Processing ─ok─▶ ResultsReady
//!   ▲                  ▲                         │                 │
//!   │                  └────────── failed ───────┘        start_export
//!   │                                                              ▼
//!   └──────────── reset / export consumes session ──────────── Exporting
//! ```

use std::fmt;

use tracing::debug;

use crate::error::{SessionError, ValidationError};
use crate::image::{CandidateFile, PendingImage};
use crate::service::{ExportContent, ExportFormat, ExportRequest, OcrRequest, OcrResult};
use crate::store::{ImageStore, StoreMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Ocr,
    ExportDocx,
    ExportPdf,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Ocr, ActionKind::ExportDocx, ActionKind::ExportPdf];

    pub fn export(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Docx => ActionKind::ExportDocx,
            ExportFormat::Pdf => ActionKind::ExportPdf,
        }
    }

    fn index(self) -> usize {
        match self {
            ActionKind::Ocr => 0,
            ActionKind::ExportDocx => 1,
            ActionKind::ExportPdf => 2,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Ocr => f.write_str("OCR"),
            ActionKind::ExportDocx => f.write_str("DOCX export"),
            ActionKind::ExportPdf => f.write_str("PDF export"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    ImageSelected,
    Processing,
    ResultsReady,
    Exporting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Empty => "empty",
            Phase::ImageSelected => "image selected",
            Phase::Processing => "processing",
            Phase::ResultsReady => "results ready",
            Phase::Exporting => "exporting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub store_mode: StoreMode,
    pub api_key_required: bool,
    pub consume_on_export: bool,
}

/// Identifies one issued request. A ticket from before a [`Session::reset`]
/// no longer matches and its settlement is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    action: ActionKind,
}

impl Ticket {
    pub fn action(&self) -> ActionKind {
        self.action
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Applied,
    /// The session was reset while the request was in flight.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct OcrJob {
    pub ticket: Ticket,
    pub request: OcrRequest,
}

#[derive(Debug, Clone)]
pub struct ExportJob {
    pub ticket: Ticket,
    pub request: ExportRequest,
}

#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    store: ImageStore,
    api_key: Option<String>,
    result: Option<OcrResult>,
    requests: [RequestState; 3],
    epoch: u64,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            store: ImageStore::new(config.store_mode),
            api_key: None,
            result: None,
            requests: Default::default(),
            epoch: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn images(&self) -> &[PendingImage] {
        self.store.images()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn result(&self) -> Option<&OcrResult> {
        self.result.as_ref()
    }

    /// Current Markdown document, empty when nothing has been recognized.
    pub fn markdown(&self) -> &str {
        match &self.result {
            Some(OcrResult::Markdown { markdown }) => markdown,
            _ => "",
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn request_state(&self, action: ActionKind) -> &RequestState {
        &self.requests[action.index()]
    }

    pub fn in_flight(&self, action: ActionKind) -> bool {
        *self.request_state(action) == RequestState::InFlight
    }

    fn busy_with(&self) -> Option<ActionKind> {
        ActionKind::ALL.into_iter().find(|action| self.in_flight(*action))
    }

    pub fn is_busy(&self) -> bool {
        self.busy_with().is_some()
    }

    pub fn phase(&self) -> Phase {
        match self.busy_with() {
            Some(ActionKind::Ocr) => Phase::Processing,
            Some(_) => Phase::Exporting,
            None if self.result.is_some() => Phase::ResultsReady,
            None if !self.store.is_empty() => Phase::ImageSelected,
            None => Phase::Empty,
        }
    }

    pub fn can_submit_ocr(&self) -> bool {
        !self.store.is_empty()
            && (!self.config.api_key_required || self.api_key.is_some())
            && !self.is_busy()
    }

    pub fn can_export(&self) -> bool {
        !self.is_busy() && self.export_content().is_some()
    }

    /// Whether the trigger for `action` should be enabled right now.
    pub fn trigger_enabled(&self, action: ActionKind) -> bool {
        match action {
            ActionKind::Ocr => self.can_submit_ocr(),
            ActionKind::ExportDocx | ActionKind::ExportPdf => self.can_export(),
        }
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.busy_with() {
            Some(action) => Err(SessionError::Busy(action)),
            None => Ok(()),
        }
    }

    /// Trims the key; a blank key counts as absent.
    pub fn set_api_key(&mut self, api_key: &str) {
        let trimmed = api_key.trim();
        self.api_key = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    /// Validates and stores a candidate. A rejected file leaves the session untouched.
    pub fn ingest(&mut self, candidate: CandidateFile) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let image = PendingImage::accept(candidate)?;
        self.select_image(image)
    }

    pub fn select_image(&mut self, image: PendingImage) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if self.config.store_mode == StoreMode::Single {
            self.result = None;
        }
        debug!(file_name = image.file_name(), size_bytes = image.size_bytes(), "image selected");
        self.store.add(image);
        Ok(())
    }

    /// Drops every pending image along with any result derived from them.
    pub fn remove_images(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.store.reset();
        self.result = None;
        Ok(())
    }

    /// Replaces the Markdown document. Blank text clears the results.
    pub fn edit_markdown(&mut self, markdown: &str) -> Result<(), SessionError> {
        if self.config.store_mode != StoreMode::Multi {
            return Err(SessionError::Unsupported("editing Markdown in keyed mode"));
        }
        self.ensure_idle()?;
        self.result = if markdown.trim().is_empty() {
            None
        } else {
            Some(OcrResult::Markdown {
                markdown: markdown.to_string(),
            })
        };
        Ok(())
    }

    pub fn start_ocr(&mut self) -> Result<OcrJob, SessionError> {
        self.ensure_idle()?;
        let image = self.store.latest().cloned().ok_or(ValidationError::NoImage)?;
        if self.config.api_key_required && self.api_key.is_none() {
            return Err(ValidationError::MissingApiKey.into());
        }

        if self.config.store_mode == StoreMode::Single {
            self.result = None;
        }
        self.requests[ActionKind::Ocr.index()] = RequestState::InFlight;

        Ok(OcrJob {
            ticket: self.ticket(ActionKind::Ocr),
            request: OcrRequest {
                image,
                api_key: self.api_key.clone(),
            },
        })
    }

    pub fn ocr_succeeded(&mut self, ticket: Ticket, result: OcrResult) -> Settlement {
        if !self.is_current(ticket) {
            return Settlement::Discarded;
        }
        self.result = Some(match (self.result.take(), result) {
            (
                Some(OcrResult::Markdown { markdown: existing }),
                OcrResult::Markdown { markdown },
            ) if !existing.trim().is_empty() => OcrResult::Markdown {
                markdown: format!("{existing}\n\n{markdown}"),
            },
            (_, result) => result,
        });
        self.requests[ticket.action.index()] = RequestState::Succeeded;
        Settlement::Applied
    }

    pub fn ocr_failed(&mut self, ticket: Ticket, reason: &str) -> Settlement {
        self.settle_failed(ticket, reason)
    }

    /// Content the next export would send, or `None` when there is nothing to export.
    pub fn export_content(&self) -> Option<ExportContent> {
        match self.result.as_ref()? {
            OcrResult::Translated(text) => {
                if text.original_text.trim().is_empty() && text.translated_text.trim().is_empty() {
                    return None;
                }
                Some(ExportContent::Translated {
                    original_text: text.original_text.clone(),
                    translated_text: text.translated_text.clone(),
                })
            }
            OcrResult::Markdown { markdown } => {
                if markdown.trim().is_empty() {
                    return None;
                }
                Some(ExportContent::Markdown {
                    markdown: markdown.clone(),
                    images: self.store.images().iter().map(|i| i.to_data_url()).collect(),
                })
            }
        }
    }

    pub fn start_export(&mut self, format: ExportFormat) -> Result<ExportJob, SessionError> {
        self.ensure_idle()?;
        let content = self.export_content().ok_or(ValidationError::NothingToExport)?;
        let action = ActionKind::export(format);
        self.requests[action.index()] = RequestState::InFlight;

        Ok(ExportJob {
            ticket: self.ticket(action),
            request: ExportRequest { format, content },
        })
    }

    /// Returns `true` when the export consumed the session.
    pub fn export_succeeded(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.requests[ticket.action.index()] = RequestState::Succeeded;
        if self.config.consume_on_export {
            self.store.reset();
            self.result = None;
            return true;
        }
        false
    }

    pub fn export_failed(&mut self, ticket: Ticket, reason: &str) -> Settlement {
        self.settle_failed(ticket, reason)
    }

    /// Back to the initial state. The API key survives; in-flight requests
    /// are orphaned and their settlements discarded.
    pub fn reset(&mut self) {
        self.store.reset();
        self.result = None;
        self.requests = Default::default();
        self.epoch += 1;
    }

    fn settle_failed(&mut self, ticket: Ticket, reason: &str) -> Settlement {
        if !self.is_current(ticket) {
            return Settlement::Discarded;
        }
        self.requests[ticket.action.index()] = RequestState::Failed(reason.to_string());
        Settlement::Applied
    }

    fn ticket(&self, action: ActionKind) -> Ticket {
        Ticket {
            epoch: self.epoch,
            action,
        }
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.epoch == self.epoch && self.in_flight(ticket.action)
    }
}
