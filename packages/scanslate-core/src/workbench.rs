//! The orchestration core: owns the session and error reporter, talks to the
//! service and keeps the presentation sink in step after every mutation.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::image::CandidateFile;
use crate::reporter::{ErrorReporter, Notice};
use crate::service::{ExportFormat, ExportOutcome, OcrService};
use crate::session::{ActionKind, Session, Settlement};
use crate::sink::PresentationSink;

pub struct Workbench<S, P> {
    session: Session,
    reporter: ErrorReporter,
    service: S,
    sink: P,
}

impl<S: OcrService, P: PresentationSink> Workbench<S, P> {
    pub fn new(config: &ClientConfig, service: S, sink: P) -> Self {
        let mut workbench = Self {
            session: Session::new(config.session_config()),
            reporter: ErrorReporter::new(config.error_window),
            service,
            sink,
        };
        workbench.refresh_triggers();
        workbench
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut P {
        &mut self.sink
    }

    pub fn into_sink(self) -> P {
        self.sink
    }

    pub fn set_api_key(&mut self, api_key: &str) {
        self.session.set_api_key(api_key);
        self.refresh_triggers();
    }

    /// Single entry point for files from a picker, a drop or a paste.
    pub fn ingest_file(&mut self, candidate: CandidateFile) -> Result<(), SessionError> {
        self.clear_error();
        let file_name = candidate.file_name.clone();
        match self.session.ingest(candidate) {
            Ok(()) => {
                info!(%file_name, images = self.session.images().len(), "image ready");
                self.sink.show_gallery(self.session.images());
                if self.session.result().is_none() {
                    self.sink.clear_result();
                }
                self.refresh_triggers();
                Ok(())
            }
            Err(error) => {
                warn!(%file_name, %error, "image rejected");
                self.report(Notice::from_session(&error));
                Err(error)
            }
        }
    }

    pub fn remove_images(&mut self) -> Result<(), SessionError> {
        self.clear_error();
        self.session.remove_images()?;
        self.sink.show_gallery(self.session.images());
        self.sink.clear_result();
        self.refresh_triggers();
        Ok(())
    }

    pub fn edit_markdown(&mut self, markdown: &str) -> Result<(), SessionError> {
        self.clear_error();
        self.session.edit_markdown(markdown)?;
        match self.session.result() {
            Some(result) => self.sink.show_result(result),
            None => self.sink.clear_result(),
        }
        self.refresh_triggers();
        Ok(())
    }

    pub async fn run_ocr(&mut self) -> Result<(), SessionError> {
        self.clear_error();
        let job = match self.session.start_ocr() {
            Ok(job) => job,
            Err(error) => {
                self.report(Notice::from_session(&error));
                return Err(error);
            }
        };
        self.refresh_triggers();
        if self.session.result().is_none() {
            self.sink.clear_result();
        }

        info!(file_name = job.request.image.file_name(), "running OCR");
        let outcome = self.service.recognize(&job.request).await;

        let result = match outcome {
            Ok(result) => {
                if self.session.ocr_succeeded(job.ticket, result) == Settlement::Applied {
                    if let Some(result) = self.session.result() {
                        self.sink.show_result(result);
                    }
                } else {
                    debug!("discarding OCR result for a reset session");
                }
                Ok(())
            }
            Err(error) => {
                warn!(%error, "OCR failed");
                if self.session.ocr_failed(job.ticket, &error.to_string()) == Settlement::Applied {
                    if let Some(result) = self.session.result() {
                        self.sink.show_result(result);
                    }
                    self.report(Some(Notice::from_request(&error)));
                }
                Err(error.into())
            }
        };

        self.refresh_triggers();
        result
    }

    pub async fn export(&mut self, format: ExportFormat) -> Result<(), SessionError> {
        self.clear_error();
        let job = match self.session.start_export(format) {
            Ok(job) => job,
            Err(error) => {
                self.report(Notice::for_export(format, &error));
                return Err(error);
            }
        };
        self.refresh_triggers();

        info!(%format, "exporting");
        let delivered = match self.service.export(&job.request).await {
            Ok(ExportOutcome::File(file)) => self.sink.deliver_file(&file).map_err(SessionError::from),
            Ok(ExportOutcome::DownloadUrl(url)) => match self.service.download(&url).await {
                Ok(file) => self.sink.deliver_file(&file).map_err(SessionError::from),
                Err(error) => Err(error.into()),
            },
            Err(error) => Err(error.into()),
        };

        let result = match delivered {
            Ok(()) => {
                if self.session.export_succeeded(job.ticket) {
                    info!("export consumed the session");
                    self.sink.show_gallery(self.session.images());
                    self.sink.clear_result();
                }
                Ok(())
            }
            Err(error) => {
                warn!(%format, %error, "export failed");
                if self.session.export_failed(job.ticket, &error.to_string()) == Settlement::Applied {
                    self.report(Notice::for_export(format, &error));
                }
                Err(error)
            }
        };

        self.refresh_triggers();
        result
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.clear_error();
        self.sink.show_gallery(self.session.images());
        self.sink.clear_result();
        self.refresh_triggers();
    }

    /// Expires the visible notice once its window has passed.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        if self.reporter.expire(now) {
            self.sink.clear_error();
        }
    }

    pub fn report_at(&mut self, notice: Notice, now: Instant) -> u64 {
        self.sink.show_error(&notice);
        self.reporter.report(notice, now)
    }

    fn report(&mut self, notice: Option<Notice>) {
        if let Some(notice) = notice {
            self.report_at(notice, Instant::now());
        }
    }

    fn clear_error(&mut self) {
        if self.reporter.clear() {
            self.sink.clear_error();
        }
    }

    fn refresh_triggers(&mut self) {
        for action in ActionKind::ALL {
            self.sink
                .set_trigger_enabled(action, self.session.trigger_enabled(action));
        }
    }
}
