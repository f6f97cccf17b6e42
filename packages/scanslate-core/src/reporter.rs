//! User-facing error notices. One notice is visible at a time; a newer report
//! replaces the current one and each notice expires after a fixed window.

use std::time::{Duration, Instant};

use crate::error::{RequestError, SessionError, ValidationError};
use crate::service::ExportFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidCredential,
    QuotaExceeded,
    Network,
    UnsupportedFile,
    Generic,
}

/// Buckets a raw failure message by the phrases services put in them.
pub fn categorize(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();

    if contains_any(&lower, &["api key", "api_key", "credential"]) {
        ErrorCategory::InvalidCredential
    } else if contains_any(&lower, &["quota", "limit"]) {
        ErrorCategory::QuotaExceeded
    } else if contains_any(&lower, &["network", "fetch", "connect", "timed out"]) {
        ErrorCategory::Network
    } else if contains_any(&lower, &["invalid file type", "unsupported"]) {
        ErrorCategory::UnsupportedFile
    } else {
        ErrorCategory::Generic
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub category: ErrorCategory,
    pub message: String,
}

impl Notice {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub fn from_validation(error: &ValidationError) -> Self {
        let category = match error {
            ValidationError::UnsupportedType { .. } => ErrorCategory::UnsupportedFile,
            ValidationError::MissingApiKey => ErrorCategory::InvalidCredential,
            _ => ErrorCategory::Generic,
        };
        Self::new(category, capitalize(&error.to_string()))
    }

    pub fn from_request(error: &RequestError) -> Self {
        match error {
            RequestError::Network(_) | RequestError::TimedOut => Self::new(
                ErrorCategory::Network,
                "Network error. Check your connection and try again.",
            ),
            RequestError::Application(message) => {
                let category = categorize(message);
                let text = match category {
                    ErrorCategory::InvalidCredential => {
                        "Invalid API key. Check the key and try again.".to_string()
                    }
                    ErrorCategory::QuotaExceeded => {
                        "API quota exceeded. Try again later.".to_string()
                    }
                    ErrorCategory::Network => {
                        "Network error. Check your connection and try again.".to_string()
                    }
                    ErrorCategory::UnsupportedFile => {
                        "Unsupported file format. Only JPG, JPEG and PNG are accepted.".to_string()
                    }
                    ErrorCategory::Generic if message.trim().is_empty() => {
                        "Something went wrong. Please try again.".to_string()
                    }
                    ErrorCategory::Generic => message.clone(),
                };
                Self::new(category, text)
            }
            RequestError::MalformedResponse(_) | RequestError::InvalidRequest(_) => {
                Self::new(ErrorCategory::Generic, capitalize(&error.to_string()))
            }
        }
    }

    /// Notice for a failed session action, `None` for rejections the user
    /// cannot trigger through an enabled control.
    pub fn from_session(error: &SessionError) -> Option<Self> {
        match error {
            SessionError::Validation(error) => Some(Self::from_validation(error)),
            SessionError::Request(error) => Some(Self::from_request(error)),
            SessionError::Delivery(error) => Some(Self::new(
                ErrorCategory::Generic,
                format!("Could not save the file: {error}"),
            )),
            SessionError::Busy(_) | SessionError::Unsupported(_) => None,
        }
    }

    pub fn for_export(format: ExportFormat, error: &SessionError) -> Option<Self> {
        Self::from_session(error).map(|notice| Self {
            message: format!("Export {format} failed: {}", notice.message),
            ..notice
        })
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug)]
struct Shown {
    notice: Notice,
    generation: u64,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct ErrorReporter {
    window: Duration,
    shown: Option<Shown>,
    generation: u64,
}

impl ErrorReporter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            shown: None,
            generation: 0,
        }
    }

    /// Shows `notice`, replacing whatever was visible. Returns its generation.
    pub fn report(&mut self, notice: Notice, now: Instant) -> u64 {
        self.generation += 1;
        self.shown = Some(Shown {
            notice,
            generation: self.generation,
            expires_at: now + self.window,
        });
        self.generation
    }

    pub fn current(&self) -> Option<&Notice> {
        self.shown.as_ref().map(|shown| &shown.notice)
    }

    /// Returns `true` if a notice was visible.
    pub fn clear(&mut self) -> bool {
        self.shown.take().is_some()
    }

    /// Clears the notice if its window has passed.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.shown {
            Some(shown) if now >= shown.expires_at => self.clear(),
            _ => false,
        }
    }

    /// Clears the notice only if it is still the one from `generation`.
    pub fn dismiss(&mut self, generation: u64) -> bool {
        match &self.shown {
            Some(shown) if shown.generation == generation => self.clear(),
            _ => false,
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ERROR_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("invalid API key"), ErrorCategory::InvalidCredential);
        assert_eq!(categorize("API key is required"), ErrorCategory::InvalidCredential);
        assert_eq!(categorize("API quota exceeded"), ErrorCategory::QuotaExceeded);
        assert_eq!(categorize("rate limit reached"), ErrorCategory::QuotaExceeded);
        assert_eq!(categorize("Failed to fetch"), ErrorCategory::Network);
        assert_eq!(
            categorize("Invalid file type. Only PNG, JPG, JPEG allowed"),
            ErrorCategory::UnsupportedFile
        );
        assert_eq!(categorize("Processing error: boom"), ErrorCategory::Generic);
    }

    #[test]
    fn test_request_notice_messages() {
        let notice = Notice::from_request(&RequestError::Application("invalid API key".into()));
        assert_eq!(notice.category, ErrorCategory::InvalidCredential);

        let notice = Notice::from_request(&RequestError::TimedOut);
        assert_eq!(notice.category, ErrorCategory::Network);

        let notice = Notice::from_request(&RequestError::Application("Processing error: boom".into()));
        assert_eq!(notice.message, "Processing error: boom");
    }

    #[test]
    fn test_export_notice_is_prefixed() {
        let error = SessionError::Validation(ValidationError::NothingToExport);
        let notice = Notice::for_export(ExportFormat::Pdf, &error).unwrap();
        assert!(notice.message.starts_with("Export PDF failed: Nothing to export"));
        assert!(Notice::for_export(ExportFormat::Pdf, &SessionError::Busy(crate::session::ActionKind::Ocr)).is_none());
    }

    #[test]
    fn test_notice_expires_after_window() {
        let start = Instant::now();
        let mut reporter = ErrorReporter::new(Duration::from_secs(5));
        reporter.report(Notice::new(ErrorCategory::Generic, "oops"), start);

        assert!(!reporter.expire(start + Duration::from_secs(4)));
        assert!(reporter.current().is_some());
        assert!(reporter.expire(start + Duration::from_secs(5)));
        assert!(reporter.current().is_none());
    }

    #[test]
    fn test_newer_report_supersedes_older_timer() {
        let start = Instant::now();
        let mut reporter = ErrorReporter::new(Duration::from_secs(5));
        let first = reporter.report(Notice::new(ErrorCategory::Generic, "first"), start);
        reporter.report(
            Notice::new(ErrorCategory::Network, "second"),
            start + Duration::from_secs(3),
        );

        assert!(!reporter.dismiss(first));
        assert!(!reporter.expire(start + Duration::from_secs(6)));
        assert_eq!(reporter.current().unwrap().message, "second");
        assert!(reporter.expire(start + Duration::from_secs(8)));
    }
}
