use std::time::Duration;

use crate::session::SessionConfig;
use crate::store::StoreMode;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_ERROR_WINDOW: Duration = Duration::from_secs(5);

/// Which endpoint family the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// Multipart upload with an API key; answers with original and translated text.
    Keyed,
    /// JSON data-URL upload; answers with Markdown.
    Markdown,
}

/// How the service hands back an exported document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportContract {
    /// The response body is the document.
    BinaryStream,
    /// The response is JSON carrying a `download_url` to fetch.
    DownloadUrl,
}

impl ServiceMode {
    pub fn default_contract(self) -> ExportContract {
        match self {
            ServiceMode::Keyed => ExportContract::BinaryStream,
            ServiceMode::Markdown => ExportContract::DownloadUrl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub mode: ServiceMode,
    pub export_contract: ExportContract,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    pub error_window: Duration,
    /// Clear images and results after a successful export.
    pub consume_on_export: bool,
}

impl ClientConfig {
    pub fn for_mode(mode: ServiceMode) -> Self {
        let export_contract = mode.default_contract();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            mode,
            export_contract,
            timeout: Some(DEFAULT_TIMEOUT),
            error_window: DEFAULT_ERROR_WINDOW,
            consume_on_export: export_contract == ExportContract::DownloadUrl,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Switches the export contract; the consume policy follows it.
    pub fn with_export_contract(mut self, contract: ExportContract) -> Self {
        self.export_contract = contract;
        self.consume_on_export = contract == ExportContract::DownloadUrl;
        self
    }

    pub fn session_config(&self) -> SessionConfig {
        match self.mode {
            ServiceMode::Keyed => SessionConfig {
                store_mode: StoreMode::Single,
                api_key_required: true,
                consume_on_export: self.consume_on_export,
            },
            ServiceMode::Markdown => SessionConfig {
                store_mode: StoreMode::Multi,
                api_key_required: false,
                consume_on_export: self.consume_on_export,
            },
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_mode(ServiceMode::Keyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults() {
        let keyed = ClientConfig::default();
        assert_eq!(keyed.export_contract, ExportContract::BinaryStream);
        assert!(!keyed.consume_on_export);
        assert!(keyed.session_config().api_key_required);

        let markdown = ClientConfig::for_mode(ServiceMode::Markdown);
        assert_eq!(markdown.export_contract, ExportContract::DownloadUrl);
        assert!(markdown.consume_on_export);
        assert_eq!(markdown.session_config().store_mode, StoreMode::Multi);
    }

    #[test]
    fn test_contract_override_moves_consume_policy() {
        let config =
            ClientConfig::for_mode(ServiceMode::Markdown).with_export_contract(ExportContract::BinaryStream);
        assert!(!config.consume_on_export);
        assert!(!config.session_config().consume_on_export);
    }
}
