//! [`OcrService`] over HTTP with `reqwest`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{multipart, Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::{ClientConfig, ExportContract, ServiceMode};
use crate::error::RequestError;
use crate::service::{
    DownloadedFile, ExportContent, ExportOutcome, ExportRequest, OcrRequest, OcrResult, OcrService,
    TranslatedText,
};

const KEYED_OCR_PATH: &str = "api/ocr/process";
const KEYED_EXPORT_PATH: &str = "api/ocr/download";
const MARKDOWN_OCR_PATH: &str = "ocr";

#[derive(Debug, Serialize)]
struct DataUrlPayload {
    #[serde(rename = "dataURL")]
    data_url: String,
}

#[derive(Debug, Deserialize)]
struct MarkdownResponse {
    markdown: String,
}

#[derive(Debug, Clone)]
pub struct HttpOcrService {
    client: Client,
    base_url: Url,
    mode: ServiceMode,
    contract: ExportContract,
}

impl HttpOcrService {
    pub fn new(config: &ClientConfig) -> Result<Self, RequestError> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| {
            RequestError::InvalidRequest(format!("invalid base URL '{}': {e}", config.base_url))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            RequestError::InvalidRequest(format!("failed to create HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            base_url,
            mode: config.mode,
            contract: config.export_contract,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RequestError> {
        self.base_url
            .join(path)
            .map_err(|e| RequestError::InvalidRequest(format!("invalid endpoint '{path}': {e}")))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RequestError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "request did not complete");
            RequestError::from(e)
        })?;
        debug!(status = %response.status(), url = %response.url(), "response received");
        Ok(response)
    }
}

/// Body as a JSON object, if it is one.
fn json_object(bytes: &[u8]) -> Option<Value> {
    serde_json::from_slice::<Value>(bytes)
        .ok()
        .filter(Value::is_object)
}

fn error_field(body: Option<&Value>) -> Option<String> {
    let error = body?.get("error")?;
    match error {
        Value::String(message) => Some(message.clone()),
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: reqwest::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn disposition_file_name(value: &str) -> Option<String> {
    value
        .split(';')
        .filter_map(|part| part.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("filename"))
        .map(|(_, name)| sanitize_file_name(name.trim().trim_matches('"')))
        .filter(|name| !name.is_empty())
}

/// Keeps only the final path component.
fn sanitize_file_name(name: &str) -> String {
    name.rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim_start_matches('.')
        .to_string()
}

#[async_trait]
impl OcrService for HttpOcrService {
    async fn recognize(&self, request: &OcrRequest) -> Result<OcrResult, RequestError> {
        let image = &request.image;
        let builder = match self.mode {
            ServiceMode::Keyed => {
                let part = multipart::Part::bytes(image.bytes().to_vec())
                    .file_name(image.file_name().to_string())
                    .mime_str(image.media_type())?;
                let form = multipart::Form::new()
                    .part("image", part)
                    .text("api_key", request.api_key.clone().unwrap_or_default());
                self.client.post(self.endpoint(KEYED_OCR_PATH)?).multipart(form)
            }
            ServiceMode::Markdown => {
                self.client
                    .post(self.endpoint(MARKDOWN_OCR_PATH)?)
                    .json(&DataUrlPayload {
                        data_url: image.to_data_url(),
                    })
            }
        };

        debug!(
            file_name = image.file_name(),
            size_bytes = image.size_bytes(),
            mode = ?self.mode,
            "sending OCR request"
        );
        let response = self.send(builder).await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = json_object(&bytes);

        if let Some(message) = error_field(body.as_ref()) {
            return Err(RequestError::Application(message));
        }
        if !status.is_success() {
            return Err(RequestError::Application(format!(
                "request failed with status {status}"
            )));
        }
        let body = body.ok_or_else(|| {
            RequestError::MalformedResponse("OCR response is not a JSON object".to_string())
        })?;

        match self.mode {
            ServiceMode::Keyed => serde_json::from_value::<TranslatedText>(body)
                .map(OcrResult::Translated)
                .map_err(|e| RequestError::MalformedResponse(e.to_string())),
            ServiceMode::Markdown => serde_json::from_value::<MarkdownResponse>(body)
                .map(|response| OcrResult::Markdown {
                    markdown: response.markdown,
                })
                .map_err(|e| RequestError::MalformedResponse(e.to_string())),
        }
    }

    async fn export(&self, request: &ExportRequest) -> Result<ExportOutcome, RequestError> {
        let format = request.format;
        let url = match self.mode {
            ServiceMode::Keyed => {
                self.endpoint(&format!("{KEYED_EXPORT_PATH}/{}", format.extension()))?
            }
            ServiceMode::Markdown => self.endpoint(&format!("to_{}", format.extension()))?,
        };
        let payload = match &request.content {
            ExportContent::Translated {
                original_text,
                translated_text,
            } => json!({
                "original_text": original_text,
                "translated_text": translated_text,
            }),
            ExportContent::Markdown { markdown, images } => json!({
                "markdown": markdown,
                "images": images,
            }),
        };

        debug!(%format, contract = ?self.contract, "sending export request");
        let response = self.send(self.client.post(url).json(&payload)).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        let body = json_object(&bytes);

        if let Some(message) = error_field(body.as_ref()) {
            return Err(RequestError::Application(message));
        }

        match self.contract {
            ExportContract::BinaryStream => {
                if !status.is_success() || body.is_some() || bytes.is_empty() {
                    return Err(RequestError::MalformedResponse(format!(
                        "export answered {status} without a file or an error"
                    )));
                }
                let file_name = header_str(&headers, CONTENT_DISPOSITION)
                    .and_then(disposition_file_name)
                    .unwrap_or_else(|| format!("ocr_result.{}", format.extension()));
                let media_type = header_str(&headers, CONTENT_TYPE)
                    .unwrap_or(format.media_type())
                    .to_string();
                Ok(ExportOutcome::File(DownloadedFile {
                    file_name,
                    media_type,
                    bytes: bytes.to_vec(),
                }))
            }
            ExportContract::DownloadUrl => {
                let download_url = body
                    .as_ref()
                    .and_then(|body| body.get("download_url"))
                    .and_then(Value::as_str)
                    .filter(|_| status.is_success())
                    .ok_or_else(|| {
                        RequestError::MalformedResponse(format!(
                            "export answered {status} without a download URL or an error"
                        ))
                    })?;
                let resolved = self.base_url.join(download_url).map_err(|e| {
                    RequestError::InvalidRequest(format!(
                        "invalid download URL '{download_url}': {e}"
                    ))
                })?;
                Ok(ExportOutcome::DownloadUrl(resolved.to_string()))
            }
        }
    }

    async fn download(&self, url: &str) -> Result<DownloadedFile, RequestError> {
        let url = Url::parse(url)
            .map_err(|e| RequestError::InvalidRequest(format!("invalid download URL '{url}': {e}")))?;
        debug!(%url, "downloading exported file");

        let response = self.send(self.client.get(url.clone())).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = error_field(json_object(&bytes).as_ref())
                .unwrap_or_else(|| format!("download failed with status {status}"));
            return Err(RequestError::Application(message));
        }

        let file_name = header_str(&headers, CONTENT_DISPOSITION)
            .and_then(disposition_file_name)
            .or_else(|| {
                url.path_segments()
                    .and_then(|mut segments| segments.next_back())
                    .map(sanitize_file_name)
                    .filter(|name| !name.is_empty())
            })
            .unwrap_or_else(|| "download".to_string());
        let media_type = header_str(&headers, CONTENT_TYPE)
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(DownloadedFile {
            file_name,
            media_type,
            bytes: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use wiremock::{
        matchers::{body_json, body_string_contains, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use crate::image::{CandidateFile, PendingImage};
    use crate::service::ExportFormat;

    fn service(server: &MockServer, mode: ServiceMode) -> HttpOcrService {
        let config = ClientConfig::for_mode(mode).with_base_url(server.uri());
        HttpOcrService::new(&config).unwrap()
    }

    fn request(api_key: Option<&str>) -> OcrRequest {
        OcrRequest {
            image: PendingImage::accept(CandidateFile::new("page.png", "image/png", b"abc".to_vec()))
                .unwrap(),
            api_key: api_key.map(str::to_string),
        }
    }

    fn markdown_export(format: ExportFormat) -> ExportRequest {
        ExportRequest {
            format,
            content: ExportContent::Markdown {
                markdown: "# Title".to_string(),
                images: vec!["data:image/png;base64,YWJj".to_string()],
            },
        }
    }

    #[tokio::test]
    async fn test_keyed_recognize_parses_translation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ocr/process"))
            .and(body_string_contains("name=\"api_key\""))
            .and(body_string_contains("secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "original_text": "Hello",
                "translated_text": "Xin chào",
                "original_length": 5,
                "translated_length": 9
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = service(&server, ServiceMode::Keyed)
            .recognize(&request(Some("secret")))
            .await
            .unwrap();

        assert_eq!(
            result,
            OcrResult::Translated(TranslatedText {
                original_text: "Hello".to_string(),
                translated_text: "Xin chào".to_string(),
                original_length: 5,
                translated_length: 9,
            })
        );
    }

    #[tokio::test]
    async fn test_error_field_becomes_application_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ocr/process"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({ "error": "invalid API key" })),
            )
            .mount(&server)
            .await;

        let err = service(&server, ServiceMode::Keyed)
            .recognize(&request(Some("bad")))
            .await
            .unwrap_err();
        assert_eq!(err, RequestError::Application("invalid API key".to_string()));
    }

    #[tokio::test]
    async fn test_failure_without_error_field_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ocr/process"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = service(&server, ServiceMode::Keyed)
            .recognize(&request(Some("key")))
            .await
            .unwrap_err();
        match err {
            RequestError::Application(message) => assert!(message.contains("502")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_markdown_recognize_sends_data_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ocr"))
            .and(body_json(serde_json::json!({
                "dataURL": "data:image/png;base64,YWJj"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "markdown": "$x^2$" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = service(&server, ServiceMode::Markdown)
            .recognize(&request(None))
            .await
            .unwrap();
        assert_eq!(
            result,
            OcrResult::Markdown {
                markdown: "$x^2$".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_success_status_with_error_field_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ocr"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "model busy" })),
            )
            .mount(&server)
            .await;

        let err = service(&server, ServiceMode::Markdown)
            .recognize(&request(None))
            .await
            .unwrap_err();
        assert_eq!(err, RequestError::Application("model busy".to_string()));
    }

    #[tokio::test]
    async fn test_unexpected_success_shape_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ocr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": "hi" })))
            .mount(&server)
            .await;

        let err = service(&server, ServiceMode::Markdown)
            .recognize(&request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_binary_export_returns_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ocr/download/docx"))
            .and(body_json(serde_json::json!({
                "original_text": "Hello",
                "translated_text": "Xin chào"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-disposition", "attachment; filename=ket_qua_ocr_dich.docx")
                    .set_body_raw(b"PK\x03\x04docx".to_vec(), ExportFormat::Docx.media_type()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = service(&server, ServiceMode::Keyed)
            .export(&ExportRequest {
                format: ExportFormat::Docx,
                content: ExportContent::Translated {
                    original_text: "Hello".to_string(),
                    translated_text: "Xin chào".to_string(),
                },
            })
            .await
            .unwrap();

        match outcome {
            ExportOutcome::File(file) => {
                assert_eq!(file.file_name, "ket_qua_ocr_dich.docx");
                assert_eq!(file.bytes, b"PK\x03\x04docx".to_vec());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_binary_export_without_file_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ocr/download/pdf"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = service(&server, ServiceMode::Keyed)
            .export(&ExportRequest {
                format: ExportFormat::Pdf,
                content: ExportContent::Translated {
                    original_text: "a".to_string(),
                    translated_text: "b".to_string(),
                },
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_download_url_export_is_resolved_against_base() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/to_pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "download_url": "/files/out.pdf" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = service(&server, ServiceMode::Markdown)
            .export(&markdown_export(ExportFormat::Pdf))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ExportOutcome::DownloadUrl(format!("{}/files/out.pdf", server.uri()))
        );
    }

    #[tokio::test]
    async fn test_download_url_export_without_url_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/to_docx"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = service(&server, ServiceMode::Markdown)
            .export(&markdown_export(ExportFormat::Docx))
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_download_names_file_from_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/out.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
            .mount(&server)
            .await;

        let file = service(&server, ServiceMode::Markdown)
            .download(&format!("{}/files/out.pdf", server.uri()))
            .await
            .unwrap();
        assert_eq!(file.file_name, "out.pdf");
        assert_eq!(file.media_type, "application/pdf");
        assert_eq!(file.bytes, b"%PDF-1.4".to_vec());
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ocr"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "markdown": "late" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let mut config = ClientConfig::for_mode(ServiceMode::Markdown).with_base_url(server.uri());
        config.timeout = Some(Duration::from_millis(100));
        let err = HttpOcrService::new(&config)
            .unwrap()
            .recognize(&request(None))
            .await
            .unwrap_err();
        assert_eq!(err, RequestError::TimedOut);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let config = ClientConfig::for_mode(ServiceMode::Markdown).with_base_url("http://127.0.0.1:9");
        let err = HttpOcrService::new(&config)
            .unwrap()
            .recognize(&request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Network(_)));
    }

    #[test]
    fn test_disposition_file_name() {
        assert_eq!(
            disposition_file_name("attachment; filename=\"report.pdf\"").as_deref(),
            Some("report.pdf")
        );
        assert_eq!(
            disposition_file_name("attachment; filename=../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(disposition_file_name("inline"), None);
    }
}
