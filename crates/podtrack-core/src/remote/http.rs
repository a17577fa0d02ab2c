//! REST client for the fleet back office.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{
    multipart::{Form, Part},
    Client, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};

use super::{PodAuthority, StatusUpdate, TransitionResponse, UploadResponse};
use crate::{
    error::{PodError, Result},
    models::{ClientPodRecord, UploadFile},
};

/// Default per-request timeout of the underlying HTTP client.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// `{success, message, data}` envelope used by read endpoints.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

/// Response of the single-file upload endpoint.
#[derive(Debug, Deserialize)]
struct StoredFile {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    url: Option<String>,
}

fn default_success() -> bool {
    true
}

/// A response body carrying a `success` verdict.
trait Envelope {
    /// Marks the answer as refused; called for every non-2xx status.
    fn refuse(&mut self, status: StatusCode);
}

fn refusal_message(message: &mut Option<String>, status: StatusCode) {
    message.get_or_insert_with(|| format!("HTTP {}", status.as_u16()));
}

impl<T> Envelope for DataEnvelope<T> {
    fn refuse(&mut self, status: StatusCode) {
        self.success = false;
        refusal_message(&mut self.message, status);
    }
}

impl Envelope for StoredFile {
    fn refuse(&mut self, status: StatusCode) {
        self.success = false;
        refusal_message(&mut self.message, status);
    }
}

impl Envelope for TransitionResponse {
    fn refuse(&mut self, status: StatusCode) {
        self.success = false;
        self.version = None;
        refusal_message(&mut self.message, status);
    }
}

impl Envelope for UploadResponse {
    fn refuse(&mut self, status: StatusCode) {
        self.success = false;
        self.document = None;
        refusal_message(&mut self.message, status);
    }
}

/// Builder for [`HttpAuthority`].
#[derive(Debug, Clone)]
pub struct HttpAuthorityBuilder {
    base_url: String,
    timeout: Duration,
    token: Option<String>,
}

impl HttpAuthorityBuilder {
    /// Sets the HTTP client timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the bearer token sent with every request.
    pub fn with_token(mut self, token: Option<impl Into<String>>) -> Self {
        self.token = token.map(Into::into);
        self
    }

    /// Builds the authority.
    ///
    /// # Errors
    ///
    /// Returns `PodError::Configuration` if the base URL is empty or the
    /// HTTP client cannot be created.
    pub fn build(self) -> Result<HttpAuthority> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(PodError::Configuration {
                message: "API base URL cannot be empty".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| PodError::Configuration {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(HttpAuthority {
            client,
            base_url,
            token: self.token,
        })
    }
}

/// [`PodAuthority`] backed by the REST API.
#[derive(Debug, Clone)]
pub struct HttpAuthority {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpAuthority {
    pub fn builder(base_url: impl Into<String>) -> HttpAuthorityBuilder {
        HttpAuthorityBuilder {
            base_url: base_url.into(),
            timeout: DEFAULT_HTTP_TIMEOUT,
            token: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn file_part(file: &UploadFile) -> Result<Part> {
        let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        match &file.content_type {
            Some(mime) => part.mime_str(mime).map_err(PodError::transport),
            None => Ok(part),
        }
    }
}

/// Decodes a JSON envelope regardless of HTTP status.
///
/// Error statuses with a readable envelope are the server's answer and are
/// returned as a refusal, whatever the body's `success` says; error statuses
/// without one are transport failures.
async fn read_envelope<T: DeserializeOwned + Envelope>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<T>(&body) {
        Ok(mut envelope) => {
            if !status.is_success() {
                envelope.refuse(status);
            }
            Ok(envelope)
        }
        Err(_) if !status.is_success() => Err(PodError::TransportFailure {
            message: format!("HTTP {}: {}", status.as_u16(), body.trim()),
        }),
        Err(e) => Err(PodError::transport(format!("Malformed response: {e}"))),
    }
}

#[async_trait]
impl PodAuthority for HttpAuthority {
    async fn fetch_client_pod(&self, trip_id: &str, client_id: &str) -> Result<ClientPodRecord> {
        let url = self.url(&format!("/trips/{trip_id}/client/{client_id}/pod"));
        debug!("GET {url}");

        let response = self.authorize(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PodError::ClientPodNotFound {
                trip_id: trip_id.to_string(),
                client_id: client_id.to_string(),
            });
        }

        let envelope: DataEnvelope<ClientPodRecord> = read_envelope(response).await?;
        match envelope {
            DataEnvelope {
                success: true,
                data: Some(record),
                ..
            } => Ok(record),
            DataEnvelope { message, .. } => Err(PodError::transport(
                message.unwrap_or_else(|| "Server returned no POD record".to_string()),
            )),
        }
    }

    async fn update_status(
        &self,
        trip_id: &str,
        client_id: &str,
        update: &StatusUpdate,
    ) -> Result<TransitionResponse> {
        let url = self.url(&format!("/trips/client-pod-status/{trip_id}/{client_id}"));
        debug!("PUT {url} status={}", update.status);

        let response = self
            .authorize(self.client.put(&url))
            .json(update)
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn upload_document(
        &self,
        trip_id: &str,
        client_id: &str,
        step_key: &str,
        file: &UploadFile,
    ) -> Result<UploadResponse> {
        let url = self.url(&format!("/trips/{trip_id}/client/podDocument"));
        debug!("POST {url} step={step_key} file={}", file.file_name);

        let form = Form::new()
            .part("file", Self::file_part(file)?)
            .text("stepKey", step_key.to_string())
            .text("clientId", client_id.to_string());

        let response = self
            .authorize(self.client.post(&url))
            .multipart(form)
            .send()
            .await?;
        let upload: UploadResponse = read_envelope(response).await?;

        if upload.success && upload.document.is_none() {
            return Err(PodError::transport("Upload succeeded but no document was returned"));
        }
        Ok(upload)
    }

    async fn upload_file(&self, file: &UploadFile) -> Result<String> {
        let url = self.url("/uploads");
        debug!("POST {url} file={}", file.file_name);

        let form = Form::new().part("file", Self::file_part(file)?);
        let response = self
            .authorize(self.client.post(&url))
            .multipart(form)
            .send()
            .await?;
        let stored: StoredFile = read_envelope(response).await?;

        match stored {
            StoredFile {
                success: true,
                url: Some(url),
                ..
            } => Ok(url),
            StoredFile {
                success: true,
                url: None,
                ..
            } => Err(PodError::transport("Upload succeeded but no URL was returned")),
            StoredFile { message, .. } => Err(PodError::UploadRejected {
                message: message.unwrap_or_else(|| "Upload refused".to_string()),
            }),
        }
    }
}
