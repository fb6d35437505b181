//! reqwest-based client for the analysis service

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use super::JobService;
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::types::{
    Document, JobId, JobStatusReport, StatusResponse, SubmitOptions, SubmitResponse, SubmittedJob,
};

const SUBMIT_PATH: &str = "iniciar_analise";
const STATUS_PATH: &str = "status";
/// Suffix stripped from the base URL to reach the file origin
const API_PREFIX: &str = "/api";

/// HTTP client for the analysis service
#[derive(Clone)]
pub struct HttpJobClient {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpJobClient {
    /// Create a client from service configuration
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            Error::config(format!("Invalid service URL '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "Service URL '{}' cannot be used as a base",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL under the base, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::transport(operation, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(
                operation,
                format!("HTTP {} - {}", status, body),
            ));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| Error::transport(operation, format!("failed to parse response: {}", e)))
    }

    /// Resolve a `download_url` from a status reply into a fetchable URL
    ///
    /// Absolute references are returned unchanged. Relative ones are joined
    /// onto the service origin with the `/api` prefix removed.
    pub fn resolve_download_url(&self, reference: &str) -> Result<Url> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(Error::invalid_reference(reference, "empty reference"));
        }

        if let Ok(url) = Url::parse(reference) {
            return match url.scheme() {
                "http" | "https" => Ok(url),
                other => Err(Error::invalid_reference(
                    reference,
                    format!("unsupported scheme '{}'", other),
                )),
            };
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        let origin = base.strip_suffix(API_PREFIX).unwrap_or(base);
        let joined = if reference.starts_with('/') {
            format!("{}{}", origin, reference)
        } else {
            format!("{}/{}", origin, reference)
        };

        Url::parse(&joined).map_err(|e| Error::invalid_reference(reference, e.to_string()))
    }

    /// Download the generated artifact behind a `download_url`
    pub async fn download_artifact(&self, reference: &str) -> Result<Bytes> {
        let url = self.resolve_download_url(reference)?;
        tracing::info!("Downloading artifact from {}", url);

        let bytes = self
            .send("download_artifact", self.client.get(url))
            .await?
            .bytes()
            .await
            .map_err(|e| Error::transport("download_artifact", format!("failed to read body: {}", e)))?;

        tracing::debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes)
    }
}

#[async_trait]
impl JobService for HttpJobClient {
    async fn submit_job(&self, document: &Document, options: SubmitOptions) -> Result<SubmittedJob> {
        let part = multipart::Part::bytes(document.data.to_vec())
            .file_name(document.filename.clone())
            .mime_str(&document.content_type)
            .map_err(|e| Error::transport("submit_job", format!("invalid content type: {}", e)))?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("use_rag", options.use_reference_manual.to_string());

        tracing::info!(
            "Submitting {} ({} bytes) for analysis",
            document.filename,
            document.len()
        );

        let url = self.endpoint(&[SUBMIT_PATH]);
        let response: SubmitResponse = self
            .send_json("submit_job", self.client.post(url).multipart(form))
            .await?;

        tracing::info!("Job {} accepted with status '{}'", response.job_id, response.status);
        Ok(response.into())
    }

    async fn fetch_status(&self, job_id: &JobId) -> Result<JobStatusReport> {
        let url = self.endpoint(&[STATUS_PATH, job_id.as_str()]);
        let response: StatusResponse = self
            .send_json("fetch_status", self.client.get(url))
            .await?;

        tracing::debug!("Job {} status: {}", job_id, response.status);
        Ok(response.into())
    }

    fn name(&self) -> &str {
        "http"
    }
}
