//! Thin REST client shared by the Gemini-backed generators.

use crate::{RetryPolicy, with_retry};
use babel_error::{GenerationError, GenerationErrorKind};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Authenticated client for the Generative Language API.
#[derive(Debug, Clone)]
pub struct GeminiRestClient {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl GeminiRestClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or the HTTP client cannot be built.
    #[instrument(skip_all, fields(base_url = %base_url.as_ref()))]
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl AsRef<str>,
        retry: RetryPolicy,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::new(
                GenerationErrorKind::MissingCredentials("gemini".to_string()),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| GenerationError::new(GenerationErrorKind::ClientCreation(e.to_string())))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// URL for a model method, e.g. `models/gemini-2.0-flash:generateContent`.
    pub fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// POST a JSON body to a model method and decode the JSON response, retrying
    /// transient failures.
    #[instrument(skip(self, body))]
    pub async fn call_model<B, T>(&self, model: &str, method: &str, body: &B) -> Result<T, GenerationError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.model_url(model, method);
        with_retry(&self.retry, method, || self.post_once(&url, body)).await
    }

    async fn post_once<B, T>(&self, url: &str, body: &B) -> Result<T, GenerationError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(url, "Sending Gemini API request");
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::new(GenerationErrorKind::Request(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::new(GenerationErrorKind::Http {
                status_code: status.as_u16(),
                message,
            }));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::new(GenerationErrorKind::Request(e.to_string())))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            GenerationError::new(GenerationErrorKind::UnexpectedResponse(format!(
                "failed to parse response: {e}"
            )))
        })
    }
}
