//! Podcast script generation through an OpenAI-compatible Responses API.
//!
//! # Architecture
//!
//! - [`ScriptWriter`]: the seam the pipeline depends on, so tests can swap in
//!   a double
//! - [`OpenAiScriptWriter`]: one `POST /responses` call with the fixed
//!   instructions, the URL listing as input and the `web_search` tool enabled
//!
//! No retries: a failed call fails the job.

use super::prompts::SCRIPT_INSTRUCTIONS;
use crate::error::PodcastError;
use crate::models::TextModel;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Produces a full two-host script for a listing of article URLs.
pub trait ScriptWriter: Send + Sync + 'static {
    /// Generate the script text.
    ///
    /// # Arguments
    ///
    /// * `model` - Text model to run
    /// * `url_listing` - One `- <url>` bullet per article, in order
    ///
    /// # Errors
    ///
    /// [`PodcastError::Upstream`] when the call fails or yields no text.
    fn write_script(
        &self,
        model: TextModel,
        url_listing: &str,
    ) -> impl Future<Output = Result<String, PodcastError>> + Send;
}

/// [`ScriptWriter`] backed by the Responses API.
#[derive(Clone)]
pub struct OpenAiScriptWriter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiScriptWriter {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for OpenAiScriptWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiScriptWriter")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Concatenate every `output_text` part of every `message` item.
fn output_text(body: &ResponsesBody) -> String {
    body.output
        .iter()
        .filter(|item| item.kind == "message")
        .flat_map(|item| item.content.iter())
        .filter(|part| part.kind == "output_text")
        .map(|part| part.text.as_str())
        .collect()
}

impl ScriptWriter for OpenAiScriptWriter {
    #[instrument(level = "info", skip_all, fields(model = model.as_str()))]
    async fn write_script(&self, model: TextModel, url_listing: &str) -> Result<String, PodcastError> {
        let t0 = Instant::now();
        let request = json!({
            "model": model.as_str(),
            "instructions": SCRIPT_INSTRUCTIONS,
            "input": url_listing,
            "tools": [{ "type": "web_search" }],
        });

        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %truncate_for_log(&body, 300), "Text generation rejected");
            return Err(PodcastError::Upstream(format!("text generation returned {status}")));
        }

        let body: ResponsesBody = response.json().await?;
        let text = output_text(&body);
        if text.trim().is_empty() {
            return Err(PodcastError::Upstream("text generation returned no text".to_string()));
        }
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = text.len(),
            "Generated podcast script"
        );
        Ok(text)
    }
}
