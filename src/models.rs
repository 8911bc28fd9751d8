//! Data models shared by the scrapers, the ranked store, the podcast pipeline
//! and the HTTP layer.
//!
//! - [`NewsItem`]: one scraped listing entry, stored as JSON inside a ranked set
//! - [`Provider`]: a content source and the store keys it owns
//! - [`TextModel`] / [`TtsModel`]: allow-listed model identifiers
//! - [`GenerationRequest`]: the immutable input of one podcast job
//! - [`PipelineStatus`]: the status tokens a job emits
//! - [`ResponseModel`]: the JSON envelope returned by listing endpoints

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single item scraped from a provider's listing page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsItem {
    /// The provider's own identifier for the item.
    pub id: u64,
    /// The headline as shown on the listing page.
    pub title: String,
    /// The article link (may be relative for self posts).
    pub url: String,
}

/// A content provider whose listing is scraped into its own ranked index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    HackerNews,
    GeekNews,
}

impl Provider {
    /// Every provider, in a fixed order.
    pub const ALL: [Provider; 2] = [Provider::HackerNews, Provider::GeekNews];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::HackerNews => "hackernews",
            Provider::GeekNews => "geeknews",
        }
    }

    /// The listing page scraped for this provider.
    pub fn listing_url(&self) -> &'static str {
        match self {
            Provider::HackerNews => "https://news.ycombinator.com/",
            Provider::GeekNews => "https://news.hada.io/",
        }
    }

    /// Ranked set holding the scraped items, scored by popularity.
    pub fn items_key(&self) -> &'static str {
        match self {
            Provider::HackerNews => "hackernews:items",
            Provider::GeekNews => "geeknews:items",
        }
    }

    /// Ranked set holding generated podcast names, scored by creation time.
    pub fn podcasts_key(&self) -> &'static str {
        match self {
            Provider::HackerNews => "hackernews:podcasts",
            Provider::GeekNews => "geeknews:podcasts",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hackernews" => Ok(Provider::HackerNews),
            "geeknews" => Ok(Provider::GeekNews),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Text-generation models a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TextModel {
    #[serde(rename = "gpt-4.1")]
    Gpt41,
    #[serde(rename = "gpt-4.1-mini")]
    Gpt41Mini,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
}

impl TextModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextModel::Gpt41 => "gpt-4.1",
            TextModel::Gpt41Mini => "gpt-4.1-mini",
            TextModel::Gpt4o => "gpt-4o",
            TextModel::Gpt4oMini => "gpt-4o-mini",
        }
    }
}

/// Speech models a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TtsModel {
    #[serde(rename = "gemini-2.5-flash-tts")]
    GeminiFlashTts,
    #[serde(rename = "gemini-2.5-pro-tts")]
    GeminiProTts,
}

impl TtsModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsModel::GeminiFlashTts => "gemini-2.5-flash-tts",
            TtsModel::GeminiProTts => "gemini-2.5-pro-tts",
        }
    }
}

/// The validated input of one podcast generation job.
///
/// Built by the HTTP layer after validation and never mutated once the job
/// has started.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Article URLs, in the order they should be covered.
    pub urls: Vec<String>,
    pub text_model: TextModel,
    pub tts_model: TtsModel,
    /// Prefix of the artifact base name; the creation timestamp is appended.
    pub filename_prefix: String,
    /// Whose podcast index receives the finished artifact.
    pub provider: Provider,
}

/// Progress tokens emitted by a podcast job, in happy-path order.
///
/// `Failed` may follow any non-terminal status and always ends the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Pending,
    GeneratingText,
    GeneratingAudio,
    Uploading,
    Completed,
    Failed,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Pending => "pending",
            PipelineStatus::GeneratingText => "generating_text",
            PipelineStatus::GeneratingAudio => "generating_audio",
            PipelineStatus::Uploading => "uploading",
            PipelineStatus::Completed => "completed",
            PipelineStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStatus::Completed | PipelineStatus::Failed)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON envelope for listing responses.
#[derive(Debug, Deserialize, Serialize)]
pub struct ResponseModel<T> {
    pub data: Option<T>,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl<T> ResponseModel<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            message: message.into(),
            timestamp: Local::now(),
        }
    }
}
