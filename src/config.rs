//! Service configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an empty or missing file yields a working
//! configuration. Secrets (API keys) stay on the command line / environment
//! and never live in this file.
//!
//! ```yaml
//! openai_base_url: https://api.openai.com/v1
//! tts_base_url: https://texttospeech.googleapis.com/v1beta1
//! scrape_interval_secs: 3600
//! max_chunk_bytes: 4000
//! chunk_encoding: utf8
//! default_filename_prefix: podcast_
//! ```

use crate::podcast::chunker::TextEncoding;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the OpenAI-compatible Responses API.
    pub openai_base_url: String,
    /// Base URL of the Cloud Text-to-Speech REST API.
    pub tts_base_url: String,
    /// Seconds between two scrapes of the same provider.
    pub scrape_interval_secs: u64,
    /// Largest script slice sent in one speech request.
    pub max_chunk_bytes: usize,
    /// Encoding the speech service counts `max_chunk_bytes` in.
    pub chunk_encoding: TextEncoding,
    /// Prefix used when a generation request does not name one.
    pub default_filename_prefix: String,
    /// How many top items feed a podcast when no URLs are given.
    pub default_url_limit: usize,
    /// Timeout for a single upstream HTTP call.
    pub request_timeout_secs: u64,
    /// Pause around the first and last status tokens so the client sees them.
    pub flush_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com/v1".to_string(),
            tts_base_url: "https://texttospeech.googleapis.com/v1beta1".to_string(),
            scrape_interval_secs: 3600,
            max_chunk_bytes: 4000,
            chunk_encoding: TextEncoding::Utf8,
            default_filename_prefix: "podcast_".to_string(),
            default_url_limit: 5,
            request_timeout_secs: 300,
            flush_delay_ms: 500,
        }
    }
}

impl ServiceConfig {
    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn flush_delay(&self) -> Duration {
        Duration::from_millis(self.flush_delay_ms)
    }
}

/// Load the configuration, falling back to defaults when no path is given.
#[instrument(level = "info", skip_all)]
pub async fn load_config(
    path: Option<&Path>,
) -> Result<ServiceConfig, Box<dyn Error + Send + Sync>> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(ServiceConfig::default());
    };
    let raw = tokio::fs::read_to_string(path).await?;
    let config = parse_config(&raw)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

fn parse_config(raw: &str) -> Result<ServiceConfig, serde_yaml::Error> {
    if raw.trim().is_empty() {
        return Ok(ServiceConfig::default());
    }
    serde_yaml::from_str(raw)
}
