//! Speech synthesis of script chunks through the Cloud Text-to-Speech REST API.
//!
//! Every call uses the same fixed voice profile: two prebuilt voices bound to
//! the `Speaker1` / `Speaker2` aliases, Korean, MP3 at 24 kHz. Calls are
//! independent and stateless, so the pipeline issues one per chunk
//! concurrently.

use super::prompts::SPEECH_STYLE_PROMPT;
use crate::error::PodcastError;
use crate::models::TtsModel;
use crate::utils::truncate_for_log;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// `(speaker alias, prebuilt voice)` pairs of the two hosts.
pub const SPEAKER_VOICES: [(&str, &str); 2] = [("Speaker1", "Kore"), ("Speaker2", "Charon")];
pub const LANGUAGE_CODE: &str = "ko-KR";
pub const SAMPLE_RATE_HERTZ: u32 = 24_000;
pub const AUDIO_ENCODING: &str = "MP3";

/// Turns one chunk of script text into encoded audio bytes.
pub trait SpeechSynthesizer: Send + Sync + 'static {
    /// # Errors
    ///
    /// [`PodcastError::Upstream`] when the call fails or returns no audio.
    fn synthesize(
        &self,
        model: TtsModel,
        text: &str,
    ) -> impl Future<Output = Result<Vec<u8>, PodcastError>> + Send;
}

/// [`SpeechSynthesizer`] backed by `text:synthesize`.
#[derive(Clone)]
pub struct CloudSpeechSynthesizer {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CloudSpeechSynthesizer {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for CloudSpeechSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudSpeechSynthesizer")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Request body for one chunk.
fn synthesis_request(model: TtsModel, text: &str) -> Value {
    let speaker_voice_configs: Vec<Value> = SPEAKER_VOICES
        .iter()
        .map(|(alias, voice)| json!({ "speakerAlias": alias, "speakerId": voice }))
        .collect();
    json!({
        "input": { "text": text, "prompt": SPEECH_STYLE_PROMPT },
        "voice": {
            "languageCode": LANGUAGE_CODE,
            "modelName": model.as_str(),
            "multiSpeakerVoiceConfig": { "speakerVoiceConfigs": speaker_voice_configs },
        },
        "audioConfig": {
            "audioEncoding": AUDIO_ENCODING,
            "sampleRateHertz": SAMPLE_RATE_HERTZ,
        },
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

fn decode_audio(body: &SynthesizeResponse) -> Result<Vec<u8>, PodcastError> {
    let audio = STANDARD
        .decode(body.audio_content.as_bytes())
        .map_err(|e| PodcastError::Upstream(format!("speech audio is not valid base64: {e}")))?;
    if audio.is_empty() {
        return Err(PodcastError::Upstream("speech synthesis returned no audio".to_string()));
    }
    Ok(audio)
}

impl SpeechSynthesizer for CloudSpeechSynthesizer {
    #[instrument(level = "info", skip_all, fields(model = model.as_str(), bytes = text.len()))]
    async fn synthesize(&self, model: TtsModel, text: &str) -> Result<Vec<u8>, PodcastError> {
        let t0 = Instant::now();
        let response = self
            .client
            .post(format!("{}/text:synthesize", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .json(&synthesis_request(model, text))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %truncate_for_log(&body, 300), "Speech synthesis rejected");
            return Err(PodcastError::Upstream(format!("speech synthesis returned {status}")));
        }

        let body: SynthesizeResponse = response.json().await?;
        let audio = decode_audio(&body)?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            audio_bytes = audio.len(),
            "Synthesized chunk"
        );
        Ok(audio)
    }
}
