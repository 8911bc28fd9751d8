//! Podcast generation, download and deletion endpoints.

use super::{AppState, parse_provider};
use crate::config::ServiceConfig;
use crate::error::{ApiError, PodcastError};
use crate::models::{GenerationRequest, Provider, TextModel, TtsModel};
use crate::news;
use crate::podcast::artifacts::validate_base_name;
use crate::podcast::{ScriptWriter, SpeechSynthesizer};
use crate::store::RankedStore;
use axum::Json;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use tracing::info;
use url::Url;

pub const MAX_URLS: usize = 10;
pub const MAX_PREFIX_LEN: usize = 64;

/// Body of `POST /{provider}/podcasts`.
///
/// When `urls` is omitted the provider's top `limit` items are used.
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub urls: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
    pub text_model: TextModel,
    pub tts_model: TtsModel,
    #[serde(default)]
    pub filename_prefix: Option<String>,
}

fn validate_prefix(prefix: &str) -> Result<(), ApiError> {
    let valid = !prefix.is_empty()
        && prefix.chars().count() <= MAX_PREFIX_LEN
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(ApiError::bad_request(format!(
            "filename_prefix must be 1-{MAX_PREFIX_LEN} characters of [A-Za-z0-9_-]"
        )));
    }
    Ok(())
}

/// Parse `raw` as an absolute http(s) URL, resolving relative links against
/// the provider's listing page (self posts are listed as `item?id=...`).
fn resolve_url(provider: Provider, raw: &str) -> Result<String, ApiError> {
    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(provider.listing_url())
            .and_then(|base| base.join(raw))
            .map_err(|_| ApiError::bad_request(format!("invalid url: {raw}")))?,
        Err(_) => return Err(ApiError::bad_request(format!("invalid url: {raw}"))),
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::bad_request(format!("unsupported url scheme: {raw}")));
    }
    Ok(parsed.to_string())
}

/// Turn a request body into a validated [`GenerationRequest`].
pub async fn build_request<S: RankedStore>(
    store: &S,
    config: &ServiceConfig,
    provider: Provider,
    body: GenerateBody,
) -> Result<GenerationRequest, ApiError> {
    let raw_urls = match body.urls {
        Some(urls) => urls,
        None => {
            let limit = body.limit.unwrap_or(config.default_url_limit);
            if limit == 0 || limit > MAX_URLS {
                return Err(ApiError::bad_request(format!("limit must be between 1 and {MAX_URLS}")));
            }
            news::get_top_item_urls(store, provider, limit).await?
        }
    };
    if raw_urls.is_empty() {
        return Err(ApiError::bad_request("no urls to generate a podcast from"));
    }
    if raw_urls.len() > MAX_URLS {
        return Err(ApiError::bad_request(format!("at most {MAX_URLS} urls are allowed")));
    }
    let urls = raw_urls
        .iter()
        .map(|raw| resolve_url(provider, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let filename_prefix = body
        .filename_prefix
        .unwrap_or_else(|| config.default_filename_prefix.clone());
    validate_prefix(&filename_prefix)?;

    Ok(GenerationRequest {
        urls,
        text_model: body.text_model,
        tts_model: body.tts_model,
        filename_prefix,
        provider,
    })
}

/// `POST /{provider}/podcasts`: start a job and stream its status tokens,
/// one per line, as they happen.
pub async fn generate<W, T, S>(
    State(state): State<AppState<W, T, S>>,
    Path(provider): Path<String>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
    W: ScriptWriter,
    T: SpeechSynthesizer,
    S: RankedStore,
{
    let provider = parse_provider(&provider)?;
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = build_request(state.store.as_ref(), &state.config, provider, body).await?;
    info!(%provider, urls = request.urls.len(), "Starting podcast generation");

    let statuses = state
        .pipeline
        .start(request)
        .map(|status| Ok::<_, Infallible>(format!("{status}\n")));

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Body::from_stream(statuses),
    )
        .into_response())
}

/// `GET /podcasts/{filename}`: download a script (`.txt`) or audio (`.mp3`).
pub async fn download<W, T, S>(
    State(state): State<AppState<W, T, S>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError>
where
    W: ScriptWriter,
    T: SpeechSynthesizer,
    S: RankedStore,
{
    let path = state.pipeline.artifacts().lookup(&filename).await?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::from(PodcastError::Io(e)))?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// `DELETE /podcasts/{filename}`: 204 whether or not the podcast existed.
pub async fn delete<W, T, S>(
    State(state): State<AppState<W, T, S>>,
    Path(filename): Path<String>,
) -> Result<StatusCode, ApiError>
where
    W: ScriptWriter,
    T: SpeechSynthesizer,
    S: RankedStore,
{
    validate_base_name(&filename)?;
    state
        .pipeline
        .artifacts()
        .delete(state.store.as_ref(), &filename)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
