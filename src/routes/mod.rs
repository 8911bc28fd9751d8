//! HTTP surface.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/` | [`hello`] |
//! | GET | `/{provider}/top` | [`news::top_items`] |
//! | GET | `/{provider}/podcasts` | [`news::podcasts`] |
//! | POST | `/{provider}/podcasts` | [`podcasts::generate`] (streamed status) |
//! | GET | `/podcasts/{filename}` | [`podcasts::download`] |
//! | DELETE | `/podcasts/{filename}` | [`podcasts::delete`] |

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::models::Provider;
use crate::podcast::{PodcastPipeline, ScriptWriter, SpeechSynthesizer};
use crate::store::RankedStore;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod news;
pub mod podcasts;

/// Shared handler state.
pub struct AppState<W, T, S> {
    pub pipeline: Arc<PodcastPipeline<W, T, S>>,
    pub store: Arc<S>,
    pub config: Arc<ServiceConfig>,
}

impl<W, T, S> Clone for AppState<W, T, S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

/// Build the application router.
pub fn create_router<W, T, S>(state: AppState<W, T, S>) -> Router
where
    W: ScriptWriter,
    T: SpeechSynthesizer,
    S: RankedStore,
{
    Router::new()
        .route("/", get(hello))
        .route("/{provider}/top", get(news::top_items::<W, T, S>))
        .route(
            "/{provider}/podcasts",
            get(news::podcasts::<W, T, S>).post(podcasts::generate::<W, T, S>),
        )
        .route(
            "/podcasts/{filename}",
            get(podcasts::download::<W, T, S>).delete(podcasts::delete::<W, T, S>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn hello() -> &'static str {
    "Hello, World!"
}

fn parse_provider(raw: &str) -> Result<Provider, ApiError> {
    raw.parse::<Provider>().map_err(ApiError::not_found)
}
