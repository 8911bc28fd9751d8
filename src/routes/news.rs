//! Read-only listing endpoints.

use super::{AppState, parse_provider};
use crate::error::ApiError;
use crate::models::{NewsItem, ResponseModel};
use crate::news;
use crate::podcast::{ScriptWriter, SpeechSynthesizer};
use crate::store::RankedStore;
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

pub const GET_SUCCESS: &str = "Fetched successfully.";

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_limit() -> usize {
    20
}

fn default_page() -> usize {
    1
}

impl PageQuery {
    fn validate(&self) -> Result<(), ApiError> {
        if self.limit == 0 || self.page == 0 {
            return Err(ApiError::bad_request("limit and page must be greater than 0"));
        }
        Ok(())
    }
}

/// `GET /{provider}/top`
pub async fn top_items<W, T, S>(
    State(state): State<AppState<W, T, S>>,
    Path(provider): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ResponseModel<Vec<NewsItem>>>, ApiError>
where
    W: ScriptWriter,
    T: SpeechSynthesizer,
    S: RankedStore,
{
    let provider = parse_provider(&provider)?;
    query.validate()?;
    let items = news::get_top_items(state.store.as_ref(), provider, query.limit, query.page).await?;
    Ok(Json(ResponseModel::ok(items, GET_SUCCESS)))
}

/// `GET /{provider}/podcasts`
pub async fn podcasts<W, T, S>(
    State(state): State<AppState<W, T, S>>,
    Path(provider): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ResponseModel<Vec<String>>>, ApiError>
where
    W: ScriptWriter,
    T: SpeechSynthesizer,
    S: RankedStore,
{
    let provider = parse_provider(&provider)?;
    query.validate()?;
    let names = news::get_podcasts(state.store.as_ref(), provider, query.limit, query.page).await?;
    Ok(Json(ResponseModel::ok(names, GET_SUCCESS)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;
    use crate::routes::podcasts::tests::test_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_top_items_returns_ranked_page() {
        let (_tmp, state) = test_state().await;
        let item = NewsItem {
            id: 1,
            title: "Top".to_string(),
            url: "https://example.com/top".to_string(),
        };
        state
            .store
            .add(
                Provider::GeekNews.items_key(),
                &serde_json::to_string(&item).unwrap(),
                9.0,
            )
            .await
            .unwrap();

        let Json(body) = top_items(
            State(state),
            Path("geeknews".to_string()),
            Query(PageQuery { limit: 20, page: 1 }),
        )
        .await
        .unwrap();
        assert_eq!(body.data, Some(vec![item]));
        assert_eq!(body.message, GET_SUCCESS);
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let (_tmp, state) = test_state().await;
        let err = podcasts(
            State(state),
            Path("hackernews".to_string()),
            Query(PageQuery { limit: 0, page: 1 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let (_tmp, state) = test_state().await;
        state
            .store
            .add(Provider::HackerNews.podcasts_key(), "show_1", 1.0)
            .await
            .unwrap();

        let Json(body) = podcasts(
            State(state.clone()),
            Path("hackernews".to_string()),
            Query(PageQuery {
                limit: 20,
                page: usize::MAX,
            }),
        )
        .await
        .unwrap();
        assert_eq!(body.data, Some(Vec::new()));

        let Json(body) = podcasts(
            State(state),
            Path("hackernews".to_string()),
            Query(PageQuery {
                limit: usize::MAX,
                page: 1,
            }),
        )
        .await
        .unwrap();
        assert_eq!(body.data, Some(vec!["show_1".to_string()]));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_not_found() {
        let (_tmp, state) = test_state().await;
        let err = top_items(
            State(state),
            Path("lobsters".to_string()),
            Query(PageQuery { limit: 5, page: 1 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
