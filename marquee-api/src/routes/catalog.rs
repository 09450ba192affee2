use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::error::AppError;
use crate::middleware::auth::admin_auth_middleware;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/v1/catalog/now-playing", get(now_playing))
        .route_layer(middleware::from_fn_with_state(
            state,
            admin_auth_middleware,
        ));

    Router::new()
        .route("/v1/catalog/upcoming", get(upcoming))
        .route("/v1/catalog/search", get(search))
        .route("/v1/catalog/movies/{movie_id}/videos", get(videos))
        .merge(admin)
}

/// Admin show-picker source; served from the TTL cache when warm.
async fn now_playing(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let movies = state
        .catalog
        .now_playing()
        .await
        .map_err(AppError::from_catalog)?;
    Ok(Json(json!({ "movies": movies })))
}

async fn upcoming(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let movies = state
        .catalog
        .upcoming()
        .await
        .map_err(AppError::from_catalog)?;
    Ok(Json(json!({ "movies": movies })))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let movies = state
        .catalog
        .search(&params.query)
        .await
        .map_err(AppError::from_catalog)?;
    Ok(Json(json!({ "movies": movies })))
}

/// Trailer lookup. A catalog failure degrades to an explicitly empty list;
/// the player falls back rather than erroring.
async fn videos(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Json<serde_json::Value> {
    match state.catalog.trailers(movie_id).await {
        Ok(videos) => Json(json!({ "videos": videos })),
        Err(e) => {
            warn!(movie_id, "trailer lookup failed, returning empty: {e}");
            Json(json!({ "videos": [] }))
        }
    }
}
