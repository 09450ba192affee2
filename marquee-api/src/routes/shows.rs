use std::collections::{BTreeMap, HashSet};

use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use marquee_core::movie::Movie;
use marquee_core::show::Show;

use crate::error::AppError;
use crate::middleware::auth::admin_auth_middleware;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ShowsInput {
    date: NaiveDate,
    times: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AddShowRequest {
    movie_id: i64,
    shows_input: Vec<ShowsInput>,
    price_cents: i64,
}

#[derive(Debug, Serialize)]
struct AddShowResponse {
    created: usize,
}

#[derive(Debug, Serialize)]
struct MovieListResponse {
    movies: Vec<Movie>,
}

#[derive(Debug, Serialize)]
struct ShowSlot {
    time: DateTime<Utc>,
    show_id: Uuid,
}

#[derive(Debug, Serialize)]
struct MovieShowsResponse {
    movie: Movie,
    /// Upcoming slots grouped by calendar date.
    date_time: BTreeMap<NaiveDate, Vec<ShowSlot>>,
}

#[derive(Debug, Serialize)]
struct OccupiedSeatsResponse {
    occupied_seats: Vec<String>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/v1/shows/add", post(add_show))
        .route_layer(middleware::from_fn_with_state(
            state,
            admin_auth_middleware,
        ));

    Router::new()
        .route("/v1/shows", get(list_shows))
        .route("/v1/shows/{movie_id}", get(movie_shows))
        .route("/v1/shows/{show_id}/seats", get(occupied_seats))
        .merge(admin)
}

/// Unique movies with at least one upcoming show, soonest show first.
async fn list_shows(State(state): State<AppState>) -> Result<Json<MovieListResponse>, AppError> {
    let shows = state
        .shows
        .list_upcoming()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut ordered_ids: Vec<i64> = Vec::new();
    let mut seen: HashSet<i64> = HashSet::new();
    for show in &shows {
        if seen.insert(show.movie_id) {
            ordered_ids.push(show.movie_id);
        }
    }

    let movies = state
        .movies
        .get_many(&ordered_ids)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut ordered = Vec::with_capacity(ordered_ids.len());
    for id in &ordered_ids {
        if let Some(movie) = movies.iter().find(|m| m.id == *id) {
            ordered.push(movie.clone());
        }
    }

    Ok(Json(MovieListResponse { movies: ordered }))
}

/// A movie plus its upcoming slots grouped by date.
async fn movie_shows(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<MovieShowsResponse>, AppError> {
    let movie = state
        .movies
        .get(movie_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("movie not found: {movie_id}")))?;

    let shows = state
        .shows
        .list_upcoming_for_movie(movie_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut date_time: BTreeMap<NaiveDate, Vec<ShowSlot>> = BTreeMap::new();
    for show in shows {
        date_time
            .entry(show.show_datetime.date_naive())
            .or_default()
            .push(ShowSlot {
                time: show.show_datetime,
                show_id: show.id,
            });
    }

    Ok(Json(MovieShowsResponse { movie, date_time }))
}

/// The seat map source for the booking UI.
async fn occupied_seats(
    State(state): State<AppState>,
    Path(show_id): Path<Uuid>,
) -> Result<Json<OccupiedSeatsResponse>, AppError> {
    let show = state
        .shows
        .get(show_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("show not found: {show_id}")))?;

    Ok(Json(OccupiedSeatsResponse {
        occupied_seats: show.occupied_labels(),
    }))
}

/// Admin: expand a (date x times) cross-product into one show per slot.
/// The movie is pulled from the external catalog on first reference.
async fn add_show(
    State(state): State<AppState>,
    Json(req): Json<AddShowRequest>,
) -> Result<Json<AddShowResponse>, AppError> {
    if req.price_cents <= 0 {
        return Err(AppError::Validation("price_cents must be positive".to_string()));
    }

    let movie = state
        .catalog
        .get_or_create_movie(req.movie_id)
        .await
        .map_err(AppError::from_catalog)?;

    let mut shows = Vec::new();
    for input in &req.shows_input {
        for time in &input.times {
            let time = NaiveTime::parse_from_str(time, "%H:%M")
                .map_err(|_| AppError::Validation(format!("invalid time: {time}")))?;
            let show_datetime = input.date.and_time(time).and_utc();
            shows.push(Show::new(movie.id, show_datetime, req.price_cents));
        }
    }

    if shows.is_empty() {
        return Err(AppError::Validation("no show slots provided".to_string()));
    }

    let created = shows.len();
    state
        .shows
        .insert_many(&shows)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    // Announcement is best-effort; the shows are already in.
    if let Err(e) = state.scheduler.enqueue_show_announcement(&movie.title).await {
        warn!("failed to enqueue show announcement: {e}");
    }

    Ok(Json(AddShowResponse { created }))
}
