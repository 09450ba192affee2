use axum::{
    extract::State,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use marquee_core::movie::Movie;

use crate::error::AppError;
use crate::middleware::auth::{customer_auth_middleware, Claims};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ShowView {
    id: Uuid,
    show_datetime: DateTime<Utc>,
    price_cents: i64,
    movie: Movie,
}

#[derive(Debug, Serialize)]
struct BookingView {
    id: Uuid,
    booked_seats: Vec<String>,
    amount_cents: i64,
    is_paid: bool,
    created_at: DateTime<Utc>,
    show: Option<ShowView>,
}

#[derive(Debug, Serialize)]
struct BookingsResponse {
    bookings: Vec<BookingView>,
}

#[derive(Debug, Deserialize)]
struct ToggleFavoriteRequest {
    movie_id: i64,
}

#[derive(Debug, Serialize)]
struct FavoritesIdsResponse {
    favorites: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct MovieListResponse {
    movies: Vec<Movie>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/users/bookings", get(my_bookings))
        .route("/v1/users/favorites", get(favorites).post(toggle_favorite))
        .route("/v1/users/recommendations", get(recommendations))
        .route_layer(middleware::from_fn_with_state(
            state,
            customer_auth_middleware,
        ))
}

/// The caller's bookings, newest first, with show and movie embedded.
async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<BookingsResponse>, AppError> {
    let bookings = state
        .bookings
        .list_for_user(&claims.sub)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut views = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let show = match state
            .shows
            .get(booking.show_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
        {
            Some(show) => {
                match state
                    .movies
                    .get(show.movie_id)
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?
                {
                    Some(movie) => Some(ShowView {
                        id: show.id,
                        show_datetime: show.show_datetime,
                        price_cents: show.price_cents,
                        movie,
                    }),
                    None => {
                        warn!(show_id = %show.id, "booking references show with unknown movie");
                        None
                    }
                }
            }
            None => None,
        };

        views.push(BookingView {
            id: booking.id,
            booked_seats: booking.booked_seats,
            amount_cents: booking.amount_cents,
            is_paid: booking.is_paid,
            created_at: booking.created_at,
            show,
        });
    }

    Ok(Json(BookingsResponse { bookings: views }))
}

/// Toggle a movie in the caller's favorites; pulls the movie from the
/// catalog if this is its first reference.
async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ToggleFavoriteRequest>,
) -> Result<Json<FavoritesIdsResponse>, AppError> {
    let movie = state
        .catalog
        .get_or_create_movie(req.movie_id)
        .await
        .map_err(AppError::from_catalog)?;

    let user = state
        .users
        .get(&claims.sub)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("user not found: {}", claims.sub)))?;

    let mut favorites = user.favorites;
    if let Some(pos) = favorites.iter().position(|id| *id == movie.id) {
        favorites.remove(pos);
    } else {
        favorites.push(movie.id);
    }

    state
        .users
        .set_favorites(&claims.sub, &favorites)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(FavoritesIdsResponse { favorites }))
}

async fn favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MovieListResponse>, AppError> {
    let user = state
        .users
        .get(&claims.sub)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("user not found: {}", claims.sub)))?;

    let movies = state
        .movies
        .get_many(&user.favorites)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(MovieListResponse { movies }))
}

/// Watchable recommendations; an absent user record just means no history.
async fn recommendations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MovieListResponse>, AppError> {
    let favorites = state
        .users
        .get(&claims.sub)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map(|u| u.favorites)
        .unwrap_or_default();

    let movies = state
        .recommendations
        .recommend_for(&favorites, state.rules.recommendation_count)
        .await
        .map_err(AppError::from_catalog)?;

    Ok(Json(MovieListResponse { movies }))
}
