use axum::{
    extract::State,
    middleware,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use marquee_core::movie::Movie;
use marquee_core::user::User;

use crate::error::AppError;
use crate::middleware::auth::admin_auth_middleware;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ShowWithMovie {
    id: Uuid,
    show_datetime: DateTime<Utc>,
    price_cents: i64,
    occupied_seats: Vec<String>,
    movie: Option<Movie>,
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    total_bookings: usize,
    total_revenue_cents: i64,
    active_shows: Vec<ShowWithMovie>,
    total_users: i64,
}

#[derive(Debug, Serialize)]
struct AdminBookingView {
    id: Uuid,
    booked_seats: Vec<String>,
    amount_cents: i64,
    is_paid: bool,
    created_at: DateTime<Utc>,
    user: Option<User>,
    show: Option<ShowWithMovie>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/admin/is-admin", get(is_admin))
        .route("/v1/admin/dashboard", get(dashboard))
        .route("/v1/admin/shows", get(all_shows))
        .route("/v1/admin/bookings", get(all_bookings))
        .route_layer(middleware::from_fn_with_state(
            state,
            admin_auth_middleware,
        ))
}

/// Probe for the front end; reaching the handler means the middleware passed.
async fn is_admin() -> Json<serde_json::Value> {
    Json(json!({ "is_admin": true }))
}

async fn shows_with_movies(state: &AppState) -> Result<Vec<ShowWithMovie>, AppError> {
    let shows = state
        .shows
        .list_upcoming()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut views = Vec::with_capacity(shows.len());
    for show in shows {
        let movie = state
            .movies
            .get(show.movie_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        views.push(ShowWithMovie {
            id: show.id,
            show_datetime: show.show_datetime,
            price_cents: show.price_cents,
            occupied_seats: show.occupied_labels(),
            movie,
        });
    }
    Ok(views)
}

/// Paid-booking count, revenue, active shows and user count in one payload.
async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, AppError> {
    let paid = state
        .bookings
        .list_paid()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let total_revenue_cents = paid.iter().map(|b| b.amount_cents).sum();

    let active_shows = shows_with_movies(&state).await?;

    let total_users = state
        .users
        .count()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(DashboardResponse {
        total_bookings: paid.len(),
        total_revenue_cents,
        active_shows,
        total_users,
    }))
}

async fn all_shows(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let shows = shows_with_movies(&state).await?;
    Ok(Json(json!({ "shows": shows })))
}

async fn all_bookings(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let bookings = state
        .bookings
        .list_all()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut views = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let user = state
            .users
            .get(&booking.user_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let show = match state
            .shows
            .get(booking.show_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
        {
            Some(show) => {
                let movie = state
                    .movies
                    .get(show.movie_id)
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                Some(ShowWithMovie {
                    id: show.id,
                    show_datetime: show.show_datetime,
                    price_cents: show.price_cents,
                    occupied_seats: show.occupied_labels(),
                    movie,
                })
            }
            None => None,
        };

        views.push(AdminBookingView {
            id: booking.id,
            booked_seats: booking.booked_seats,
            amount_cents: booking.amount_cents,
            is_paid: booking.is_paid,
            created_at: booking.created_at,
            user,
            show,
        });
    }

    Ok(Json(json!({ "bookings": views })))
}
