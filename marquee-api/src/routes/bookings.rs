use axum::{
    extract::State,
    middleware,
    routing::post,
    Extension, Json, Router,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use marquee_core::booking::BookingStatus;

use crate::error::AppError;
use crate::middleware::auth::{customer_auth_middleware, Claims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    show_id: Uuid,
    seats: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreateBookingResponse {
    booking_id: Uuid,
    status: BookingStatus,
    amount_cents: i64,
    payment_url: Option<String>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route_layer(middleware::from_fn_with_state(
            state,
            customer_auth_middleware,
        ))
}

/// Seat-hold acquisition plus checkout-session creation.
///
/// The hold-expiry check is scheduled as soon as the booking exists, before
/// the processor round-trip, so seats can never be stranded by a payment
/// outage.
async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    let booking = state
        .lifecycle
        .reserve_seats(req.show_id, &claims.sub, &req.seats)
        .await
        .map_err(AppError::from_booking)?;

    let due_at = booking.created_at + Duration::seconds(state.rules.hold_expiry_seconds as i64);
    if let Err(e) = state
        .scheduler
        .schedule_payment_check(booking.id, due_at)
        .await
    {
        // The booking exists but would never expire; surface loudly.
        error!(booking_id = %booking.id, "failed to schedule hold expiry: {e}");
        return Err(AppError::Internal(e.to_string()));
    }

    let show = state
        .shows
        .get(booking.show_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("show not found: {}", booking.show_id)))?;

    let movie_title = state
        .movies
        .get(show.movie_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map(|m| m.title)
        .unwrap_or_else(|| "Movie".to_string());

    let session = state
        .payments
        .create_checkout_session(&booking, &movie_title)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    if let Some(url) = &session.url {
        state
            .bookings
            .set_payment_link(booking.id, url)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    info!(booking_id = %booking.id, user = %claims.sub, "booking created");

    Ok(Json(CreateBookingResponse {
        booking_id: booking.id,
        status: booking.status(),
        amount_cents: booking.amount_cents,
        payment_url: session.url,
    }))
}
