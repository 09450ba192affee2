use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use marquee_booking::PaymentOutcome;
use marquee_shared::events::IdentitySync;

use crate::error::AppError;
use crate::signature::{self, DEFAULT_TOLERANCE_SECONDS};
use crate::state::AppState;

const PAYMENT_SIGNATURE_HEADER: &str = "Stripe-Signature";
const IDENTITY_SIGNATURE_HEADER: &str = "X-Identity-Signature";

#[derive(Debug, Deserialize)]
struct PaymentEvent {
    #[serde(rename = "type")]
    type_: String,
    data: PaymentEventData,
}

#[derive(Debug, Deserialize)]
struct PaymentEventData {
    object: PaymentIntentObject,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct IdentityEvent {
    #[serde(rename = "type")]
    type_: String,
    data: IdentityEventData,
}

#[derive(Debug, Deserialize)]
struct IdentityEventData {
    id: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    image_url: String,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    email_address: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/webhooks/payments", post(payments_webhook))
        .route("/v1/webhooks/identity", post(identity_webhook))
}

fn verify_header(
    headers: &HeaderMap,
    header_name: &str,
    secret: &str,
    body: &[u8],
) -> Result<(), AppError> {
    let header = headers
        .get(header_name)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Validation(format!("missing {header_name} header")))?;

    signature::verify(secret, header, body, Utc::now(), DEFAULT_TOLERANCE_SECONDS)
        .map_err(|e| AppError::Validation(format!("webhook signature rejected: {e}")))
}

/// Payment-succeeded notifications from the processor.
///
/// Safe to replay: a second delivery finds the booking already paid and does
/// not re-trigger the confirmation email. Handler errors surface as 5xx and
/// rely on processor-side retry.
async fn payments_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    verify_header(
        &headers,
        PAYMENT_SIGNATURE_HEADER,
        &state.webhooks.payments,
        &body,
    )?;

    let event: PaymentEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("malformed webhook payload: {e}")))?;

    if event.type_ != "payment_intent.succeeded" {
        info!(event_type = %event.type_, "ignoring unhandled payment event");
        return Ok(Json(json!({ "received": true })));
    }

    let intent_id = &event.data.object.id;

    // Resolve the intent back to its checkout session; the session metadata
    // carries the booking id attached at checkout creation.
    let session = state
        .payments
        .session_for_payment_intent(intent_id)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?
        .ok_or_else(|| {
            AppError::NotFound(format!("no checkout session for payment intent {intent_id}"))
        })?;

    let booking_id = session.booking_id.ok_or_else(|| {
        AppError::NotFound(format!("session {} carries no booking metadata", session.id))
    })?;

    match state
        .lifecycle
        .confirm_payment(booking_id)
        .await
        .map_err(AppError::from_booking)?
    {
        PaymentOutcome::Confirmed => {
            if let Err(e) = state.scheduler.enqueue_confirmation_email(booking_id).await {
                // The booking is paid either way; the email is best-effort.
                warn!(booking_id = %booking_id, "failed to enqueue confirmation email: {e}");
            }
            info!(booking_id = %booking_id, "booking paid via webhook");
        }
        PaymentOutcome::AlreadyPaid => {
            info!(booking_id = %booking_id, "replayed payment webhook, booking already paid");
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// Identity-provider lifecycle events, mirrored through the durable queue so
/// a burst of provider retries stays idempotent.
async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    verify_header(
        &headers,
        IDENTITY_SIGNATURE_HEADER,
        &state.webhooks.identity,
        &body,
    )?;

    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("malformed webhook payload: {e}")))?;

    let sync = match event.type_.as_str() {
        "user.created" | "user.updated" => {
            let email = event
                .data
                .email_addresses
                .first()
                .map(|e| e.email_address.clone())
                .unwrap_or_default();
            IdentitySync::Upserted {
                id: event.data.id,
                name: format!("{} {}", event.data.first_name, event.data.last_name)
                    .trim()
                    .to_string(),
                email,
                image: event.data.image_url,
            }
        }
        "user.deleted" => IdentitySync::Deleted { id: event.data.id },
        other => {
            info!(event_type = other, "ignoring unhandled identity event");
            return Ok(Json(json!({ "received": true })));
        }
    };

    state
        .scheduler
        .enqueue_identity_sync(sync)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "received": true })))
}
