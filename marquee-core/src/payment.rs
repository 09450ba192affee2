use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::Booking;
use crate::repository::BoxError;

/// A checkout session at the external payment processor. The processor holds
/// the booking id in session metadata; the webhook resolves it back from the
/// payment intent through `session_for_payment_intent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub payment_intent: Option<String>,
    pub booking_id: Option<Uuid>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a checkout session for a pending booking, tagging it with the
    /// booking id so the success webhook can be resolved later.
    async fn create_checkout_session(
        &self,
        booking: &Booking,
        movie_title: &str,
    ) -> Result<CheckoutSession, BoxError>;

    /// Look up the checkout session that produced a payment intent.
    async fn session_for_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<CheckoutSession>, BoxError>;
}
