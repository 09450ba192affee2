use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use marquee_core::booking::Booking;
use marquee_core::payment::{CheckoutSession, PaymentGateway};
use marquee_core::repository::BoxError;

#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    url: Option<String>,
    payment_intent: Option<String>,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl SessionObject {
    fn into_session(self) -> CheckoutSession {
        let booking_id = self
            .metadata
            .get("booking_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());

        CheckoutSession {
            id: self.id,
            url: self.url,
            payment_intent: self.payment_intent,
            booking_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionList {
    #[serde(default)]
    data: Vec<SessionObject>,
}

/// Payment gateway adapter over the processor's REST API.
///
/// Checkout sessions carry the booking id in metadata; the success webhook
/// resolves a payment intent back to its session to recover that id.
#[derive(Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
    currency: String,
    success_url: String,
    cancel_url: String,
}

impl StripeGateway {
    pub fn new(
        api_base: &str,
        secret_key: &str,
        currency: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
            currency: currency.to_string(),
            success_url: success_url.to_string(),
            cancel_url: cancel_url.to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        booking: &Booking,
        movie_title: &str,
    ) -> Result<CheckoutSession, BoxError> {
        let amount = booking.amount_cents.to_string();
        let quantity = "1";
        let product_name = format!("{movie_title} Tickets");
        let booking_id = booking.id.to_string();

        let params: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("success_url", &self.success_url),
            ("cancel_url", &self.cancel_url),
            ("line_items[0][price_data][currency]", &self.currency),
            ("line_items[0][price_data][product_data][name]", &product_name),
            ("line_items[0][price_data][unit_amount]", &amount),
            ("line_items[0][quantity]", quantity),
            ("metadata[booking_id]", &booking_id),
        ];

        let session: SessionObject = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(booking_id = %booking.id, session_id = %session.id, "checkout session created");
        Ok(session.into_session())
    }

    async fn session_for_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<CheckoutSession>, BoxError> {
        let list: SessionList = self
            .http
            .get(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .query(&[("payment_intent", intent_id)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(list.data.into_iter().next().map(SessionObject::into_session))
    }
}
