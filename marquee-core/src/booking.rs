use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived booking state. A booking row never stores this directly: `Paid`
/// is `is_paid = true`, and an expired booking is deleted rather than kept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Paid,
}

/// A single reservation attempt against a show.
///
/// Created with `is_paid = false` and its seats written into the show's
/// occupancy map in the same transaction. Transitions to paid exclusively
/// via payment confirmation; an unpaid booking is deleted at its hold-expiry
/// deadline. A paid booking is immutable and permanent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub show_id: Uuid,
    pub user_id: String,
    pub booked_seats: Vec<String>,
    pub amount_cents: i64,
    pub is_paid: bool,
    pub payment_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn status(&self) -> BookingStatus {
        if self.is_paid {
            BookingStatus::Paid
        } else {
            BookingStatus::Pending
        }
    }
}
