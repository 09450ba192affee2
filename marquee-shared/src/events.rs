use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delayed one-shot job: re-check a booking's payment state at its
/// hold-expiry deadline and release the seats if it is still unpaid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCheck {
    pub booking_id: Uuid,
}

/// Send the booking confirmation email for a paid booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationEmail {
    pub booking_id: Uuid,
}

/// Announce newly added shows for a movie to every registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowAnnouncement {
    pub movie_title: String,
}

/// Cron tick for the reminder fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderTick {
    pub scheduled_at: DateTime<Utc>,
}

impl From<DateTime<Utc>> for ReminderTick {
    fn from(dt: DateTime<Utc>) -> Self {
        ReminderTick { scheduled_at: dt }
    }
}

/// Identity-provider lifecycle event, mirrored into the local user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentitySync {
    Upserted {
        id: String,
        name: String,
        email: String,
        image: String,
    },
    Deleted {
        id: String,
    },
}
