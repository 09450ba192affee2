use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::Booking;
use crate::movie::Movie;
use crate::show::Show;
use crate::user::User;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure modes of the transactional seat-hold acquisition. The conflict
/// case carries the clashing labels so the caller can surface them.
#[derive(Debug, thiserror::Error)]
pub enum SeatHoldError {
    #[error("seats already held: {}", .0.join(", "))]
    Conflict(Vec<String>),

    #[error("show not found: {0}")]
    ShowNotFound(Uuid),

    #[error("storage error: {0}")]
    Store(BoxError),
}

/// Repository trait for movie metadata access
#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Movie>, BoxError>;

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Movie>, BoxError>;

    /// Write-once insert: an existing row with the same id is left untouched.
    async fn insert(&self, movie: &Movie) -> Result<(), BoxError>;
}

/// Repository trait for show data access
#[async_trait]
pub trait ShowRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Show>, BoxError>;

    async fn insert_many(&self, shows: &[Show]) -> Result<(), BoxError>;

    async fn list_upcoming(&self) -> Result<Vec<Show>, BoxError>;

    async fn list_upcoming_for_movie(&self, movie_id: i64) -> Result<Vec<Show>, BoxError>;

    async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Show>, BoxError>;

    /// Remove seat labels from a show's occupancy map. Labels already absent
    /// and shows that no longer exist are treated as already satisfied.
    async fn release_seats(&self, show_id: Uuid, seats: &[String]) -> Result<(), BoxError>;
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Atomically mark the requested seats occupied on the show and create
    /// the pending booking row. Serialized per show; on any seat conflict
    /// nothing is written.
    async fn create_with_seats(
        &self,
        show_id: Uuid,
        user_id: &str,
        seats: &[String],
    ) -> Result<Booking, SeatHoldError>;

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, BoxError>;

    /// Set `is_paid = true`. Returns `true` if the row transitioned, `false`
    /// if it was already paid or does not exist (idempotent).
    async fn mark_paid(&self, id: Uuid) -> Result<bool, BoxError>;

    async fn set_payment_link(&self, id: Uuid, url: &str) -> Result<(), BoxError>;

    async fn delete(&self, id: Uuid) -> Result<(), BoxError>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BoxError>;

    async fn list_paid(&self) -> Result<Vec<Booking>, BoxError>;

    async fn list_all(&self) -> Result<Vec<Booking>, BoxError>;
}

/// Repository trait for mirrored identity records
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<User>, BoxError>;

    async fn get_many(&self, ids: &[String]) -> Result<Vec<User>, BoxError>;

    async fn upsert(&self, user: &User) -> Result<(), BoxError>;

    async fn delete(&self, id: &str) -> Result<(), BoxError>;

    async fn set_favorites(&self, id: &str, favorites: &[i64]) -> Result<(), BoxError>;

    async fn list_all(&self) -> Result<Vec<User>, BoxError>;

    async fn count(&self) -> Result<i64, BoxError>;
}
