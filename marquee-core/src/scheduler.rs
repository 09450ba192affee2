use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::repository::BoxError;
use marquee_shared::events::IdentitySync;

/// Durable at-least-once job submission. Implementations persist the job
/// before returning, so scheduled work survives process restarts and may run
/// on a different instance than the one that enqueued it.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// One-shot payment check, to run no earlier than `due_at`.
    async fn schedule_payment_check(
        &self,
        booking_id: Uuid,
        due_at: DateTime<Utc>,
    ) -> Result<(), BoxError>;

    async fn enqueue_confirmation_email(&self, booking_id: Uuid) -> Result<(), BoxError>;

    async fn enqueue_show_announcement(&self, movie_title: &str) -> Result<(), BoxError>;

    async fn enqueue_identity_sync(&self, event: IdentitySync) -> Result<(), BoxError>;
}
