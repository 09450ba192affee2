use apalis::prelude::Storage;
use apalis_sql::postgres::PostgresStorage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use marquee_core::repository::BoxError;
use marquee_core::scheduler::JobScheduler;
use marquee_shared::events::{
    ConfirmationEmail, IdentitySync, PaymentCheck, ReminderTick, ShowAnnouncement,
};

/// One durable Postgres-backed queue per job type.
#[derive(Clone)]
pub struct Queues {
    pub payment_check: PostgresStorage<PaymentCheck>,
    pub confirmation_email: PostgresStorage<ConfirmationEmail>,
    pub show_announcement: PostgresStorage<ShowAnnouncement>,
    pub identity_sync: PostgresStorage<IdentitySync>,
    pub reminders: PostgresStorage<ReminderTick>,
}

impl Queues {
    /// Run the job-runner migrations and open the queues.
    pub async fn setup(pool: &PgPool) -> Result<Self, sqlx::Error> {
        PostgresStorage::setup(pool).await?;

        Ok(Self {
            payment_check: PostgresStorage::new(pool.clone()),
            confirmation_email: PostgresStorage::new(pool.clone()),
            show_announcement: PostgresStorage::new(pool.clone()),
            identity_sync: PostgresStorage::new(pool.clone()),
            reminders: PostgresStorage::new(pool.clone()),
        })
    }
}

/// Durable scheduler over the apalis queues. Jobs are persisted before the
/// enqueue returns, so they survive restarts and fire at least once.
pub struct ApalisScheduler {
    queues: Queues,
}

impl ApalisScheduler {
    pub fn new(queues: Queues) -> Self {
        Self { queues }
    }
}

#[async_trait]
impl JobScheduler for ApalisScheduler {
    async fn schedule_payment_check(
        &self,
        booking_id: Uuid,
        due_at: DateTime<Utc>,
    ) -> Result<(), BoxError> {
        let mut storage = self.queues.payment_check.clone();
        storage
            .schedule(PaymentCheck { booking_id }, due_at.timestamp())
            .await
            .map_err(|e| Box::new(e) as BoxError)?;
        Ok(())
    }

    async fn enqueue_confirmation_email(&self, booking_id: Uuid) -> Result<(), BoxError> {
        let mut storage = self.queues.confirmation_email.clone();
        storage
            .push(ConfirmationEmail { booking_id })
            .await
            .map_err(|e| Box::new(e) as BoxError)?;
        Ok(())
    }

    async fn enqueue_show_announcement(&self, movie_title: &str) -> Result<(), BoxError> {
        let mut storage = self.queues.show_announcement.clone();
        storage
            .push(ShowAnnouncement {
                movie_title: movie_title.to_string(),
            })
            .await
            .map_err(|e| Box::new(e) as BoxError)?;
        Ok(())
    }

    async fn enqueue_identity_sync(&self, event: IdentitySync) -> Result<(), BoxError> {
        let mut storage = self.queues.identity_sync.clone();
        storage
            .push(event)
            .await
            .map_err(|e| Box::new(e) as BoxError)?;
        Ok(())
    }
}
