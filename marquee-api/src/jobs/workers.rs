use std::str::FromStr;
use std::sync::Arc;

use apalis::prelude::*;
use apalis_cron::{CronStream, Schedule};
use chrono::Duration;
use tracing::{debug, error, info, warn};

use marquee_booking::{BookingLifecycle, ExpiryOutcome};
use marquee_core::repository::UserRepository;
use marquee_core::user::User;
use marquee_notify::{NotificationService, NotifyError};
use marquee_shared::events::{
    ConfirmationEmail, IdentitySync, PaymentCheck, ReminderTick, ShowAnnouncement,
};

use super::queues::Queues;

/// Shared context handed to every worker.
#[derive(Clone)]
pub struct JobContext {
    pub lifecycle: Arc<BookingLifecycle>,
    pub notifications: Arc<NotificationService>,
    pub users: Arc<dyn UserRepository>,
    pub reminder_lookahead_hours: i64,
}

fn failed(e: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::Failed(Arc::new(Box::new(e) as Box<dyn std::error::Error + Send + Sync>))
}

/// Hold-expiry check. Returning an error requeues the job, so a transient
/// storage failure never silently strands held seats.
async fn check_payment(job: PaymentCheck, ctx: Data<JobContext>) -> Result<(), Error> {
    match ctx.lifecycle.expire_if_unpaid(job.booking_id).await {
        Ok(ExpiryOutcome::Expired { seats_released }) => {
            info!(booking_id = %job.booking_id, seats_released, "hold expired");
            Ok(())
        }
        Ok(ExpiryOutcome::AlreadyResolved) => {
            debug!(booking_id = %job.booking_id, "hold already resolved");
            Ok(())
        }
        Err(e) => {
            error!(booking_id = %job.booking_id, "hold expiry failed, will retry: {e}");
            Err(failed(e))
        }
    }
}

/// Confirmation email after a successful payment. Missing records mean the
/// booking was resolved elsewhere; only delivery failures are retried.
async fn send_confirmation(job: ConfirmationEmail, ctx: Data<JobContext>) -> Result<(), Error> {
    match ctx
        .notifications
        .send_booking_confirmation(job.booking_id)
        .await
    {
        Ok(()) => Ok(()),
        Err(
            e @ (NotifyError::BookingNotFound(_)
            | NotifyError::ShowNotFound(_)
            | NotifyError::MovieNotFound(_)
            | NotifyError::UserNotFound(_)),
        ) => {
            warn!(booking_id = %job.booking_id, "skipping confirmation email: {e}");
            Ok(())
        }
        Err(e) => {
            error!(booking_id = %job.booking_id, "confirmation email failed, will retry: {e}");
            Err(failed(e))
        }
    }
}

/// New-show announcement fan-out. Partial failure is already handled inside
/// the dispatcher, so the job itself always completes.
async fn announce_show(job: ShowAnnouncement, ctx: Data<JobContext>) -> Result<(), Error> {
    match ctx.notifications.announce_new_show(&job.movie_title).await {
        Ok(summary) => {
            info!(
                movie = %job.movie_title,
                sent = summary.sent,
                failed = summary.failed,
                "show announcement dispatched"
            );
        }
        Err(e) => error!(movie = %job.movie_title, "show announcement failed: {e}"),
    }
    Ok(())
}

/// Cron-driven reminder fan-out over shows starting within the lookahead.
async fn send_reminders(job: ReminderTick, ctx: Data<JobContext>) -> Result<(), Error> {
    let lookahead = Duration::hours(ctx.reminder_lookahead_hours);
    match ctx
        .notifications
        .collect_reminder_tasks(job.scheduled_at, lookahead)
        .await
    {
        Ok(tasks) => {
            if tasks.is_empty() {
                debug!("no reminders to send");
                return Ok(());
            }
            let summary = ctx.notifications.dispatch_reminders(tasks).await;
            info!(sent = summary.sent, failed = summary.failed, "reminders dispatched");
        }
        Err(e) => error!("reminder collection failed: {e}"),
    }
    Ok(())
}

/// Mirror identity-provider lifecycle events. Upsert and delete are both
/// idempotent, so at-least-once delivery is safe.
async fn sync_identity(job: IdentitySync, ctx: Data<JobContext>) -> Result<(), Error> {
    let result = match &job {
        IdentitySync::Upserted {
            id,
            name,
            email,
            image,
        } => {
            let user = User {
                id: id.clone(),
                name: name.clone(),
                email: email.clone(),
                image: image.clone(),
                favorites: Vec::new(),
            };
            ctx.users.upsert(&user).await
        }
        IdentitySync::Deleted { id } => ctx.users.delete(id).await,
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("identity sync failed, will retry: {e}");
            Err(Error::Failed(Arc::new(e)))
        }
    }
}

/// Run every worker under one monitor until shutdown.
pub async fn run(queues: Queues, ctx: JobContext, reminder_cron: &str) -> std::io::Result<()> {
    let schedule = Schedule::from_str(reminder_cron)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let reminder_backend = CronStream::new(schedule).pipe_to_storage(queues.reminders.clone());

    info!("starting background workers");

    Monitor::new()
        .register(
            WorkerBuilder::new("payment-check")
                .data(ctx.clone())
                .backend(queues.payment_check.clone())
                .build_fn(check_payment),
        )
        .register(
            WorkerBuilder::new("confirmation-email")
                .data(ctx.clone())
                .backend(queues.confirmation_email.clone())
                .build_fn(send_confirmation),
        )
        .register(
            WorkerBuilder::new("show-announcement")
                .data(ctx.clone())
                .backend(queues.show_announcement.clone())
                .build_fn(announce_show),
        )
        .register(
            WorkerBuilder::new("identity-sync")
                .data(ctx.clone())
                .backend(queues.identity_sync.clone())
                .build_fn(sync_identity),
        )
        .register(
            WorkerBuilder::new("show-reminders")
                .data(ctx)
                .backend(reminder_backend)
                .build_fn(send_reminders),
        )
        .run()
        .await
}
