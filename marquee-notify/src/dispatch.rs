use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use marquee_core::email::EmailSender;
use marquee_core::repository::{
    BookingRepository, BoxError, MovieRepository, ShowRepository, UserRepository,
};

use crate::templates;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("email delivery failed: {0}")]
    Delivery(String),

    #[error("booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("show not found: {0}")]
    ShowNotFound(Uuid),

    #[error("movie not found: {0}")]
    MovieNotFound(i64),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("storage error: {0}")]
    Store(BoxError),
}

/// Outcome of a fan-out dispatch. Per-recipient failures are counted, never
/// escalated; partial success is success.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
}

/// One reminder email to send.
#[derive(Debug, Clone)]
pub struct ReminderTask {
    pub email: String,
    pub user_name: String,
    pub movie_title: String,
    pub show_datetime: DateTime<Utc>,
}

/// The reminder fan-out window: shows starting within `lookahead` from now.
pub fn reminder_window(now: DateTime<Utc>, lookahead: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now + lookahead)
}

/// Best-effort email dispatch for booking confirmations, show reminders and
/// new-show announcements.
pub struct NotificationService {
    mailer: Arc<dyn EmailSender>,
    bookings: Arc<dyn BookingRepository>,
    shows: Arc<dyn ShowRepository>,
    movies: Arc<dyn MovieRepository>,
    users: Arc<dyn UserRepository>,
}

impl NotificationService {
    pub fn new(
        mailer: Arc<dyn EmailSender>,
        bookings: Arc<dyn BookingRepository>,
        shows: Arc<dyn ShowRepository>,
        movies: Arc<dyn MovieRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            mailer,
            bookings,
            shows,
            movies,
            users,
        }
    }

    /// Send the confirmation email for a paid booking. Invoked once per
    /// payment confirmation; a duplicate invocation sends a duplicate email,
    /// which is harmless by design of the caller's idempotency contract.
    pub async fn send_booking_confirmation(&self, booking_id: Uuid) -> Result<(), NotifyError> {
        let booking = self
            .bookings
            .get(booking_id)
            .await
            .map_err(NotifyError::Store)?
            .ok_or(NotifyError::BookingNotFound(booking_id))?;

        let show = self
            .shows
            .get(booking.show_id)
            .await
            .map_err(NotifyError::Store)?
            .ok_or(NotifyError::ShowNotFound(booking.show_id))?;

        let movie = self
            .movies
            .get(show.movie_id)
            .await
            .map_err(NotifyError::Store)?
            .ok_or(NotifyError::MovieNotFound(show.movie_id))?;

        let user = self
            .users
            .get(&booking.user_id)
            .await
            .map_err(NotifyError::Store)?
            .ok_or_else(|| NotifyError::UserNotFound(booking.user_id.clone()))?;

        let (subject, body) = templates::booking_confirmation(
            &user.name,
            &movie.title,
            show.show_datetime,
            &booking.booked_seats,
            booking.amount_cents,
        );

        self.mailer
            .send(&user.email, &subject, &body)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        info!(booking_id = %booking_id, to = %user.email, "confirmation email sent");
        Ok(())
    }

    /// Collect one reminder task per (seat-holding user, show) pair for
    /// shows starting inside the window. Shows with an unknown movie and
    /// users that are no longer mirrored are skipped, not fatal.
    pub async fn collect_reminder_tasks(
        &self,
        now: DateTime<Utc>,
        lookahead: Duration,
    ) -> Result<Vec<ReminderTask>, NotifyError> {
        let (from, to) = reminder_window(now, lookahead);
        let shows = self
            .shows
            .list_between(from, to)
            .await
            .map_err(NotifyError::Store)?;

        let mut tasks = Vec::new();
        for show in shows {
            let holders = show.holding_users();
            if holders.is_empty() {
                continue;
            }

            let movie = match self.movies.get(show.movie_id).await.map_err(NotifyError::Store)? {
                Some(m) => m,
                None => {
                    warn!(show_id = %show.id, movie_id = show.movie_id, "skipping reminder for unknown movie");
                    continue;
                }
            };

            let users = self
                .users
                .get_many(&holders)
                .await
                .map_err(NotifyError::Store)?;
            let by_id: HashMap<&str, _> = users.iter().map(|u| (u.id.as_str(), u)).collect();

            for holder in &holders {
                if let Some(user) = by_id.get(holder.as_str()) {
                    tasks.push(ReminderTask {
                        email: user.email.clone(),
                        user_name: user.name.clone(),
                        movie_title: movie.title.clone(),
                        show_datetime: show.show_datetime,
                    });
                }
            }
        }
        Ok(tasks)
    }

    /// Fan the reminder tasks out concurrently, counting per-recipient
    /// failures instead of propagating them.
    pub async fn dispatch_reminders(&self, tasks: Vec<ReminderTask>) -> DispatchSummary {
        let sends = tasks.into_iter().map(|task| {
            let mailer = self.mailer.clone();
            async move {
                let (subject, body) =
                    templates::show_reminder(&task.user_name, &task.movie_title, task.show_datetime);
                match mailer.send(&task.email, &subject, &body).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(to = %task.email, "reminder delivery failed: {e}");
                        false
                    }
                }
            }
        });

        let results = join_all(sends).await;
        let sent = results.iter().filter(|ok| **ok).count();
        let summary = DispatchSummary {
            sent,
            failed: results.len() - sent,
        };
        info!(sent = summary.sent, failed = summary.failed, "reminder dispatch complete");
        summary
    }

    /// Announce newly added shows for a movie to every registered user.
    pub async fn announce_new_show(&self, movie_title: &str) -> Result<DispatchSummary, NotifyError> {
        let users = self.users.list_all().await.map_err(NotifyError::Store)?;

        let sends = users.into_iter().map(|user| {
            let mailer = self.mailer.clone();
            let title = movie_title.to_string();
            async move {
                let (subject, body) = templates::new_show_alert(&user.name, &title);
                match mailer.send(&user.email, &subject, &body).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(to = %user.email, "announcement delivery failed: {e}");
                        false
                    }
                }
            }
        });

        let results = join_all(sends).await;
        let sent = results.iter().filter(|ok| **ok).count();
        let summary = DispatchSummary {
            sent,
            failed: results.len() - sent,
        };
        info!(
            movie = movie_title,
            sent = summary.sent,
            failed = summary.failed,
            "new-show announcement complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use marquee_core::booking::Booking;
    use marquee_core::movie::Movie;
    use marquee_core::repository::SeatHoldError;
    use marquee_core::show::Show;
    use marquee_core::user::User;

    /// Mailer that records sends and fails for configured addresses.
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
        fail_for: Mutex<Vec<String>>,
    }

    impl RecordingMailer {
        fn failing_for(addresses: &[&str]) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: Mutex::new(addresses.iter().map(|s| s.to_string()).collect()),
            }
        }

        fn sent_to(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
        }
    }

    #[async_trait]
    impl EmailSender for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), BoxError> {
            if self.fail_for.lock().unwrap().iter().any(|a| a == to) {
                return Err(format!("mailbox unavailable: {to}").into());
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    struct MemoryUsers(HashMap<String, User>);

    impl MemoryUsers {
        fn with(users: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self(
                users
                    .iter()
                    .map(|(id, email)| {
                        (
                            id.to_string(),
                            User {
                                id: id.to_string(),
                                name: format!("User {id}"),
                                email: email.to_string(),
                                image: String::new(),
                                favorites: vec![],
                            },
                        )
                    })
                    .collect(),
            ))
        }
    }

    #[async_trait]
    impl UserRepository for MemoryUsers {
        async fn get(&self, id: &str) -> Result<Option<User>, BoxError> {
            Ok(self.0.get(id).cloned())
        }

        async fn get_many(&self, ids: &[String]) -> Result<Vec<User>, BoxError> {
            Ok(ids.iter().filter_map(|id| self.0.get(id).cloned()).collect())
        }

        async fn upsert(&self, _user: &User) -> Result<(), BoxError> {
            Ok(())
        }

        async fn delete(&self, _id: &str) -> Result<(), BoxError> {
            Ok(())
        }

        async fn set_favorites(&self, _id: &str, _favorites: &[i64]) -> Result<(), BoxError> {
            Ok(())
        }

        async fn list_all(&self) -> Result<Vec<User>, BoxError> {
            let mut users: Vec<User> = self.0.values().cloned().collect();
            users.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(users)
        }

        async fn count(&self) -> Result<i64, BoxError> {
            Ok(self.0.len() as i64)
        }
    }

    struct MemoryShows(Vec<Show>);

    #[async_trait]
    impl ShowRepository for MemoryShows {
        async fn get(&self, id: Uuid) -> Result<Option<Show>, BoxError> {
            Ok(self.0.iter().find(|s| s.id == id).cloned())
        }

        async fn insert_many(&self, _shows: &[Show]) -> Result<(), BoxError> {
            Ok(())
        }

        async fn list_upcoming(&self) -> Result<Vec<Show>, BoxError> {
            Ok(self.0.clone())
        }

        async fn list_upcoming_for_movie(&self, _movie_id: i64) -> Result<Vec<Show>, BoxError> {
            Ok(vec![])
        }

        async fn list_between(
            &self,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> Result<Vec<Show>, BoxError> {
            Ok(self
                .0
                .iter()
                .filter(|s| s.show_datetime >= from && s.show_datetime <= to)
                .cloned()
                .collect())
        }

        async fn release_seats(&self, _show_id: Uuid, _seats: &[String]) -> Result<(), BoxError> {
            Ok(())
        }
    }

    struct MemoryMovies(HashMap<i64, Movie>);

    impl MemoryMovies {
        fn with(titles: &[(i64, &str)]) -> Arc<Self> {
            Arc::new(Self(
                titles
                    .iter()
                    .map(|(id, title)| {
                        (
                            *id,
                            Movie {
                                id: *id,
                                title: title.to_string(),
                                overview: String::new(),
                                poster_path: None,
                                backdrop_path: None,
                                genres: vec![],
                                casts: vec![],
                                release_date: None,
                                original_language: None,
                                tagline: String::new(),
                                vote_average: 0.0,
                                runtime_minutes: None,
                            },
                        )
                    })
                    .collect(),
            ))
        }
    }

    #[async_trait]
    impl MovieRepository for MemoryMovies {
        async fn get(&self, id: i64) -> Result<Option<Movie>, BoxError> {
            Ok(self.0.get(&id).cloned())
        }

        async fn get_many(&self, ids: &[i64]) -> Result<Vec<Movie>, BoxError> {
            Ok(ids.iter().filter_map(|id| self.0.get(id).cloned()).collect())
        }

        async fn insert(&self, _movie: &Movie) -> Result<(), BoxError> {
            Ok(())
        }
    }

    struct NoBookings;

    #[async_trait]
    impl BookingRepository for NoBookings {
        async fn create_with_seats(
            &self,
            show_id: Uuid,
            _user_id: &str,
            _seats: &[String],
        ) -> Result<Booking, SeatHoldError> {
            Err(SeatHoldError::ShowNotFound(show_id))
        }

        async fn get(&self, _id: Uuid) -> Result<Option<Booking>, BoxError> {
            Ok(None)
        }

        async fn mark_paid(&self, _id: Uuid) -> Result<bool, BoxError> {
            Ok(false)
        }

        async fn set_payment_link(&self, _id: Uuid, _url: &str) -> Result<(), BoxError> {
            Ok(())
        }

        async fn delete(&self, _id: Uuid) -> Result<(), BoxError> {
            Ok(())
        }

        async fn list_for_user(&self, _user_id: &str) -> Result<Vec<Booking>, BoxError> {
            Ok(vec![])
        }

        async fn list_paid(&self) -> Result<Vec<Booking>, BoxError> {
            Ok(vec![])
        }

        async fn list_all(&self) -> Result<Vec<Booking>, BoxError> {
            Ok(vec![])
        }
    }

    fn show_at(movie_id: i64, at: DateTime<Utc>, seats: &[(&str, &str)]) -> Show {
        let mut show = Show::new(movie_id, at, 1000);
        for (label, user) in seats {
            show.occupied_seats
                .insert(label.to_string(), user.to_string());
        }
        show
    }

    fn service(
        mailer: Arc<RecordingMailer>,
        shows: Vec<Show>,
        movies: Arc<MemoryMovies>,
        users: Arc<MemoryUsers>,
    ) -> NotificationService {
        NotificationService::new(
            mailer,
            Arc::new(NoBookings),
            Arc::new(MemoryShows(shows)),
            movies,
            users,
        )
    }

    #[tokio::test]
    async fn window_includes_only_shows_within_lookahead() {
        let now = Utc::now();
        let mailer = Arc::new(RecordingMailer::default());
        let svc = service(
            mailer,
            vec![
                show_at(1, now + Duration::minutes(7 * 60 + 59), &[("A1", "u1")]),
                show_at(1, now + Duration::minutes(8 * 60 + 1), &[("A2", "u2")]),
                show_at(1, now - Duration::minutes(1), &[("A3", "u3")]),
            ],
            MemoryMovies::with(&[(1, "Arrival")]),
            MemoryUsers::with(&[("u1", "u1@example.com"), ("u2", "u2@example.com"), ("u3", "u3@example.com")]),
        );

        let tasks = svc
            .collect_reminder_tasks(now, Duration::hours(8))
            .await
            .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].email, "u1@example.com");
    }

    #[tokio::test]
    async fn a_user_holding_many_seats_gets_one_reminder_per_show() {
        let now = Utc::now();
        let mailer = Arc::new(RecordingMailer::default());
        let svc = service(
            mailer,
            vec![show_at(
                1,
                now + Duration::hours(2),
                &[("A1", "u1"), ("A2", "u1"), ("B1", "u2")],
            )],
            MemoryMovies::with(&[(1, "Arrival")]),
            MemoryUsers::with(&[("u1", "u1@example.com"), ("u2", "u2@example.com")]),
        );

        let tasks = svc
            .collect_reminder_tasks(now, Duration::hours(8))
            .await
            .unwrap();

        let mut emails: Vec<&str> = tasks.iter().map(|t| t.email.as_str()).collect();
        emails.sort();
        assert_eq!(emails, vec!["u1@example.com", "u2@example.com"]);
    }

    #[tokio::test]
    async fn reminder_failures_are_counted_not_escalated() {
        let now = Utc::now();
        let mailer = Arc::new(RecordingMailer::failing_for(&["u2@example.com"]));
        let svc = service(
            mailer.clone(),
            vec![show_at(
                1,
                now + Duration::hours(1),
                &[("A1", "u1"), ("B1", "u2"), ("C1", "u3")],
            )],
            MemoryMovies::with(&[(1, "Arrival")]),
            MemoryUsers::with(&[
                ("u1", "u1@example.com"),
                ("u2", "u2@example.com"),
                ("u3", "u3@example.com"),
            ]),
        );

        let tasks = svc
            .collect_reminder_tasks(now, Duration::hours(8))
            .await
            .unwrap();
        let summary = svc.dispatch_reminders(tasks).await;

        assert_eq!(summary, DispatchSummary { sent: 2, failed: 1 });
        assert!(!mailer.sent_to().contains(&"u2@example.com".to_string()));
    }

    #[tokio::test]
    async fn announcement_reaches_every_user_with_partial_failures() {
        let mailer = Arc::new(RecordingMailer::failing_for(&["b@example.com"]));
        let svc = service(
            mailer.clone(),
            vec![],
            MemoryMovies::with(&[]),
            MemoryUsers::with(&[("a", "a@example.com"), ("b", "b@example.com")]),
        );

        let summary = svc.announce_new_show("Arrival").await.unwrap();

        assert_eq!(summary, DispatchSummary { sent: 1, failed: 1 });
        assert_eq!(mailer.sent_to(), vec!["a@example.com".to_string()]);
    }
}
