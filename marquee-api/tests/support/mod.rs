#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use marquee_api::state::{AppState, AuthConfig, WebhookSecrets};
use marquee_booking::BookingLifecycle;
use marquee_catalog::recommend::RecommendationService;
use marquee_catalog::{CatalogService, TmdbClient};
use marquee_core::booking::Booking;
use marquee_core::cache::{Cache, RateLimiter};
use marquee_core::movie::Movie;
use marquee_core::payment::{CheckoutSession, PaymentGateway};
use marquee_core::repository::{
    BookingRepository, BoxError, MovieRepository, SeatHoldError, ShowRepository, UserRepository,
};
use marquee_core::scheduler::JobScheduler;
use marquee_core::show::Show;
use marquee_core::user::User;
use marquee_shared::events::IdentitySync;
use marquee_store::app_config::BusinessRules;

pub const AUTH_SECRET: &str = "test-auth-secret";
pub const PAYMENTS_SECRET: &str = "whsec_payments";
pub const IDENTITY_SECRET: &str = "whsec_identity";

// ---------------------------------------------------------------------------
// In-memory repositories
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryMovies(Mutex<HashMap<i64, Movie>>);

impl MemoryMovies {
    pub fn seed(&self, id: i64, title: &str) -> Movie {
        let movie = Movie {
            id,
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
        };
        self.0.lock().unwrap().insert(id, movie.clone());
        movie
    }
}

#[async_trait]
impl MovieRepository for MemoryMovies {
    async fn get(&self, id: i64) -> Result<Option<Movie>, BoxError> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Movie>, BoxError> {
        let guard = self.0.lock().unwrap();
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }

    async fn insert(&self, movie: &Movie) -> Result<(), BoxError> {
        self.0
            .lock()
            .unwrap()
            .entry(movie.id)
            .or_insert_with(|| movie.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryShows(pub Mutex<HashMap<Uuid, Show>>);

impl MemoryShows {
    pub fn seed(&self, movie_id: i64, at: DateTime<Utc>, price_cents: i64) -> Show {
        let show = Show::new(movie_id, at, price_cents);
        self.0.lock().unwrap().insert(show.id, show.clone());
        show
    }

    pub fn occupied(&self, show_id: Uuid) -> HashMap<String, String> {
        self.0.lock().unwrap()[&show_id].occupied_seats.clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

#[async_trait]
impl ShowRepository for MemoryShows {
    async fn get(&self, id: Uuid) -> Result<Option<Show>, BoxError> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn insert_many(&self, shows: &[Show]) -> Result<(), BoxError> {
        let mut guard = self.0.lock().unwrap();
        for show in shows {
            guard.insert(show.id, show.clone());
        }
        Ok(())
    }

    async fn list_upcoming(&self) -> Result<Vec<Show>, BoxError> {
        let now = Utc::now();
        let mut shows: Vec<Show> = self
            .0
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.show_datetime >= now)
            .cloned()
            .collect();
        shows.sort_by_key(|s| s.show_datetime);
        Ok(shows)
    }

    async fn list_upcoming_for_movie(&self, movie_id: i64) -> Result<Vec<Show>, BoxError> {
        let now = Utc::now();
        let mut shows: Vec<Show> = self
            .0
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.movie_id == movie_id && s.show_datetime >= now)
            .cloned()
            .collect();
        shows.sort_by_key(|s| s.show_datetime);
        Ok(shows)
    }

    async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Show>, BoxError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.show_datetime >= from && s.show_datetime <= to)
            .cloned()
            .collect())
    }

    async fn release_seats(&self, show_id: Uuid, seats: &[String]) -> Result<(), BoxError> {
        let mut guard = self.0.lock().unwrap();
        if let Some(show) = guard.get_mut(&show_id) {
            for label in seats {
                show.occupied_seats.remove(label);
            }
        }
        Ok(())
    }
}

pub struct MemoryBookings {
    bookings: Mutex<HashMap<Uuid, Booking>>,
    shows: Arc<MemoryShows>,
}

impl MemoryBookings {
    pub fn new(shows: Arc<MemoryShows>) -> Self {
        Self {
            bookings: Mutex::new(HashMap::new()),
            shows,
        }
    }

    pub fn get_sync(&self, id: Uuid) -> Option<Booking> {
        self.bookings.lock().unwrap().get(&id).cloned()
    }

    pub fn force_paid(&self, id: Uuid) {
        if let Some(b) = self.bookings.lock().unwrap().get_mut(&id) {
            b.is_paid = true;
        }
    }
}

#[async_trait]
impl BookingRepository for MemoryBookings {
    async fn create_with_seats(
        &self,
        show_id: Uuid,
        user_id: &str,
        seats: &[String],
    ) -> Result<Booking, SeatHoldError> {
        let mut guard = self.shows.0.lock().unwrap();
        let show = guard
            .get_mut(&show_id)
            .ok_or(SeatHoldError::ShowNotFound(show_id))?;

        let clashes: Vec<String> = seats
            .iter()
            .filter(|label| show.occupied_seats.contains_key(*label))
            .cloned()
            .collect();
        if !clashes.is_empty() {
            return Err(SeatHoldError::Conflict(clashes));
        }

        for label in seats {
            show.occupied_seats
                .insert(label.clone(), user_id.to_string());
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            show_id,
            user_id: user_id.to_string(),
            booked_seats: seats.to_vec(),
            amount_cents: show.price_cents * seats.len() as i64,
            is_paid: false,
            payment_link: None,
            created_at: Utc::now(),
        };
        self.bookings
            .lock()
            .unwrap()
            .insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, BoxError> {
        Ok(self.bookings.lock().unwrap().get(&id).cloned())
    }

    async fn mark_paid(&self, id: Uuid) -> Result<bool, BoxError> {
        let mut guard = self.bookings.lock().unwrap();
        match guard.get_mut(&id) {
            Some(b) if !b.is_paid => {
                b.is_paid = true;
                b.payment_link = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_payment_link(&self, id: Uuid, url: &str) -> Result<(), BoxError> {
        if let Some(b) = self.bookings.lock().unwrap().get_mut(&id) {
            b.payment_link = Some(url.to_string());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), BoxError> {
        self.bookings.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BoxError> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn list_paid(&self) -> Result<Vec<Booking>, BoxError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.is_paid)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Booking>, BoxError> {
        Ok(self.bookings.lock().unwrap().values().cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryUsers(Mutex<HashMap<String, User>>);

impl MemoryUsers {
    pub fn seed(&self, id: &str, email: &str) -> User {
        let user = User {
            id: id.to_string(),
            name: format!("User {id}"),
            email: email.to_string(),
            image: String::new(),
            favorites: vec![],
        };
        self.0.lock().unwrap().insert(id.to_string(), user.clone());
        user
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn get(&self, id: &str) -> Result<Option<User>, BoxError> {
        Ok(self.0.lock().unwrap().get(id).cloned())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<User>, BoxError> {
        let guard = self.0.lock().unwrap();
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }

    async fn upsert(&self, user: &User) -> Result<(), BoxError> {
        self.0
            .lock()
            .unwrap()
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), BoxError> {
        self.0.lock().unwrap().remove(id);
        Ok(())
    }

    async fn set_favorites(&self, id: &str, favorites: &[i64]) -> Result<(), BoxError> {
        if let Some(user) = self.0.lock().unwrap().get_mut(id) {
            user.favorites = favorites.to_vec();
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>, BoxError> {
        Ok(self.0.lock().unwrap().values().cloned().collect())
    }

    async fn count(&self) -> Result<i64, BoxError> {
        Ok(self.0.lock().unwrap().len() as i64)
    }
}

// ---------------------------------------------------------------------------
// Fakes for external collaborators
// ---------------------------------------------------------------------------

pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, BoxError> {
        Ok(None)
    }

    async fn set_with_ttl(
        &self,
        _key: &str,
        _value: &str,
        _ttl_seconds: u64,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

pub struct NoopLimiter;

#[async_trait]
impl RateLimiter for NoopLimiter {
    async fn check(&self, _key: &str, _limit: i64, _window_seconds: i64) -> Result<bool, BoxError> {
        Ok(true)
    }
}

/// Records every scheduled job instead of persisting it.
#[derive(Default)]
pub struct RecordingScheduler {
    pub payment_checks: Mutex<Vec<(Uuid, DateTime<Utc>)>>,
    pub confirmations: Mutex<Vec<Uuid>>,
    pub announcements: Mutex<Vec<String>>,
    pub identity_syncs: Mutex<Vec<IdentitySync>>,
}

#[async_trait]
impl JobScheduler for RecordingScheduler {
    async fn schedule_payment_check(
        &self,
        booking_id: Uuid,
        due_at: DateTime<Utc>,
    ) -> Result<(), BoxError> {
        self.payment_checks
            .lock()
            .unwrap()
            .push((booking_id, due_at));
        Ok(())
    }

    async fn enqueue_confirmation_email(&self, booking_id: Uuid) -> Result<(), BoxError> {
        self.confirmations.lock().unwrap().push(booking_id);
        Ok(())
    }

    async fn enqueue_show_announcement(&self, movie_title: &str) -> Result<(), BoxError> {
        self.announcements
            .lock()
            .unwrap()
            .push(movie_title.to_string());
        Ok(())
    }

    async fn enqueue_identity_sync(&self, event: IdentitySync) -> Result<(), BoxError> {
        self.identity_syncs.lock().unwrap().push(event);
        Ok(())
    }
}

/// Checkout sessions keyed by payment intent, like the processor's API.
#[derive(Default)]
pub struct FakeGateway {
    sessions: Mutex<HashMap<String, CheckoutSession>>,
}

impl FakeGateway {
    pub fn intent_for(booking_id: Uuid) -> String {
        format!("pi_{}", booking_id.simple())
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        booking: &Booking,
        _movie_title: &str,
    ) -> Result<CheckoutSession, BoxError> {
        let intent = Self::intent_for(booking.id);
        let session = CheckoutSession {
            id: format!("cs_{}", booking.id.simple()),
            url: Some(format!("https://pay.test/{}", booking.id)),
            payment_intent: Some(intent.clone()),
            booking_id: Some(booking.id),
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(intent, session.clone());
        Ok(session)
    }

    async fn session_for_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<CheckoutSession>, BoxError> {
        Ok(self.sessions.lock().unwrap().get(intent_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Test app
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub state: AppState,
    pub movies: Arc<MemoryMovies>,
    pub shows: Arc<MemoryShows>,
    pub bookings: Arc<MemoryBookings>,
    pub users: Arc<MemoryUsers>,
    pub scheduler: Arc<RecordingScheduler>,
    pub gateway: Arc<FakeGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        let movies = Arc::new(MemoryMovies::default());
        let shows = Arc::new(MemoryShows::default());
        let bookings = Arc::new(MemoryBookings::new(shows.clone()));
        let users = Arc::new(MemoryUsers::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let gateway = Arc::new(FakeGateway::default());

        // Unroutable catalog endpoint; tests never reach it.
        let tmdb = TmdbClient::new("http://127.0.0.1:9", "", 1).unwrap();
        let catalog = Arc::new(CatalogService::new(
            tmdb,
            movies.clone(),
            Arc::new(NoopCache),
            60,
        ));
        let recommendations = Arc::new(RecommendationService::new(
            None,
            movies.clone(),
            shows.clone(),
        ));
        let lifecycle = Arc::new(BookingLifecycle::new(bookings.clone(), shows.clone()));

        let state = AppState {
            movies: movies.clone(),
            shows: shows.clone(),
            bookings: bookings.clone(),
            users: users.clone(),
            lifecycle,
            catalog,
            recommendations,
            payments: gateway.clone(),
            scheduler: scheduler.clone(),
            rate_limiter: Arc::new(NoopLimiter),
            auth: AuthConfig {
                secret: AUTH_SECRET.to_string(),
            },
            webhooks: WebhookSecrets {
                payments: PAYMENTS_SECRET.to_string(),
                identity: IDENTITY_SECRET.to_string(),
            },
            rules: BusinessRules {
                hold_expiry_seconds: 600,
                reminder_lookahead_hours: 8,
                reminder_cron: "0 0 */8 * * *".to_string(),
                recommendation_count: 10,
                rate_limit_per_minute: 100,
            },
        };

        Self {
            state,
            movies,
            shows,
            bookings,
            users,
            scheduler,
            gateway,
        }
    }

    pub fn router(&self) -> Router {
        marquee_api::app(self.state.clone())
    }

    pub fn token(&self, sub: &str, role: &str) -> String {
        let claims = json!({
            "sub": sub,
            "email": format!("{sub}@example.com"),
            "name": sub,
            "role": role,
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(AUTH_SECRET.as_bytes()),
        )
        .unwrap()
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn signed_webhook(uri: &str, header_name: &str, secret: &str, body: Value) -> Request<Body> {
    let raw = body.to_string();
    let timestamp = Utc::now().timestamp();
    let signature = marquee_api::signature::sign(secret, timestamp, raw.as_bytes());
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header(header_name, format!("t={timestamp},v1={signature}"))
        .body(Body::from(raw))
        .unwrap()
}
