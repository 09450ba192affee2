use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee_api::jobs::{ApalisScheduler, JobContext, Queues};
use marquee_api::state::{AppState, AuthConfig, WebhookSecrets};
use marquee_api::{app, jobs};
use marquee_booking::BookingLifecycle;
use marquee_catalog::recommend::{RecommenderClient, RecommendationService};
use marquee_catalog::{CatalogService, TmdbClient};
use marquee_notify::{NotificationService, SmtpMailer};
use marquee_store::{
    DbClient, RedisCache, StoreBookingRepository, StoreMovieRepository, StoreShowRepository,
    StoreUserRepository, StripeGateway,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = marquee_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Redis
    let cache = Arc::new(
        RedisCache::new(&config.redis.url)
            .await
            .expect("Failed to connect to Redis"),
    );

    // Repositories
    let movies = Arc::new(StoreMovieRepository::new(db.pool.clone()));
    let shows = Arc::new(StoreShowRepository::new(db.pool.clone()));
    let bookings = Arc::new(StoreBookingRepository::new(db.pool.clone()));
    let users = Arc::new(StoreUserRepository::new(db.pool.clone()));

    // External services
    let tmdb = TmdbClient::new(
        &config.catalog.base_url,
        &config.catalog.api_token,
        config.catalog.timeout_seconds,
    )
    .expect("Failed to build catalog client");

    let recommender = config
        .recommender
        .base_url
        .as_deref()
        .map(|url| {
            RecommenderClient::new(url, config.recommender.timeout_seconds)
                .expect("Failed to build recommender client")
        });

    let payments = Arc::new(
        StripeGateway::new(
            &config.payments.api_base,
            &config.payments.secret_key,
            &config.payments.currency,
            &config.payments.success_url,
            &config.payments.cancel_url,
        )
        .expect("Failed to build payment gateway"),
    );

    let mailer = Arc::new(SmtpMailer::new(
        config.smtp.server.clone(),
        config.smtp.port,
        config.smtp.username.clone(),
        config.smtp.password.clone(),
        config.smtp.from_email.clone(),
        config.smtp.from_name.clone(),
    ));

    // Domain services
    let catalog = Arc::new(CatalogService::new(
        tmdb,
        movies.clone(),
        cache.clone(),
        config.catalog.now_playing_ttl_seconds,
    ));
    let recommendations = Arc::new(RecommendationService::new(
        recommender,
        movies.clone(),
        shows.clone(),
    ));
    let lifecycle = Arc::new(BookingLifecycle::new(bookings.clone(), shows.clone()));
    let notifications = Arc::new(NotificationService::new(
        mailer,
        bookings.clone(),
        shows.clone(),
        movies.clone(),
        users.clone(),
    ));

    // Durable job queues + workers
    let queues = Queues::setup(&db.pool)
        .await
        .expect("Failed to set up job queues");
    let scheduler = Arc::new(ApalisScheduler::new(queues.clone()));

    let job_ctx = JobContext {
        lifecycle: lifecycle.clone(),
        notifications,
        users: users.clone(),
        reminder_lookahead_hours: config.business_rules.reminder_lookahead_hours,
    };
    let reminder_cron = config.business_rules.reminder_cron.clone();
    let worker_queues = queues.clone();
    tokio::spawn(async move {
        if let Err(e) = jobs::workers::run(worker_queues, job_ctx, &reminder_cron).await {
            tracing::error!("worker monitor exited: {e}");
        }
    });

    let app_state = AppState {
        movies,
        shows,
        bookings,
        users,
        lifecycle,
        catalog,
        recommendations,
        payments,
        scheduler,
        rate_limiter: cache,
        auth: AuthConfig {
            secret: config.identity.jwt_secret.clone(),
        },
        webhooks: WebhookSecrets {
            payments: config.payments.webhook_secret.clone(),
            identity: config.identity.webhook_secret.clone(),
        },
        rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
