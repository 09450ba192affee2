use std::sync::Arc;

use marquee_booking::BookingLifecycle;
use marquee_catalog::recommend::RecommendationService;
use marquee_catalog::CatalogService;
use marquee_core::cache::RateLimiter;
use marquee_core::payment::PaymentGateway;
use marquee_core::repository::{
    BookingRepository, MovieRepository, ShowRepository, UserRepository,
};
use marquee_core::scheduler::JobScheduler;
use marquee_store::app_config::BusinessRules;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct WebhookSecrets {
    pub payments: String,
    pub identity: String,
}

#[derive(Clone)]
pub struct AppState {
    pub movies: Arc<dyn MovieRepository>,
    pub shows: Arc<dyn ShowRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
    pub lifecycle: Arc<BookingLifecycle>,
    pub catalog: Arc<CatalogService>,
    pub recommendations: Arc<RecommendationService>,
    pub payments: Arc<dyn PaymentGateway>,
    pub scheduler: Arc<dyn JobScheduler>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub auth: AuthConfig,
    pub webhooks: WebhookSecrets,
    pub rules: BusinessRules,
}
