pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod movie_repo;
pub mod redis_cache;
pub mod show_repo;
pub mod stripe;
pub mod user_repo;

pub use booking_repo::StoreBookingRepository;
pub use database::DbClient;
pub use movie_repo::StoreMovieRepository;
pub use redis_cache::RedisCache;
pub use show_repo::StoreShowRepository;
pub use stripe::StripeGateway;
pub use user_repo::StoreUserRepository;
