pub mod recommend;
pub mod service;
pub mod tmdb;

pub use service::{CatalogError, CatalogService};
pub use tmdb::TmdbClient;
