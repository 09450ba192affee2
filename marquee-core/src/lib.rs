pub mod booking;
pub mod cache;
pub mod email;
pub mod movie;
pub mod payment;
pub mod repository;
pub mod scheduler;
pub mod show;
pub mod user;
