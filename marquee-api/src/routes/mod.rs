pub mod admin;
pub mod bookings;
pub mod catalog;
pub mod shows;
pub mod users;
pub mod webhooks;
