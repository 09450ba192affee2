pub mod holds;
pub mod lifecycle;

pub use lifecycle::{BookingError, BookingLifecycle, ExpiryOutcome, PaymentOutcome};
