use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use marquee_core::booking::Booking;
use marquee_core::repository::{BookingRepository, BoxError, SeatHoldError, ShowRepository};

use crate::holds;

/// Result of running the hold-expiry check against a booking.
#[derive(Debug, PartialEq, Eq)]
pub enum ExpiryOutcome {
    /// Booking was already paid or already gone; nothing to release.
    AlreadyResolved,
    /// Booking was still unpaid at the deadline: seats released, row deleted.
    Expired { seats_released: usize },
}

/// Result of applying a payment confirmation to a booking.
#[derive(Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    Confirmed,
    /// A replayed confirmation; the booking was paid already.
    AlreadyPaid,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("no seats requested")]
    EmptySeatSelection,

    #[error("duplicate seat label in request: {0}")]
    DuplicateSeat(String),

    #[error("seats already held: {}", .0.join(", "))]
    SeatsTaken(Vec<String>),

    #[error("show not found: {0}")]
    ShowNotFound(Uuid),

    #[error("booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("storage error: {0}")]
    Store(BoxError),
}

impl From<SeatHoldError> for BookingError {
    fn from(err: SeatHoldError) -> Self {
        match err {
            SeatHoldError::Conflict(seats) => BookingError::SeatsTaken(seats),
            SeatHoldError::ShowNotFound(id) => BookingError::ShowNotFound(id),
            SeatHoldError::Store(e) => BookingError::Store(e),
        }
    }
}

/// Drives a booking through its lifecycle: pending at seat selection, then
/// either paid (permanent) or expired (deleted, seats released).
///
/// Show occupancy and booking rows are two views of the same fact; every
/// operation here keeps them consistent.
pub struct BookingLifecycle {
    bookings: Arc<dyn BookingRepository>,
    shows: Arc<dyn ShowRepository>,
}

impl BookingLifecycle {
    pub fn new(bookings: Arc<dyn BookingRepository>, shows: Arc<dyn ShowRepository>) -> Self {
        Self { bookings, shows }
    }

    /// Acquire seat holds and create the pending booking.
    ///
    /// Succeeds only if none of the requested labels are held; on conflict
    /// nothing is written and the clashing labels are returned.
    pub async fn reserve_seats(
        &self,
        show_id: Uuid,
        user_id: &str,
        seats: &[String],
    ) -> Result<Booking, BookingError> {
        holds::validate_seat_request(seats)?;

        let booking = self
            .bookings
            .create_with_seats(show_id, user_id, seats)
            .await?;

        info!(
            booking_id = %booking.id,
            show_id = %show_id,
            seats = booking.booked_seats.len(),
            "seats reserved"
        );
        Ok(booking)
    }

    /// Hold-expiry check, run by the durable scheduler at the deadline.
    ///
    /// Safe to re-invoke: a missing booking, a paid booking, a missing show
    /// and already-released seat labels are all treated as already satisfied.
    pub async fn expire_if_unpaid(&self, booking_id: Uuid) -> Result<ExpiryOutcome, BookingError> {
        let booking = match self.bookings.get(booking_id).await.map_err(BookingError::Store)? {
            Some(b) => b,
            None => {
                debug!(booking_id = %booking_id, "expiry check: booking already gone");
                return Ok(ExpiryOutcome::AlreadyResolved);
            }
        };

        if booking.is_paid {
            debug!(booking_id = %booking_id, "expiry check: booking paid, keeping seats");
            return Ok(ExpiryOutcome::AlreadyResolved);
        }

        // Release first, then delete: if the delete fails the next run still
        // finds the booking and re-releasing absent labels is a no-op.
        self.shows
            .release_seats(booking.show_id, &booking.booked_seats)
            .await
            .map_err(BookingError::Store)?;

        self.bookings
            .delete(booking_id)
            .await
            .map_err(BookingError::Store)?;

        info!(
            booking_id = %booking_id,
            show_id = %booking.show_id,
            seats = booking.booked_seats.len(),
            "unpaid booking expired, seats released"
        );
        Ok(ExpiryOutcome::Expired {
            seats_released: booking.booked_seats.len(),
        })
    }

    /// Apply a payment-succeeded notification. Idempotent: replaying the
    /// confirmation leaves the booking paid and reports `AlreadyPaid`.
    pub async fn confirm_payment(&self, booking_id: Uuid) -> Result<PaymentOutcome, BookingError> {
        let transitioned = self
            .bookings
            .mark_paid(booking_id)
            .await
            .map_err(BookingError::Store)?;

        if transitioned {
            info!(booking_id = %booking_id, "booking marked paid");
            return Ok(PaymentOutcome::Confirmed);
        }

        match self.bookings.get(booking_id).await.map_err(BookingError::Store)? {
            Some(_) => Ok(PaymentOutcome::AlreadyPaid),
            None => Err(BookingError::BookingNotFound(booking_id)),
        }
    }
}
