use std::collections::HashMap;

use crate::lifecycle::BookingError;

/// Labels from `requested` that are already keys in the occupancy map,
/// in request order.
pub fn conflicting_seats(
    occupied: &HashMap<String, String>,
    requested: &[String],
) -> Vec<String> {
    requested
        .iter()
        .filter(|label| occupied.contains_key(*label))
        .cloned()
        .collect()
}

/// Total charge for a seat selection at a show's per-seat price.
pub fn booking_amount_cents(price_cents: i64, seat_count: usize) -> i64 {
    price_cents * seat_count as i64
}

/// Reject empty selections and repeated labels before touching storage.
pub fn validate_seat_request(seats: &[String]) -> Result<(), BookingError> {
    if seats.is_empty() {
        return Err(BookingError::EmptySeatSelection);
    }

    let mut seen = std::collections::HashSet::new();
    for label in seats {
        if !seen.insert(label.as_str()) {
            return Err(BookingError::DuplicateSeat(label.clone()));
        }
    }
    Ok(())
}
