use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled screening of a movie.
///
/// `occupied_seats` maps a seat label to the holding user's id; absence of a
/// key means the seat is free. A label maps to at most one user at a time,
/// and the map is mutated only by seat-hold acquisition and release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    pub id: Uuid,
    pub movie_id: i64,
    pub show_datetime: DateTime<Utc>,
    pub price_cents: i64,
    pub occupied_seats: HashMap<String, String>,
}

impl Show {
    pub fn new(movie_id: i64, show_datetime: DateTime<Utc>, price_cents: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            movie_id,
            show_datetime,
            price_cents,
            occupied_seats: HashMap::new(),
        }
    }

    /// Occupied seat labels, sorted for stable output.
    pub fn occupied_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.occupied_seats.keys().cloned().collect();
        labels.sort();
        labels
    }

    /// Distinct user ids currently holding at least one seat.
    pub fn holding_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.occupied_seats.values().cloned().collect();
        users.sort();
        users.dedup();
        users
    }
}
