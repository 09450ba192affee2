use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use marquee_core::booking::Booking;
use marquee_core::repository::{BookingRepository, BoxError, SeatHoldError};

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    show_id: Uuid,
    user_id: String,
    booked_seats: Value,
    amount_cents: i64,
    is_paid: bool,
    payment_link: Option<String>,
    created_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, BoxError> {
        Ok(Booking {
            id: self.id,
            show_id: self.show_id,
            user_id: self.user_id,
            booked_seats: serde_json::from_value(self.booked_seats)?,
            amount_cents: self.amount_cents,
            is_paid: self.is_paid,
            payment_link: self.payment_link,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ShowForUpdateRow {
    price_cents: i64,
    occupied_seats: Value,
}

const BOOKING_COLUMNS: &str =
    "id, show_id, user_id, booked_seats, amount_cents, is_paid, payment_link, created_at";

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_with_seats(
        &self,
        show_id: Uuid,
        user_id: &str,
        seats: &[String],
    ) -> Result<Booking, SeatHoldError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SeatHoldError::Store(e.into()))?;

        // Row lock serializes concurrent acquisitions against the same show;
        // two requests can never both observe a seat as free.
        let row: Option<ShowForUpdateRow> =
            sqlx::query_as("SELECT price_cents, occupied_seats FROM shows WHERE id = $1 FOR UPDATE")
                .bind(show_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| SeatHoldError::Store(e.into()))?;

        let show = row.ok_or(SeatHoldError::ShowNotFound(show_id))?;

        let mut occupied: HashMap<String, String> = serde_json::from_value(show.occupied_seats)
            .map_err(|e| SeatHoldError::Store(e.into()))?;

        let clashes: Vec<String> = seats
            .iter()
            .filter(|label| occupied.contains_key(*label))
            .cloned()
            .collect();
        if !clashes.is_empty() {
            // Transaction drops without commit; nothing was written.
            return Err(SeatHoldError::Conflict(clashes));
        }

        for label in seats {
            occupied.insert(label.clone(), user_id.to_string());
        }

        sqlx::query("UPDATE shows SET occupied_seats = $2 WHERE id = $1")
            .bind(show_id)
            .bind(serde_json::to_value(&occupied).map_err(|e| SeatHoldError::Store(e.into()))?)
            .execute(&mut *tx)
            .await
            .map_err(|e| SeatHoldError::Store(e.into()))?;

        let booking = Booking {
            id: Uuid::new_v4(),
            show_id,
            user_id: user_id.to_string(),
            booked_seats: seats.to_vec(),
            amount_cents: show.price_cents * seats.len() as i64,
            is_paid: false,
            payment_link: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO bookings (id, show_id, user_id, booked_seats, amount_cents, is_paid, payment_link, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(booking.id)
        .bind(booking.show_id)
        .bind(&booking.user_id)
        .bind(
            serde_json::to_value(&booking.booked_seats)
                .map_err(|e| SeatHoldError::Store(e.into()))?,
        )
        .bind(booking.amount_cents)
        .bind(booking.is_paid)
        .bind(&booking.payment_link)
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| SeatHoldError::Store(e.into()))?;

        tx.commit()
            .await
            .map_err(|e| SeatHoldError::Store(e.into()))?;

        Ok(booking)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, BoxError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn mark_paid(&self, id: Uuid) -> Result<bool, BoxError> {
        let result = sqlx::query(
            "UPDATE bookings SET is_paid = TRUE, payment_link = NULL WHERE id = $1 AND is_paid = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_payment_link(&self, id: Uuid, url: &str) -> Result<(), BoxError> {
        sqlx::query("UPDATE bookings SET payment_link = $2 WHERE id = $1")
            .bind(id)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), BoxError> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Booking>, BoxError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn list_paid(&self) -> Result<Vec<Booking>, BoxError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE is_paid = TRUE"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn list_all(&self) -> Result<Vec<Booking>, BoxError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }
}
