use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use marquee_core::repository::{BoxError, ShowRepository};
use marquee_core::show::Show;

pub struct StoreShowRepository {
    pool: PgPool,
}

impl StoreShowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ShowRow {
    id: Uuid,
    movie_id: i64,
    show_datetime: DateTime<Utc>,
    price_cents: i64,
    occupied_seats: Value,
}

impl ShowRow {
    fn into_show(self) -> Result<Show, BoxError> {
        let occupied_seats: HashMap<String, String> = serde_json::from_value(self.occupied_seats)?;
        Ok(Show {
            id: self.id,
            movie_id: self.movie_id,
            show_datetime: self.show_datetime,
            price_cents: self.price_cents,
            occupied_seats,
        })
    }
}

const SHOW_COLUMNS: &str = "id, movie_id, show_datetime, price_cents, occupied_seats";

#[async_trait]
impl ShowRepository for StoreShowRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Show>, BoxError> {
        let row: Option<ShowRow> =
            sqlx::query_as(&format!("SELECT {SHOW_COLUMNS} FROM shows WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(ShowRow::into_show).transpose()
    }

    async fn insert_many(&self, shows: &[Show]) -> Result<(), BoxError> {
        let mut tx = self.pool.begin().await?;

        for show in shows {
            sqlx::query(
                r#"
                INSERT INTO shows (id, movie_id, show_datetime, price_cents, occupied_seats)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(show.id)
            .bind(show.movie_id)
            .bind(show.show_datetime)
            .bind(show.price_cents)
            .bind(serde_json::to_value(&show.occupied_seats)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_upcoming(&self) -> Result<Vec<Show>, BoxError> {
        let rows: Vec<ShowRow> = sqlx::query_as(&format!(
            "SELECT {SHOW_COLUMNS} FROM shows WHERE show_datetime >= NOW() ORDER BY show_datetime ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ShowRow::into_show).collect()
    }

    async fn list_upcoming_for_movie(&self, movie_id: i64) -> Result<Vec<Show>, BoxError> {
        let rows: Vec<ShowRow> = sqlx::query_as(&format!(
            "SELECT {SHOW_COLUMNS} FROM shows WHERE movie_id = $1 AND show_datetime >= NOW() ORDER BY show_datetime ASC"
        ))
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ShowRow::into_show).collect()
    }

    async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Show>, BoxError> {
        let rows: Vec<ShowRow> = sqlx::query_as(&format!(
            "SELECT {SHOW_COLUMNS} FROM shows WHERE show_datetime >= $1 AND show_datetime <= $2 ORDER BY show_datetime ASC"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ShowRow::into_show).collect()
    }

    async fn release_seats(&self, show_id: Uuid, seats: &[String]) -> Result<(), BoxError> {
        // `jsonb - text[]` drops the listed keys; absent keys and a missing
        // row both leave nothing to do.
        sqlx::query("UPDATE shows SET occupied_seats = occupied_seats - $2 WHERE id = $1")
            .bind(show_id)
            .bind(seats)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
