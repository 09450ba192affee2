use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use marquee_core::movie::Movie;
use marquee_core::repository::{BoxError, MovieRepository};

pub struct StoreMovieRepository {
    pool: PgPool,
}

impl StoreMovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct MovieRow {
    id: i64,
    title: String,
    overview: String,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    genres: Value,
    casts: Value,
    release_date: Option<chrono::NaiveDate>,
    original_language: Option<String>,
    tagline: String,
    vote_average: f64,
    runtime_minutes: Option<i32>,
}

impl MovieRow {
    fn into_movie(self) -> Result<Movie, BoxError> {
        Ok(Movie {
            id: self.id,
            title: self.title,
            overview: self.overview,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            genres: serde_json::from_value(self.genres)?,
            casts: serde_json::from_value(self.casts)?,
            release_date: self.release_date,
            original_language: self.original_language,
            tagline: self.tagline,
            vote_average: self.vote_average,
            runtime_minutes: self.runtime_minutes,
        })
    }
}

const MOVIE_COLUMNS: &str = "id, title, overview, poster_path, backdrop_path, genres, casts, release_date, original_language, tagline, vote_average, runtime_minutes";

#[async_trait]
impl MovieRepository for StoreMovieRepository {
    async fn get(&self, id: i64) -> Result<Option<Movie>, BoxError> {
        let row: Option<MovieRow> = sqlx::query_as(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MovieRow::into_movie).transpose()
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Movie>, BoxError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<MovieRow> = sqlx::query_as(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MovieRow::into_movie).collect()
    }

    async fn insert(&self, movie: &Movie) -> Result<(), BoxError> {
        sqlx::query(
            r#"
            INSERT INTO movies (id, title, overview, poster_path, backdrop_path, genres, casts, release_date, original_language, tagline, vote_average, runtime_minutes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(movie.id)
        .bind(&movie.title)
        .bind(&movie.overview)
        .bind(&movie.poster_path)
        .bind(&movie.backdrop_path)
        .bind(serde_json::to_value(&movie.genres)?)
        .bind(serde_json::to_value(&movie.casts)?)
        .bind(movie.release_date)
        .bind(&movie.original_language)
        .bind(&movie.tagline)
        .bind(movie.vote_average)
        .bind(movie.runtime_minutes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
