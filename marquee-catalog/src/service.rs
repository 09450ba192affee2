use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use marquee_core::cache::Cache;
use marquee_core::movie::{CastMember, Genre, Movie};
use marquee_core::repository::{BoxError, MovieRepository};

use crate::tmdb::{MovieSummary, TmdbClient, Video};

const NOW_PLAYING_CACHE_KEY: &str = "catalog:now_playing";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("storage error: {0}")]
    Store(BoxError),
}

/// Local movie store backed by the external catalog.
///
/// Movies are fetched once, on first reference, and cached forever in the
/// movie repository; browsing endpoints go straight to the catalog with a
/// TTL cache in front of the now-playing list.
pub struct CatalogService {
    tmdb: TmdbClient,
    movies: Arc<dyn MovieRepository>,
    cache: Arc<dyn Cache>,
    now_playing_ttl_seconds: u64,
}

impl CatalogService {
    pub fn new(
        tmdb: TmdbClient,
        movies: Arc<dyn MovieRepository>,
        cache: Arc<dyn Cache>,
        now_playing_ttl_seconds: u64,
    ) -> Self {
        Self {
            tmdb,
            movies,
            cache,
            now_playing_ttl_seconds,
        }
    }

    /// Return the locally cached movie, fetching it from the catalog on
    /// first reference. A movie already in the store is never re-fetched,
    /// so a catalog outage does not affect flows over known movies.
    pub async fn get_or_create_movie(&self, movie_id: i64) -> Result<Movie, CatalogError> {
        if let Some(movie) = self
            .movies
            .get(movie_id)
            .await
            .map_err(CatalogError::Store)?
        {
            return Ok(movie);
        }

        let (details, credits) = tokio::try_join!(
            self.tmdb.movie_details(movie_id),
            self.tmdb.movie_credits(movie_id)
        )?;

        let movie = Movie {
            id: details.id,
            title: details.title,
            overview: details.overview,
            poster_path: details.poster_path,
            backdrop_path: details.backdrop_path,
            genres: details
                .genres
                .into_iter()
                .map(|g| Genre { id: g.id, name: g.name })
                .collect(),
            casts: credits
                .cast
                .into_iter()
                .map(|c| CastMember {
                    name: c.name,
                    profile_path: c.profile_path,
                })
                .collect(),
            release_date: details
                .release_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            original_language: details.original_language,
            tagline: details.tagline.unwrap_or_default(),
            vote_average: details.vote_average,
            runtime_minutes: details.runtime,
        };

        self.movies
            .insert(&movie)
            .await
            .map_err(CatalogError::Store)?;

        info!(movie_id = movie.id, title = %movie.title, "movie cached from catalog");
        Ok(movie)
    }

    /// Now-playing list, cached with a TTL. Cache failures fall through to
    /// the catalog; only a catalog failure is surfaced.
    pub async fn now_playing(&self) -> Result<Vec<MovieSummary>, CatalogError> {
        match self.cache.get(NOW_PLAYING_CACHE_KEY).await {
            Ok(Some(raw)) => {
                if let Ok(cached) = serde_json::from_str::<Vec<MovieSummary>>(&raw) {
                    return Ok(cached);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("now-playing cache read failed: {e}"),
        }

        let page = self.tmdb.now_playing().await?;

        if let Ok(serialized) = serde_json::to_string(&page.results) {
            if let Err(e) = self
                .cache
                .set_with_ttl(
                    NOW_PLAYING_CACHE_KEY,
                    &serialized,
                    self.now_playing_ttl_seconds,
                )
                .await
            {
                warn!("now-playing cache write failed: {e}");
            }
        }

        Ok(page.results)
    }

    pub async fn upcoming(&self) -> Result<Vec<MovieSummary>, CatalogError> {
        Ok(self.tmdb.upcoming().await?.results)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, CatalogError> {
        Ok(self.tmdb.search(query).await?.results)
    }

    /// Trailer lookup with the degrade-gracefully chain: official trailers,
    /// then any trailer, then any video at all.
    pub async fn trailers(&self, movie_id: i64) -> Result<Vec<Video>, CatalogError> {
        let videos = self.tmdb.videos(movie_id).await?;
        Ok(select_trailers(videos))
    }
}

/// Prefer official trailers, fall back to any trailer, then to any video.
pub fn select_trailers(videos: Vec<Video>) -> Vec<Video> {
    let official: Vec<Video> = videos
        .iter()
        .filter(|v| v.kind == "Trailer" && v.official)
        .cloned()
        .collect();
    if !official.is_empty() {
        return official;
    }

    let trailers: Vec<Video> = videos
        .iter()
        .filter(|v| v.kind == "Trailer")
        .cloned()
        .collect();
    if !trailers.is_empty() {
        return trailers;
    }

    videos
}
