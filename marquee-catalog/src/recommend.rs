use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use marquee_core::movie::Movie;
use marquee_core::repository::{MovieRepository, ShowRepository};

use crate::service::CatalogError;

#[derive(Debug, Serialize)]
struct RecommendRequest<'a> {
    #[serde(rename = "userMovieIds")]
    user_movie_ids: &'a [i64],
}

#[derive(Debug, Deserialize)]
struct RecommendResponse {
    #[serde(default, rename = "recommendedMovieIds")]
    recommended_movie_ids: Vec<i64>,
}

/// Client for the external content-based recommender service.
#[derive(Clone)]
pub struct RecommenderClient {
    http: reqwest::Client,
    base_url: String,
}

impl RecommenderClient {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(CatalogError::Request)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn recommend(&self, user_movie_ids: &[i64]) -> Result<Vec<i64>, CatalogError> {
        let url = format!("{}/recommend", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&RecommendRequest { user_movie_ids })
            .send()
            .await
            .map_err(CatalogError::Request)?
            .error_for_status()
            .map_err(CatalogError::Request)?;

        let body: RecommendResponse = response.json().await.map_err(CatalogError::Request)?;
        Ok(body.recommended_movie_ids)
    }
}

/// Best-effort recommendations over movies that can actually be watched.
///
/// The chain degrades step by step: external recommender over the user's
/// favorites, filtered to movies with an upcoming show, topped up with any
/// movie that has an active show. The guarantee kept is the end one: up to
/// `limit` watchable movies whenever any active show exists, and an
/// explicitly empty list otherwise.
pub struct RecommendationService {
    recommender: Option<RecommenderClient>,
    movies: Arc<dyn MovieRepository>,
    shows: Arc<dyn ShowRepository>,
}

impl RecommendationService {
    pub fn new(
        recommender: Option<RecommenderClient>,
        movies: Arc<dyn MovieRepository>,
        shows: Arc<dyn ShowRepository>,
    ) -> Self {
        Self {
            recommender,
            movies,
            shows,
        }
    }

    pub async fn recommend_for(
        &self,
        favorite_ids: &[i64],
        limit: usize,
    ) -> Result<Vec<Movie>, CatalogError> {
        // Movies with at least one upcoming show, ordered by soonest show.
        let upcoming = self
            .shows
            .list_upcoming()
            .await
            .map_err(CatalogError::Store)?;

        let mut showing_order: Vec<i64> = Vec::new();
        let mut showing: HashSet<i64> = HashSet::new();
        for show in &upcoming {
            if showing.insert(show.movie_id) {
                showing_order.push(show.movie_id);
            }
        }

        if showing_order.is_empty() {
            return Ok(Vec::new());
        }

        let recommended = match &self.recommender {
            Some(client) => match client.recommend(favorite_ids).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!("recommender unavailable, falling back to active shows: {e}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        // Recommender picks that are actually showing, in recommender order,
        // topped up with the remaining showing movies.
        let mut picked: Vec<i64> = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        for id in recommended.into_iter().filter(|id| showing.contains(id)) {
            if seen.insert(id) {
                picked.push(id);
            }
        }
        for id in showing_order {
            if picked.len() >= limit {
                break;
            }
            if seen.insert(id) {
                picked.push(id);
            }
        }
        picked.truncate(limit);

        let movies = self
            .movies
            .get_many(&picked)
            .await
            .map_err(CatalogError::Store)?;

        // Preserve pick order; get_many has no ordering contract.
        let mut ordered = Vec::with_capacity(picked.len());
        for id in &picked {
            if let Some(movie) = movies.iter().find(|m| m.id == *id) {
                ordered.push(movie.clone());
            }
        }
        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use marquee_core::repository::BoxError;
    use marquee_core::show::Show;
    use uuid::Uuid;

    struct MemoryMovies(Mutex<HashMap<i64, Movie>>);

    impl MemoryMovies {
        fn with(ids: &[i64]) -> Arc<Self> {
            let map = ids
                .iter()
                .map(|id| (*id, movie(*id)))
                .collect::<HashMap<_, _>>();
            Arc::new(Self(Mutex::new(map)))
        }
    }

    fn movie(id: i64) -> Movie {
        Movie {
            id,
            title: format!("Movie {id}"),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            genres: vec![],
            casts: vec![],
            release_date: None,
            original_language: None,
            tagline: String::new(),
            vote_average: 0.0,
            runtime_minutes: None,
        }
    }

    #[async_trait]
    impl MovieRepository for MemoryMovies {
        async fn get(&self, id: i64) -> Result<Option<Movie>, BoxError> {
            Ok(self.0.lock().unwrap().get(&id).cloned())
        }

        async fn get_many(&self, ids: &[i64]) -> Result<Vec<Movie>, BoxError> {
            let guard = self.0.lock().unwrap();
            Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
        }

        async fn insert(&self, movie: &Movie) -> Result<(), BoxError> {
            self.0
                .lock()
                .unwrap()
                .entry(movie.id)
                .or_insert_with(|| movie.clone());
            Ok(())
        }
    }

    struct MemoryShows(Vec<Show>);

    #[async_trait]
    impl ShowRepository for MemoryShows {
        async fn get(&self, id: Uuid) -> Result<Option<Show>, BoxError> {
            Ok(self.0.iter().find(|s| s.id == id).cloned())
        }

        async fn insert_many(&self, _shows: &[Show]) -> Result<(), BoxError> {
            unimplemented!("not used in recommendation tests")
        }

        async fn list_upcoming(&self) -> Result<Vec<Show>, BoxError> {
            let mut shows = self.0.clone();
            shows.sort_by_key(|s| s.show_datetime);
            Ok(shows)
        }

        async fn list_upcoming_for_movie(&self, movie_id: i64) -> Result<Vec<Show>, BoxError> {
            Ok(self
                .0
                .iter()
                .filter(|s| s.movie_id == movie_id)
                .cloned()
                .collect())
        }

        async fn list_between(
            &self,
            _from: chrono::DateTime<Utc>,
            _to: chrono::DateTime<Utc>,
        ) -> Result<Vec<Show>, BoxError> {
            Ok(vec![])
        }

        async fn release_seats(&self, _show_id: Uuid, _seats: &[String]) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn shows_for(movie_ids: &[i64]) -> Arc<MemoryShows> {
        let base = Utc::now() + ChronoDuration::hours(1);
        Arc::new(MemoryShows(
            movie_ids
                .iter()
                .enumerate()
                .map(|(i, id)| Show::new(*id, base + ChronoDuration::hours(i as i64), 1000))
                .collect(),
        ))
    }

    #[tokio::test]
    async fn no_active_shows_means_explicitly_empty() {
        let service = RecommendationService::new(
            None,
            MemoryMovies::with(&[1, 2]),
            Arc::new(MemoryShows(vec![])),
        );

        let result = service.recommend_for(&[1], 10).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn without_recommender_falls_back_to_showing_order() {
        let service =
            RecommendationService::new(None, MemoryMovies::with(&[1, 2, 3]), shows_for(&[3, 1, 2]));

        let result = service.recommend_for(&[], 2).await.unwrap();
        let ids: Vec<i64> = result.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn limit_caps_the_result() {
        let service = RecommendationService::new(
            None,
            MemoryMovies::with(&[1, 2, 3, 4]),
            shows_for(&[1, 2, 3, 4]),
        );

        let result = service.recommend_for(&[], 3).await.unwrap();
        assert_eq!(result.len(), 3);
    }
}
