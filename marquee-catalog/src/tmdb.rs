use std::time::Duration;

use serde::Deserialize;

use crate::service::CatalogError;

/// Movie summary as returned by the catalog's paged listing endpoints.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct PagedMovies {
    #[serde(default)]
    pub page: i32,
    pub results: Vec<MovieSummary>,
    #[serde(default)]
    pub total_pages: i32,
}

/// Full detail payload for a single movie.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<GenreEntry>,
    pub release_date: Option<String>,
    pub original_language: Option<String>,
    pub tagline: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    pub runtime: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreEntry {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieCredits {
    #[serde(default)]
    pub cast: Vec<CastEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastEntry {
    pub name: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub official: bool,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct VideoList {
    #[serde(default)]
    results: Vec<Video>,
}

/// Client for the external movie catalog.
///
/// Every request carries a timeout; the catalog is assumed rate-limited and
/// occasionally slow or failing, so callers treat errors as "no data" where
/// the result is optional.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl TmdbClient {
    pub fn new(base_url: &str, api_token: &str, timeout_seconds: u64) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(CatalogError::Request)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(query)
            .send()
            .await
            .map_err(CatalogError::Request)?
            .error_for_status()
            .map_err(CatalogError::Request)?;

        response.json::<T>().await.map_err(CatalogError::Request)
    }

    pub async fn movie_details(&self, id: i64) -> Result<MovieDetails, CatalogError> {
        self.get_json(&format!("/movie/{id}"), &[]).await
    }

    pub async fn movie_credits(&self, id: i64) -> Result<MovieCredits, CatalogError> {
        self.get_json(&format!("/movie/{id}/credits"), &[]).await
    }

    pub async fn now_playing(&self) -> Result<PagedMovies, CatalogError> {
        self.get_json("/movie/now_playing", &[]).await
    }

    pub async fn upcoming(&self) -> Result<PagedMovies, CatalogError> {
        self.get_json("/movie/upcoming", &[]).await
    }

    pub async fn search(&self, query: &str) -> Result<PagedMovies, CatalogError> {
        self.get_json("/search/movie", &[("query", query)]).await
    }

    pub async fn videos(&self, id: i64) -> Result<Vec<Video>, CatalogError> {
        let list: VideoList = self
            .get_json(
                &format!("/movie/{id}/videos"),
                &[("include_video_language", "en,null")],
            )
            .await?;
        Ok(list.results)
    }
}
