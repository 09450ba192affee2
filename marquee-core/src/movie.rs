use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Genre entry as delivered by the external catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Cast entry as delivered by the external catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CastMember {
    pub name: String,
    pub profile_path: Option<String>,
}

/// Movie metadata mirrored from the external catalog.
///
/// Rows are created lazily on first reference and are write-once: a re-fetch
/// never replaces an existing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub genres: Vec<Genre>,
    pub casts: Vec<CastMember>,
    pub release_date: Option<NaiveDate>,
    pub original_language: Option<String>,
    pub tagline: String,
    pub vote_average: f64,
    pub runtime_minutes: Option<i32>,
}
