//! Typed payloads exchanged with the movie-admin backend.
//!
//! # Design
//! The backend is not under this crate's control, so record types are
//! lenient: everything except `id` defaults when absent. Requiring `id` is
//! what separates a real record from a bare acknowledgement when a write
//! answers with `{"success": true}` or a text body (see `Outcome`).
//! Statistics rows whose shape the backend varies keep unknown fields in
//! `extra`. Non-optional fields also accept an explicit `null` as their
//! default.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::http::FilePart;
use crate::session::{Session, SessionUser};

/// `null` decodes like a missing key.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login answer: the token plus the user identity, flattened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl LoginResponse {
    pub fn user(&self) -> SessionUser {
        SessionUser {
            user_id: self.user_id,
            username: self.username.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }

    /// `None` when the backend answered without a token.
    pub fn session(&self) -> Option<Session> {
        let token = self.token.clone().filter(|t| !t.is_empty())?;
        Some(Session {
            token,
            user: Some(self.user()),
        })
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub is_premium: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("Admin")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cast {
    pub id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub trailer_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "null_default")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "null_default")]
    pub casts: Vec<Cast>,
}

impl Movie {
    pub fn genre_ids(&self) -> Vec<i64> {
        self.genres.iter().map(|g| g.id).collect()
    }

    pub fn cast_ids(&self) -> Vec<i64> {
        self.casts.iter().map(|c| c.id).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MovieViews {
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default, deserialize_with = "null_default")]
    pub total_views: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: i64,
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default, deserialize_with = "null_default")]
    pub episode_number: i32,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub is_premium: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMovie {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub movie_title: Option<String>,
    #[serde(default)]
    pub user: Option<ReviewUser>,
    #[serde(default)]
    pub movie: Option<ReviewMovie>,
    #[serde(default, deserialize_with = "null_default")]
    pub rating: f64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Review {
    /// Flat `userName`, else the nested user's username.
    pub fn display_user_name(&self) -> Option<&str> {
        self.user_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.user.as_ref().and_then(|u| u.username.as_deref()))
    }

    /// Flat `movieTitle`, else the nested movie's title.
    pub fn display_movie_title(&self) -> Option<&str> {
        self.movie_title
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.movie.as_ref().and_then(|m| m.title.as_deref()))
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default, deserialize_with = "null_default")]
    pub total_users: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub total_movies: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub total_views: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub total_reviews: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Row of the popular / top-rated movie rankings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieRanking {
    #[serde(default, deserialize_with = "null_default")]
    pub movie_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default, deserialize_with = "null_default")]
    pub review_count: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub view_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenreDistribution {
    #[serde(default)]
    pub genre_id: Option<i64>,
    #[serde(default)]
    pub genre_name: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub movie_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenrePopularity {
    #[serde(default)]
    pub genre_id: Option<i64>,
    #[serde(default)]
    pub genre_name: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub total_views: u64,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityPoint {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub active_users: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub total_views: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsSummary {
    #[serde(default, deserialize_with = "null_default")]
    pub total_reviews: u64,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewUsersPoint {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub new_users: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUser {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub activity_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub total_views: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub new_users: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub total_reviews: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// JSON request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleUpdate {
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeUpdate {
    pub episode_number: i32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenreInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CastInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
}

/// Body for review creation and update; unset fields are omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

// ---------------------------------------------------------------------------
// Multipart inputs
// ---------------------------------------------------------------------------

/// Movie creation form. `title`, `release_year` and `poster` are required
/// and checked before dispatch; they are `Option` so a half-filled form can
/// be represented and rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMovie {
    pub title: Option<String>,
    pub release_year: Option<String>,
    pub poster: Option<FilePart>,
    pub description: Option<String>,
    pub director: Option<String>,
    pub cast_ids: Vec<i64>,
    pub genre_ids: Vec<i64>,
}

/// Partial movie update; only supplied, non-empty fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieUpdate {
    pub title: Option<String>,
    pub release_year: Option<String>,
    pub poster: Option<FilePart>,
    pub description: Option<String>,
    pub director: Option<String>,
    pub cast_ids: Vec<i64>,
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEpisode {
    pub episode_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub duration: Option<i32>,
    /// UTC date string, e.g. `2024-05-01T00:00:00Z`.
    pub release_date: Option<String>,
    pub video: FilePart,
}

/// Query filters for the ratings listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingFilters {
    pub status: Option<String>,
    pub rating: Option<i32>,
    pub search: Option<String>,
}

// ---------------------------------------------------------------------------
// Write results
// ---------------------------------------------------------------------------

/// Result of a write whose backend may answer with the written record or
/// with a bare acknowledgement (empty body, text body, success marker).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Record(T),
    Ack(Value),
}

impl<T> Outcome<T> {
    pub fn record(self) -> Option<T> {
        match self {
            Outcome::Record(record) => Some(record),
            Outcome::Ack(_) => None,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Outcome::Record(_))
    }
}
