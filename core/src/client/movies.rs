//! Movie catalogue operations. Creation and update go out as multipart forms
//! carrying the poster image.

use serde_json::Value;

use super::{parse_ack, parse_list, parse_outcome, parse_record, AdminApi, AdminClient};
use crate::error::{ApiError, ValidationError};
use crate::http::{HttpMethod, HttpRequest, MultipartForm};
use crate::transport::Transport;
use crate::types::{Movie, MovieUpdate, MovieViews, NewMovie, Outcome};

pub const MIN_RELEASE_YEAR: i32 = 1900;
pub const MAX_RELEASE_YEAR: i32 = 2100;

/// Leading integer of `raw` (sign and digits after optional whitespace),
/// within the accepted release-year range.
fn release_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim_start();
    let digits_end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(trimmed.len(), |(i, _)| i);
    let year: i32 = trimmed[..digits_end].parse().ok()?;
    (MIN_RELEASE_YEAR..=MAX_RELEASE_YEAR)
        .contains(&year)
        .then_some(year)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn append_ids(form: &mut MultipartForm, name: &str, ids: &[i64]) {
    for id in ids {
        form.text(name, id.to_string());
    }
}

/// Validated creation form. Fails before any request exists.
pub fn new_movie_form(input: &NewMovie) -> Result<MultipartForm, ValidationError> {
    let title = non_empty(&input.title).ok_or(ValidationError::TitleRequired)?;
    let raw_year = non_empty(&input.release_year).ok_or(ValidationError::ReleaseYearRequired)?;
    let poster = input.poster.as_ref().ok_or(ValidationError::PosterRequired)?;
    let year = release_year(raw_year)
        .ok_or_else(|| ValidationError::InvalidReleaseYear(raw_year.to_string()))?;

    let mut form = MultipartForm::new();
    form.text("title", title)
        .text("releaseYear", year.to_string())
        .file("PosterURL", poster.clone());
    if let Some(description) = non_empty(&input.description) {
        form.text("description", description);
    }
    if let Some(director) = non_empty(&input.director) {
        form.text("director", director);
    }
    append_ids(&mut form, "CastIds", &input.cast_ids);
    append_ids(&mut form, "GenreIds", &input.genre_ids);
    Ok(form)
}

/// Partial update form. Nothing is required; an unusable release year is
/// left out rather than rejected.
pub fn movie_update_form(input: &MovieUpdate) -> MultipartForm {
    let mut form = MultipartForm::new();
    if let Some(title) = non_empty(&input.title) {
        form.text("title", title);
    }
    if let Some(description) = non_empty(&input.description) {
        form.text("description", description);
    }
    if let Some(year) = non_empty(&input.release_year).and_then(release_year) {
        form.text("releaseYear", year.to_string());
    }
    if let Some(poster) = &input.poster {
        form.file("PosterURL", poster.clone());
    }
    if let Some(director) = non_empty(&input.director) {
        form.text("director", director);
    }
    append_ids(&mut form, "CastIds", &input.cast_ids);
    append_ids(&mut form, "GenreIds", &input.genre_ids);
    form
}

impl AdminClient {
    pub fn build_get_movies(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/Movies")
    }

    pub fn build_get_movie(&self, movie_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/Movies/{movie_id}"))
    }

    pub fn build_get_movie_views(&self, movie_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/history/movie/{movie_id}/views"))
    }

    pub fn build_create_movie(&self, input: &NewMovie) -> Result<HttpRequest, ApiError> {
        let form = new_movie_form(input)?;
        Ok(self.multipart_request(HttpMethod::Post, "/Movies", form))
    }

    pub fn build_update_movie(&self, movie_id: i64, input: &MovieUpdate) -> HttpRequest {
        self.multipart_request(
            HttpMethod::Put,
            &format!("/Movies/{movie_id}"),
            movie_update_form(input),
        )
    }

    pub fn build_delete_movie(&self, movie_id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/Movies/{movie_id}"))
    }
}

impl<T: Transport> AdminApi<T> {
    pub fn get_movies(&self) -> Result<Vec<Movie>, ApiError> {
        parse_list(self.send(self.client.build_get_movies())?)
    }

    pub fn get_movie(&self, movie_id: i64) -> Result<Movie, ApiError> {
        parse_record(self.send(self.client.build_get_movie(movie_id))?)
    }

    pub fn get_movie_views(&self, movie_id: i64) -> Result<MovieViews, ApiError> {
        parse_record(self.send(self.client.build_get_movie_views(movie_id))?)
    }

    /// Validation failures return before the transport is touched.
    pub fn create_movie(&self, input: &NewMovie) -> Result<Outcome<Movie>, ApiError> {
        let request = self.client.build_create_movie(input)?;
        parse_outcome(self.send(request)?)
    }

    pub fn update_movie(&self, movie_id: i64, input: &MovieUpdate) -> Result<Outcome<Movie>, ApiError> {
        parse_outcome(self.send(self.client.build_update_movie(movie_id, input))?)
    }

    pub fn delete_movie(&self, movie_id: i64) -> Result<Value, ApiError> {
        parse_ack(self.send(self.client.build_delete_movie(movie_id))?)
    }
}
