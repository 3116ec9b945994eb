//! Genres and cast members: the lookup lists movies reference.

use serde_json::Value;

use super::{parse_ack, parse_list, parse_outcome, AdminApi, AdminClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;
use crate::types::{Cast, CastInput, Genre, GenreInput, Outcome};

impl AdminClient {
    pub fn build_get_genres(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/Genres")
    }

    pub fn build_create_genre(&self, input: &GenreInput) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/Genres", input)
    }

    pub fn build_delete_genre(&self, genre_id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/Genres/{genre_id}"))
    }

    pub fn build_get_casts(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/Casts")
    }

    pub fn build_create_cast(&self, input: &CastInput) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/Casts", input)
    }

    pub fn build_update_cast(&self, cast_id: i64, input: &CastInput) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/Casts/{cast_id}"), input)
    }

    pub fn build_delete_cast(&self, cast_id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/Casts/{cast_id}"))
    }
}

impl<T: Transport> AdminApi<T> {
    pub fn get_genres(&self) -> Result<Vec<Genre>, ApiError> {
        parse_list(self.send(self.client.build_get_genres())?)
    }

    pub fn create_genre(&self, input: &GenreInput) -> Result<Outcome<Genre>, ApiError> {
        parse_outcome(self.send(self.client.build_create_genre(input)?)?)
    }

    pub fn delete_genre(&self, genre_id: i64) -> Result<Value, ApiError> {
        parse_ack(self.send(self.client.build_delete_genre(genre_id))?)
    }

    pub fn get_casts(&self) -> Result<Vec<Cast>, ApiError> {
        parse_list(self.send(self.client.build_get_casts())?)
    }

    pub fn create_cast(&self, input: &CastInput) -> Result<Outcome<Cast>, ApiError> {
        parse_outcome(self.send(self.client.build_create_cast(input)?)?)
    }

    pub fn update_cast(&self, cast_id: i64, input: &CastInput) -> Result<Outcome<Cast>, ApiError> {
        parse_outcome(self.send(self.client.build_update_cast(cast_id, input)?)?)
    }

    pub fn delete_cast(&self, cast_id: i64) -> Result<Value, ApiError> {
        parse_ack(self.send(self.client.build_delete_cast(cast_id))?)
    }
}
