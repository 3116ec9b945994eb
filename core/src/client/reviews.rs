use serde_json::Value;
use url::form_urlencoded;

use super::{parse_ack, parse_list, parse_outcome, parse_record, AdminApi, AdminClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;
use crate::types::{Outcome, RatingFilters, Review, ReviewInput};

/// `?status=..&rating=..&search=..` with unset and empty filters left out;
/// empty when no filter applies.
fn rating_query(filters: &RatingFilters) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(status) = filters.status.as_deref().filter(|s| !s.is_empty()) {
        query.append_pair("status", status);
    }
    if let Some(rating) = filters.rating.filter(|r| *r != 0) {
        query.append_pair("rating", &rating.to_string());
    }
    if let Some(search) = filters.search.as_deref().filter(|s| !s.is_empty()) {
        query.append_pair("search", search);
    }
    let query = query.finish();
    if query.is_empty() {
        query
    } else {
        format!("?{query}")
    }
}

impl AdminClient {
    pub fn build_get_ratings(&self, filters: &RatingFilters) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/Ratings{}", rating_query(filters)))
    }

    pub fn build_get_reviews(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/reviews")
    }

    pub fn build_get_reviews_by_movie(&self, movie_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/reviews/movie/{movie_id}"))
    }

    pub fn build_get_reviews_by_rating(&self, rating: i32) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/reviews/rating/{rating}"))
    }

    pub fn build_get_review(&self, review_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/reviews/{review_id}"))
    }

    pub fn build_create_review(&self, input: &ReviewInput) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/reviews", input)
    }

    pub fn build_update_review(
        &self,
        review_id: i64,
        input: &ReviewInput,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/reviews/{review_id}"), input)
    }

    pub fn build_delete_review(&self, review_id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/reviews/{review_id}"))
    }
}

impl<T: Transport> AdminApi<T> {
    pub fn get_ratings(&self, filters: &RatingFilters) -> Result<Vec<Review>, ApiError> {
        parse_list(self.send(self.client.build_get_ratings(filters))?)
    }

    pub fn get_reviews(&self) -> Result<Vec<Review>, ApiError> {
        parse_list(self.send(self.client.build_get_reviews())?)
    }

    pub fn get_reviews_by_movie(&self, movie_id: i64) -> Result<Vec<Review>, ApiError> {
        parse_list(self.send(self.client.build_get_reviews_by_movie(movie_id))?)
    }

    pub fn get_reviews_by_rating(&self, rating: i32) -> Result<Vec<Review>, ApiError> {
        parse_list(self.send(self.client.build_get_reviews_by_rating(rating))?)
    }

    pub fn get_review(&self, review_id: i64) -> Result<Review, ApiError> {
        parse_record(self.send(self.client.build_get_review(review_id))?)
    }

    pub fn create_review(&self, input: &ReviewInput) -> Result<Outcome<Review>, ApiError> {
        parse_outcome(self.send(self.client.build_create_review(input)?)?)
    }

    pub fn update_review(
        &self,
        review_id: i64,
        input: &ReviewInput,
    ) -> Result<Outcome<Review>, ApiError> {
        parse_outcome(self.send(self.client.build_update_review(review_id, input)?)?)
    }

    pub fn delete_review(&self, review_id: i64) -> Result<Value, ApiError> {
        parse_ack(self.send(self.client.build_delete_review(review_id))?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    #[test]
    fn review_list_tolerates_null_fields() {
        let api = api(vec![json_response(
            200,
            r#"[{"id":1,"rating":9},{"id":2,"rating":null,"comment":null}]"#,
        )]);
        let reviews = api.get_reviews().unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[1].rating, 0.0);
        assert_eq!(reviews[1].comment, None);
    }

    #[test]
    fn ratings_without_filters_has_no_query() {
        let req = client().build_get_ratings(&RatingFilters::default());
        assert_eq!(req.path, format!("{BASE_URL}/Ratings"));
    }

    #[test]
    fn ratings_filters_are_url_encoded() {
        let req = client().build_get_ratings(&RatingFilters {
            status: Some("pending".to_string()),
            rating: Some(8),
            search: Some("great film & more".to_string()),
        });
        assert_eq!(
            req.path,
            format!("{BASE_URL}/Ratings?status=pending&rating=8&search=great+film+%26+more")
        );
    }

    #[test]
    fn review_paths() {
        let c = client();
        assert_eq!(c.build_get_reviews_by_movie(3).path, format!("{BASE_URL}/reviews/movie/3"));
        assert_eq!(c.build_get_reviews_by_rating(5).path, format!("{BASE_URL}/reviews/rating/5"));
        assert_eq!(c.build_get_review(11).path, format!("{BASE_URL}/reviews/11"));
        assert_eq!(c.build_delete_review(11).method, HttpMethod::Delete);
    }

    #[test]
    fn delete_review_with_text_body_is_acknowledged() {
        let api = api(vec![text_response(200, "Review deleted")]);
        let ack = api.delete_review(11).unwrap();
        assert_eq!(ack["data"], "Review deleted");
    }

    #[test]
    fn get_reviews_by_movie_tolerates_nested_shapes() {
        let api = api(vec![json_response(
            200,
            r#"[{"id":1,"rating":9,"comment":"Tense","user":{"id":2,"username":"dana"}}]"#,
        )]);
        let reviews = api.get_reviews_by_movie(3).unwrap();
        assert_eq!(reviews[0].display_user_name(), Some("dana"));
        assert_eq!(reviews[0].rating, 9.0);
    }
}
