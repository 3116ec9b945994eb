//! Movie creation is validated before dispatch: a counting transport must
//! see zero calls for every rejected form and exactly one for a valid one.

use std::sync::atomic::{AtomicUsize, Ordering};

use movie_admin_core::{
    AdminApi, AdminClient, ApiError, FilePart, HttpRequest, HttpResponse, NewMovie, Transport,
    ValidationError,
};

#[derive(Default)]
struct CountingTransport {
    calls: AtomicUsize,
}

impl CountingTransport {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for CountingTransport {
    fn send(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse {
            status: 201,
            status_text: "Created".to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: br#"{"id":1,"title":"Heat","releaseYear":2024}"#.to_vec(),
        })
    }
}

fn movie(title: Option<&str>, year: Option<&str>, with_poster: bool) -> NewMovie {
    NewMovie {
        title: title.map(str::to_string),
        release_year: year.map(str::to_string),
        poster: with_poster.then(|| FilePart::new("poster.png", "image/png", vec![137, 80, 78, 71])),
        ..NewMovie::default()
    }
}

fn api(transport: &CountingTransport) -> AdminApi<&CountingTransport> {
    AdminApi::new(AdminClient::with_base_url("http://localhost:8080/api"), transport)
}

#[test]
fn missing_poster_is_rejected_without_network() {
    let transport = CountingTransport::default();
    let err = api(&transport)
        .create_movie(&movie(Some("Heat"), Some("2024"), false))
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(ValidationError::PosterRequired)));
    assert_eq!(transport.calls(), 0);
}

#[test]
fn missing_title_and_year_are_rejected_without_network() {
    let transport = CountingTransport::default();
    let api = api(&transport);

    let err = api.create_movie(&movie(None, Some("2024"), true)).unwrap_err();
    assert!(matches!(err, ApiError::Validation(ValidationError::TitleRequired)));

    let err = api.create_movie(&movie(Some("Heat"), None, true)).unwrap_err();
    assert!(matches!(err, ApiError::Validation(ValidationError::ReleaseYearRequired)));

    assert_eq!(transport.calls(), 0);
}

#[test]
fn out_of_range_years_are_rejected_without_network() {
    let transport = CountingTransport::default();
    let api = api(&transport);
    for year in ["1899", "2101", "soon"] {
        let err = api.create_movie(&movie(Some("Heat"), Some(year), true)).unwrap_err();
        assert!(
            matches!(err, ApiError::Validation(ValidationError::InvalidReleaseYear(ref y)) if y == year),
            "{year}: {err:?}"
        );
    }
    assert_eq!(transport.calls(), 0);
}

#[test]
fn valid_movie_dispatches_exactly_once() {
    let transport = CountingTransport::default();
    let outcome = api(&transport)
        .create_movie(&movie(Some("Heat"), Some("2024"), true))
        .unwrap();
    assert_eq!(outcome.record().map(|m| m.release_year), Some(Some(2024)));
    assert_eq!(transport.calls(), 1);
}
