use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_premium: bool,
    #[serde(skip)]
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub movie_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cast {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub nationality: Option<String>,
}

#[derive(Clone, Debug, Default)]
struct MovieRow {
    id: i64,
    title: String,
    description: Option<String>,
    release_year: i32,
    director: Option<String>,
    poster_url: String,
    trailer_url: Option<String>,
    cast_ids: Vec<i64>,
    genre_ids: Vec<i64>,
    views: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub release_year: i32,
    pub director: Option<String>,
    pub poster_url: String,
    pub trailer_url: Option<String>,
    pub rating: Option<f64>,
    pub genres: Vec<Genre>,
    pub casts: Vec<Cast>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: i64,
    pub movie_id: i64,
    pub episode_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    pub release_date: Option<String>,
    pub video_url: String,
    pub is_premium: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRef {
    pub id: i64,
    pub title: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub movie_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub movie: Option<MovieRef>,
    pub rating: i32,
    pub comment: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RoleUpdate {
    pub role: String,
}

#[derive(Deserialize)]
pub struct GenreInput {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastInput {
    #[serde(default)]
    pub name: String,
    pub avatar_url: Option<String>,
    pub nationality: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeUpdate {
    pub episode_number: i32,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub duration: i32,
    pub release_date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub movie_id: Option<i64>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

#[derive(Deserialize)]
pub struct RatingQuery {
    pub status: Option<String>,
    pub rating: Option<i32>,
    pub search: Option<String>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Store {
    next_id: i64,
    tokens: HashSet<String>,
    users: BTreeMap<i64, User>,
    genres: BTreeMap<i64, Genre>,
    casts: BTreeMap<i64, Cast>,
    movies: BTreeMap<i64, MovieRow>,
    episodes: BTreeMap<i64, Episode>,
    reviews: BTreeMap<i64, Review>,
}

impl Store {
    /// One admin and one regular user, two genres, one cast member.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        let admin = store.allocate();
        store.users.insert(
            admin,
            User {
                id: admin,
                username: "admin".to_string(),
                email: ADMIN_EMAIL.to_string(),
                name: "Administrator".to_string(),
                role: "Admin".to_string(),
                is_premium: true,
                password: ADMIN_PASSWORD.to_string(),
            },
        );
        let viewer = store.allocate();
        store.users.insert(
            viewer,
            User {
                id: viewer,
                username: "viewer".to_string(),
                email: "viewer@example.com".to_string(),
                name: "Viewer".to_string(),
                role: "User".to_string(),
                is_premium: false,
                password: "viewer123".to_string(),
            },
        );
        for name in ["Drama", "Crime"] {
            let id = store.allocate();
            store.genres.insert(
                id,
                Genre {
                    id,
                    name: name.to_string(),
                    description: None,
                    movie_count: 0,
                },
            );
        }
        let cast = store.allocate();
        store.casts.insert(
            cast,
            Cast {
                id: cast,
                name: "Al Pacino".to_string(),
                avatar_url: Some("casts/pacino.jpg".to_string()),
                nationality: Some("American".to_string()),
            },
        );
        store
    }

    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn genre_list(&self) -> Vec<Genre> {
        self.genres
            .values()
            .map(|g| Genre {
                movie_count: self
                    .movies
                    .values()
                    .filter(|m| m.genre_ids.contains(&g.id))
                    .count() as u64,
                ..g.clone()
            })
            .collect()
    }

    fn average_rating(&self, movie_id: i64) -> Option<f64> {
        let ratings: Vec<f64> = self
            .reviews
            .values()
            .filter(|r| r.movie_id == movie_id)
            .map(|r| r.rating as f64)
            .collect();
        if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        }
    }

    fn render_movie(&self, row: &MovieRow) -> Movie {
        Movie {
            id: row.id,
            title: row.title.clone(),
            description: row.description.clone(),
            release_year: row.release_year,
            director: row.director.clone(),
            poster_url: row.poster_url.clone(),
            trailer_url: row.trailer_url.clone(),
            rating: self.average_rating(row.id),
            genres: row
                .genre_ids
                .iter()
                .filter_map(|id| self.genres.get(id).cloned())
                .collect(),
            casts: row
                .cast_ids
                .iter()
                .filter_map(|id| self.casts.get(id).cloned())
                .collect(),
        }
    }

    fn movie_ranking(&self, row: &MovieRow) -> Value {
        json!({
            "movieId": row.id,
            "title": row.title,
            "averageRating": self.average_rating(row.id),
            "reviewCount": self.reviews.values().filter(|r| r.movie_id == row.id).count(),
            "viewCount": row.views,
        })
    }
}

pub type Db = Arc<RwLock<Store>>;

type Failure = (StatusCode, Json<Value>);

fn failure(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "message": message })))
}

fn not_found(what: &str) -> Failure {
    failure(StatusCode::NOT_FOUND, &format!("{what} not found"))
}

fn authorize(store: &Store, headers: &HeaderMap) -> Result<(), Failure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match token {
        Some(token) if store.tokens.contains(token) => Ok(()),
        _ => Err(failure(StatusCode::UNAUTHORIZED, "Unauthorized")),
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    let api = Router::new()
        .route("/Auth/login", post(login))
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
        .route("/users/{id}/role", patch(update_user_role))
        .route("/Genres", get(list_genres).post(create_genre))
        .route("/Genres/{id}", delete(delete_genre))
        .route("/Casts", get(list_casts).post(create_cast))
        .route("/Casts/{id}", put(update_cast).delete(delete_cast))
        .route("/Movies", get(list_movies).post(create_movie))
        .route("/Movies/{id}", get(get_movie).put(update_movie).delete(delete_movie))
        .route("/history/movie/{id}/views", get(movie_views))
        .route("/movies/{movie_id}/Episodes", get(list_episodes).post(create_episode))
        .route(
            "/movies/{movie_id}/Episodes/{episode_id}",
            put(update_episode).delete(delete_episode),
        )
        .route(
            "/movies/{movie_id}/Episodes/{episode_id}/video",
            put(replace_episode_video),
        )
        .route(
            "/movies/{movie_id}/episodes/{episode_id}/premium",
            patch(set_episode_premium),
        )
        .route("/Ratings", get(list_ratings))
        .route("/reviews", get(list_reviews).post(create_review))
        .route("/reviews/movie/{movie_id}", get(reviews_by_movie))
        .route("/reviews/rating/{rating}", get(reviews_by_rating))
        .route(
            "/reviews/{id}",
            get(get_review).put(update_review).delete(delete_review),
        )
        .route("/admin/stats/overview", get(stats_overview))
        .route("/admin/stats/popular-movies", get(stats_popular_movies))
        .route("/admin/stats/top-rated-movies", get(stats_top_rated_movies))
        .route("/admin/stats/genre-distribution", get(stats_genre_distribution))
        .route("/admin/stats/genre-popularity", get(stats_genre_popularity))
        .route("/admin/stats/reviews-summary", get(stats_reviews_summary))
        .route("/admin/stats/active-users", get(stats_active_users))
        .route("/admin/stats/user-activity", get(stats_empty_series))
        .route("/admin/stats/new-users", get(stats_empty_series))
        .route("/admin/stats/monthly-summary", get(stats_empty_series));
    Router::new().nest("/api", api).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock backend listening");
    }
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Auth and users
// ---------------------------------------------------------------------------

async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let user = store
        .users
        .values()
        .find(|u| u.email == input.email && u.password == input.password)
        .cloned()
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Invalid email or password"))?;
    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone());
    Ok(Json(json!({
        "token": token,
        "userId": user.id,
        "username": user.username,
        "email": user.email,
        "name": user.name,
        "avatarUrl": null,
    })))
}

async fn list_users(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<User>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(store.users.values().cloned().collect()))
}

async fn update_user_role(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<RoleUpdate>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    if !matches!(input.role.as_str(), "Admin" | "User") {
        return Err(failure(StatusCode::BAD_REQUEST, "Unknown role"));
    }
    let user = store.users.get_mut(&id).ok_or_else(|| not_found("User"))?;
    user.role = input.role;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    store
        .users
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("User"))
}

// ---------------------------------------------------------------------------
// Genres and casts
// ---------------------------------------------------------------------------

async fn list_genres(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Genre>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(store.genre_list()))
}

async fn create_genre(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<GenreInput>,
) -> Result<(StatusCode, Json<Genre>), Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    if input.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "title": "Genre name is required", "status": 400 })),
        ));
    }
    let id = store.allocate();
    let genre = Genre {
        id,
        name: input.name,
        description: input.description,
        movie_count: 0,
    };
    store.genres.insert(id, genre.clone());
    Ok((StatusCode::CREATED, Json(genre)))
}

async fn delete_genre(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    if store.movies.values().any(|m| m.genre_ids.contains(&id)) {
        return Err(failure(StatusCode::CONFLICT, "Genre is still used by movies"));
    }
    store
        .genres
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("Genre"))
}

async fn list_casts(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Cast>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(store.casts.values().cloned().collect()))
}

async fn create_cast(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CastInput>,
) -> Result<(StatusCode, Json<Cast>), Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    if input.name.trim().is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "Cast name is required"));
    }
    let id = store.allocate();
    let cast = Cast {
        id,
        name: input.name,
        avatar_url: input.avatar_url.filter(|u| !u.is_empty()),
        nationality: input.nationality.filter(|n| !n.is_empty()),
    };
    store.casts.insert(id, cast.clone());
    Ok((StatusCode::CREATED, Json(cast)))
}

async fn update_cast(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<CastInput>,
) -> Result<Json<Cast>, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let cast = store.casts.get_mut(&id).ok_or_else(|| not_found("Cast"))?;
    if !input.name.trim().is_empty() {
        cast.name = input.name;
    }
    cast.avatar_url = input.avatar_url.filter(|u| !u.is_empty());
    cast.nationality = input.nationality.filter(|n| !n.is_empty());
    Ok(Json(cast.clone()))
}

async fn delete_cast(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    store
        .casts
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("Cast"))
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

struct Upload {
    file_name: String,
    size: usize,
}

#[derive(Default)]
struct Form {
    texts: Vec<(String, String)>,
    files: Vec<(String, Upload)>,
}

impl Form {
    fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn ids(&self, name: &str) -> Result<Vec<i64>, Failure> {
        self.texts
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| {
                v.parse()
                    .map_err(|_| failure(StatusCode::BAD_REQUEST, &format!("Invalid {name}")))
            })
            .collect()
    }

    fn file(&self, name: &str) -> Option<&Upload> {
        self.files.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }
}

async fn read_form(mut multipart: Multipart) -> Result<Form, Failure> {
    let mut form = Form::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| failure(StatusCode::BAD_REQUEST, &e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| failure(StatusCode::BAD_REQUEST, &e.body_text()))?;
                form.files.push((
                    name,
                    Upload {
                        file_name,
                        size: bytes.len(),
                    },
                ));
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| failure(StatusCode::BAD_REQUEST, &e.body_text()))?;
                form.texts.push((name, text));
            }
        }
    }
    Ok(form)
}

fn parse_year(raw: &str) -> Result<i32, Failure> {
    raw.trim()
        .parse()
        .ok()
        .filter(|y| (1900..=2100).contains(y))
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Invalid release year"))
}

// ---------------------------------------------------------------------------
// Movies
// ---------------------------------------------------------------------------

async fn list_movies(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Movie>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(store.movies.values().map(|m| store.render_movie(m)).collect()))
}

async fn get_movie(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Movie>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let row = store.movies.get(&id).ok_or_else(|| not_found("Movie"))?;
    Ok(Json(store.render_movie(row)))
}

async fn movie_views(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let row = store.movies.get(&id).ok_or_else(|| not_found("Movie"))?;
    Ok(Json(json!({ "movieId": id, "totalViews": row.views })))
}

async fn create_movie(
    State(db): State<Db>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Movie>), Failure> {
    authorize(&*db.read().await, &headers)?;
    let form = read_form(multipart).await?;

    let title = form
        .text("title")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Title is required"))?;
    let year = parse_year(form.text("releaseYear").unwrap_or_default())?;
    let poster = form
        .file("PosterURL")
        .filter(|f| f.size > 0)
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Poster is required"))?;

    let mut store = db.write().await;
    let id = store.allocate();
    let row = MovieRow {
        id,
        title: title.to_string(),
        description: form.text("description").map(str::to_string),
        release_year: year,
        director: form.text("director").map(str::to_string),
        poster_url: format!("posters/{id}/{}", poster.file_name),
        trailer_url: form.text("trailerUrl").map(str::to_string),
        cast_ids: form.ids("CastIds")?,
        genre_ids: form.ids("GenreIds")?,
        views: 0,
    };
    store.movies.insert(id, row.clone());
    Ok((StatusCode::CREATED, Json(store.render_movie(&row))))
}

async fn update_movie(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Movie>, Failure> {
    authorize(&*db.read().await, &headers)?;
    let form = read_form(multipart).await?;

    let mut store = db.write().await;
    let row = store.movies.get_mut(&id).ok_or_else(|| not_found("Movie"))?;
    if let Some(title) = form.text("title") {
        row.title = title.to_string();
    }
    if let Some(description) = form.text("description") {
        row.description = Some(description.to_string());
    }
    if let Some(year) = form.text("releaseYear") {
        row.release_year = parse_year(year)?;
    }
    if let Some(director) = form.text("director") {
        row.director = Some(director.to_string());
    }
    if let Some(poster) = form.file("PosterURL") {
        row.poster_url = format!("posters/{id}/{}", poster.file_name);
    }
    let cast_ids = form.ids("CastIds")?;
    if !cast_ids.is_empty() {
        row.cast_ids = cast_ids;
    }
    let genre_ids = form.ids("GenreIds")?;
    if !genre_ids.is_empty() {
        row.genre_ids = genre_ids;
    }
    let row = row.clone();
    Ok(Json(store.render_movie(&row)))
}

async fn delete_movie(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    store.movies.remove(&id).ok_or_else(|| not_found("Movie"))?;
    store.episodes.retain(|_, e| e.movie_id != id);
    store.reviews.retain(|_, r| r.movie_id != id);
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Episodes
// ---------------------------------------------------------------------------

async fn list_episodes(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(movie_id): Path<i64>,
) -> Result<Json<Vec<Episode>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    if !store.movies.contains_key(&movie_id) {
        return Err(not_found("Movie"));
    }
    let mut episodes: Vec<Episode> = store
        .episodes
        .values()
        .filter(|e| e.movie_id == movie_id)
        .cloned()
        .collect();
    episodes.sort_by_key(|e| e.episode_number);
    Ok(Json(episodes))
}

async fn create_episode(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(movie_id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Episode>), Failure> {
    authorize(&*db.read().await, &headers)?;
    let form = read_form(multipart).await?;

    let episode_number = form
        .text("episodeNumber")
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Episode number is required"))?;
    let title = form
        .text("title")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Title is required"))?;
    let video = form
        .file("videoFile")
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Video file is required"))?;

    let mut store = db.write().await;
    if !store.movies.contains_key(&movie_id) {
        return Err(not_found("Movie"));
    }
    let id = store.allocate();
    let episode = Episode {
        id,
        movie_id,
        episode_number,
        title: title.to_string(),
        description: form.text("description").map(str::to_string),
        duration: form.text("duration").and_then(|d| d.parse().ok()).unwrap_or(0),
        release_date: form.text("releaseDate").map(str::to_string),
        video_url: format!("videos/{movie_id}/{}", video.file_name),
        is_premium: false,
    };
    store.episodes.insert(id, episode.clone());
    Ok((StatusCode::CREATED, Json(episode)))
}

fn episode_of(store: &mut Store, movie_id: i64, episode_id: i64) -> Result<&mut Episode, Failure> {
    store
        .episodes
        .get_mut(&episode_id)
        .filter(|e| e.movie_id == movie_id)
        .ok_or_else(|| not_found("Episode"))
}

async fn update_episode(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((movie_id, episode_id)): Path<(i64, i64)>,
    Json(input): Json<EpisodeUpdate>,
) -> Result<Json<Episode>, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let episode = episode_of(&mut store, movie_id, episode_id)?;
    episode.episode_number = input.episode_number;
    episode.title = input.title;
    episode.description = input.description;
    episode.duration = input.duration;
    episode.release_date = input.release_date;
    Ok(Json(episode.clone()))
}

async fn delete_episode(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((movie_id, episode_id)): Path<(i64, i64)>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    episode_of(&mut store, movie_id, episode_id)?;
    store.episodes.remove(&episode_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn replace_episode_video(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((movie_id, episode_id)): Path<(i64, i64)>,
    multipart: Multipart,
) -> Result<Json<Episode>, Failure> {
    authorize(&*db.read().await, &headers)?;
    let form = read_form(multipart).await?;
    let video = form
        .file("videoFile")
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Video file is required"))?;

    let mut store = db.write().await;
    let episode = episode_of(&mut store, movie_id, episode_id)?;
    episode.video_url = format!("videos/{movie_id}/{}", video.file_name);
    Ok(Json(episode.clone()))
}

async fn set_episode_premium(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((movie_id, episode_id)): Path<(i64, i64)>,
    Json(is_premium): Json<bool>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    episode_of(&mut store, movie_id, episode_id)?.is_premium = is_premium;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

fn reviews_where(store: &Store, keep: impl Fn(&Review) -> bool) -> Vec<Review> {
    store.reviews.values().filter(|r| keep(*r)).cloned().collect()
}

async fn list_reviews(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Review>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(reviews_where(&store, |_| true)))
}

async fn list_ratings(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<RatingQuery>,
) -> Result<Json<Vec<Review>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let search = query.search.map(|s| s.to_lowercase());
    // Reviews carry no moderation status, so only "approved" matches any.
    let status_ok = query.status.as_deref().map_or(true, |s| s == "approved");
    Ok(Json(reviews_where(&store, |r| {
        status_ok
            && query.rating.map_or(true, |rating| r.rating == rating)
            && search
                .as_deref()
                .map_or(true, |s| r.comment.to_lowercase().contains(s))
    })))
}

async fn reviews_by_movie(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(movie_id): Path<i64>,
) -> Result<Json<Vec<Review>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(reviews_where(&store, |r| r.movie_id == movie_id)))
}

async fn reviews_by_rating(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(rating): Path<i32>,
) -> Result<Json<Vec<Review>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(reviews_where(&store, |r| r.rating == rating)))
}

async fn get_review(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Review>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    store
        .reviews
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Review"))
}

fn check_rating(rating: i32) -> Result<i32, Failure> {
    if (1..=10).contains(&rating) {
        Ok(rating)
    } else {
        Err(failure(StatusCode::BAD_REQUEST, "Rating must be between 1 and 10"))
    }
}

async fn create_review(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ReviewInput>,
) -> Result<(StatusCode, Json<Review>), Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let movie_id = input
        .movie_id
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Movie is required"))?;
    let rating = check_rating(input.rating.unwrap_or(0))?;
    let movie = store.movies.get(&movie_id).ok_or_else(|| not_found("Movie"))?;
    let movie = MovieRef {
        id: movie.id,
        title: movie.title.clone(),
    };
    // Reviews are attributed to the seeded admin account.
    let author = store.users.values().next().cloned().ok_or_else(|| not_found("User"))?;
    let id = store.allocate();
    let review = Review {
        id,
        movie_id,
        user_id: author.id,
        user_name: author.username,
        movie: Some(movie),
        rating,
        comment: input.comment.unwrap_or_default(),
    };
    store.reviews.insert(id, review.clone());
    Ok((StatusCode::CREATED, Json(review)))
}

async fn update_review(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<ReviewInput>,
) -> Result<Json<Review>, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let review = store.reviews.get_mut(&id).ok_or_else(|| not_found("Review"))?;
    if let Some(rating) = input.rating {
        review.rating = check_rating(rating)?;
    }
    if let Some(comment) = input.comment {
        review.comment = comment;
    }
    Ok(Json(review.clone()))
}

/// Answers with plain text rather than JSON or 204.
async fn delete_review(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    store.reviews.remove(&id).ok_or_else(|| not_found("Review"))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Review deleted",
    ))
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

async fn stats_overview(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(json!({
        "totalUsers": store.users.len(),
        "totalMovies": store.movies.len(),
        "totalViews": store.movies.values().map(|m| m.views).sum::<u64>(),
        "totalReviews": store.reviews.len(),
    })))
}

async fn stats_popular_movies(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Value>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let mut rows: Vec<&MovieRow> = store.movies.values().collect();
    rows.sort_by(|a, b| b.views.cmp(&a.views));
    Ok(Json(
        rows.into_iter()
            .take(query.limit)
            .map(|m| store.movie_ranking(m))
            .collect(),
    ))
}

async fn stats_top_rated_movies(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Value>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let mut rows: Vec<(&MovieRow, f64)> = store
        .movies
        .values()
        .filter_map(|m| store.average_rating(m.id).map(|avg| (m, avg)))
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(Json(
        rows.into_iter()
            .take(query.limit)
            .map(|(m, _)| store.movie_ranking(m))
            .collect(),
    ))
}

async fn stats_genre_distribution(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(
        store
            .genre_list()
            .into_iter()
            .map(|g| json!({ "genreId": g.id, "genreName": g.name, "movieCount": g.movie_count }))
            .collect(),
    ))
}

async fn stats_genre_popularity(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(
        store
            .genres
            .values()
            .map(|g| {
                let views: u64 = store
                    .movies
                    .values()
                    .filter(|m| m.genre_ids.contains(&g.id))
                    .map(|m| m.views)
                    .sum();
                json!({ "genreId": g.id, "genreName": g.name, "totalViews": views })
            })
            .collect(),
    ))
}

async fn stats_reviews_summary(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let total = store.reviews.len();
    let average = (total > 0).then(|| {
        store.reviews.values().map(|r| r.rating as f64).sum::<f64>() / total as f64
    });
    Ok(Json(json!({ "totalReviews": total, "averageRating": average })))
}

async fn stats_active_users(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Value>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let mut rows: Vec<(&User, usize)> = store
        .users
        .values()
        .map(|u| (u, store.reviews.values().filter(|r| r.user_id == u.id).count()))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(Json(
        rows.into_iter()
            .take(query.limit)
            .map(|(u, n)| json!({ "userId": u.id, "username": u.username, "activityCount": n }))
            .collect(),
    ))
}

/// Time series the mock has no history for.
async fn stats_empty_series(State(db): State<Db>, headers: HeaderMap) -> Result<StatusCode, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_without_password() {
        let store = Store::seeded();
        let admin = store.users.values().next().unwrap();
        let json = serde_json::to_value(admin).unwrap();
        assert_eq!(json["email"], ADMIN_EMAIL);
        assert_eq!(json["isPremium"], true);
        assert!(json.get("password").is_none());
    }

    #[test]
    fn seeded_store_allocates_distinct_ids() {
        let store = Store::seeded();
        assert_eq!(store.users.len(), 2);
        assert_eq!(store.genres.len(), 2);
        assert_eq!(store.casts.len(), 1);
        assert_eq!(store.next_id, 5);
    }

    #[test]
    fn genre_counts_follow_movies() {
        let mut store = Store::seeded();
        let drama = *store.genres.keys().next().unwrap();
        let id = store.allocate();
        store.movies.insert(
            id,
            MovieRow {
                id,
                title: "Heat".to_string(),
                genre_ids: vec![drama],
                ..MovieRow::default()
            },
        );
        let genres = store.genre_list();
        assert_eq!(genres[0].movie_count, 1);
        assert_eq!(genres[1].movie_count, 0);
    }

    #[test]
    fn average_rating_over_movie_reviews() {
        let mut store = Store::seeded();
        for (id, rating) in [(10, 8), (11, 6)] {
            store.reviews.insert(
                id,
                Review {
                    id,
                    movie_id: 99,
                    user_id: 1,
                    user_name: "admin".to_string(),
                    movie: None,
                    rating,
                    comment: String::new(),
                },
            );
        }
        assert_eq!(store.average_rating(99), Some(7.0));
        assert_eq!(store.average_rating(100), None);
    }

    #[test]
    fn year_parsing_enforces_range() {
        assert_eq!(parse_year("2024").unwrap(), 2024);
        assert!(parse_year("1899").is_err());
        assert!(parse_year("x").is_err());
    }

    #[test]
    fn form_ids_reject_garbage() {
        let form = Form {
            texts: vec![
                ("CastIds".to_string(), "1".to_string()),
                ("CastIds".to_string(), "2".to_string()),
                ("GenreIds".to_string(), "x".to_string()),
            ],
            files: Vec::new(),
        };
        assert_eq!(form.ids("CastIds").unwrap(), vec![1, 2]);
        assert!(form.ids("GenreIds").is_err());
    }
}
