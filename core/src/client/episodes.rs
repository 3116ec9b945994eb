use serde_json::Value;

use super::{parse_ack, parse_list, parse_outcome, AdminApi, AdminClient};
use crate::error::ApiError;
use crate::http::{FilePart, HttpMethod, HttpRequest, MultipartForm};
use crate::transport::Transport;
use crate::types::{Episode, EpisodeUpdate, NewEpisode, Outcome};

pub fn new_episode_form(input: &NewEpisode) -> MultipartForm {
    let mut form = MultipartForm::new();
    form.text("episodeNumber", input.episode_number.to_string())
        .text("title", input.title.as_str());
    if let Some(description) = input.description.as_deref().filter(|d| !d.is_empty()) {
        form.text("description", description);
    }
    form.text("duration", input.duration.unwrap_or(0).to_string());
    if let Some(date) = input.release_date.as_deref().filter(|d| !d.is_empty()) {
        form.text("releaseDate", date);
    }
    form.file("videoFile", input.video.clone());
    form
}

impl AdminClient {
    pub fn build_get_episodes(&self, movie_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/movies/{movie_id}/Episodes"))
    }

    pub fn build_create_episode(&self, movie_id: i64, input: &NewEpisode) -> HttpRequest {
        self.multipart_request(
            HttpMethod::Post,
            &format!("/movies/{movie_id}/Episodes"),
            new_episode_form(input),
        )
    }

    pub fn build_update_episode(
        &self,
        movie_id: i64,
        episode_id: i64,
        input: &EpisodeUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Put,
            &format!("/movies/{movie_id}/Episodes/{episode_id}"),
            input,
        )
    }

    pub fn build_delete_episode(&self, movie_id: i64, episode_id: i64) -> HttpRequest {
        self.request(
            HttpMethod::Delete,
            &format!("/movies/{movie_id}/Episodes/{episode_id}"),
        )
    }

    pub fn build_replace_episode_video(
        &self,
        movie_id: i64,
        episode_id: i64,
        video: FilePart,
    ) -> HttpRequest {
        let mut form = MultipartForm::new();
        form.file("videoFile", video);
        self.multipart_request(
            HttpMethod::Put,
            &format!("/movies/{movie_id}/Episodes/{episode_id}/video"),
            form,
        )
    }

    /// The backend expects a bare JSON boolean as the body.
    pub fn build_set_episode_premium(
        &self,
        movie_id: i64,
        episode_id: i64,
        is_premium: bool,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Patch,
            &format!("/movies/{movie_id}/episodes/{episode_id}/premium"),
            &is_premium,
        )
    }
}

impl<T: Transport> AdminApi<T> {
    pub fn get_episodes(&self, movie_id: i64) -> Result<Vec<Episode>, ApiError> {
        parse_list(self.send(self.client.build_get_episodes(movie_id))?)
    }

    pub fn create_episode(
        &self,
        movie_id: i64,
        input: &NewEpisode,
    ) -> Result<Outcome<Episode>, ApiError> {
        parse_outcome(self.send(self.client.build_create_episode(movie_id, input))?)
    }

    pub fn update_episode(
        &self,
        movie_id: i64,
        episode_id: i64,
        input: &EpisodeUpdate,
    ) -> Result<Outcome<Episode>, ApiError> {
        let request = self.client.build_update_episode(movie_id, episode_id, input)?;
        parse_outcome(self.send(request)?)
    }

    pub fn delete_episode(&self, movie_id: i64, episode_id: i64) -> Result<Value, ApiError> {
        parse_ack(self.send(self.client.build_delete_episode(movie_id, episode_id))?)
    }

    pub fn replace_episode_video(
        &self,
        movie_id: i64,
        episode_id: i64,
        video: FilePart,
    ) -> Result<Outcome<Episode>, ApiError> {
        let request = self
            .client
            .build_replace_episode_video(movie_id, episode_id, video);
        parse_outcome(self.send(request)?)
    }

    pub fn set_episode_premium(
        &self,
        movie_id: i64,
        episode_id: i64,
        is_premium: bool,
    ) -> Result<Value, ApiError> {
        let request = self
            .client
            .build_set_episode_premium(movie_id, episode_id, is_premium)?;
        parse_ack(self.send(request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::http::Body;

    fn pilot() -> NewEpisode {
        NewEpisode {
            episode_number: 1,
            title: "Pilot".to_string(),
            description: None,
            duration: None,
            release_date: Some("2024-03-01T00:00:00Z".to_string()),
            video: FilePart::new("pilot.mp4", "video/mp4", vec![0, 0, 0, 24]),
        }
    }

    #[test]
    fn new_episode_form_defaults_duration_and_skips_empty_description() {
        let form = new_episode_form(&pilot());
        let names: Vec<&str> = form.parts().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["episodeNumber", "title", "duration", "releaseDate", "videoFile"]);
        assert_eq!(form.text_values("duration"), vec!["0"]);
    }

    #[test]
    fn premium_toggle_sends_bare_boolean() {
        let req = client().build_set_episode_premium(2, 9, true).unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, format!("{BASE_URL}/movies/2/episodes/9/premium"));
        assert_eq!(req.body, Some(Body::Json("true".to_string())));
    }

    #[test]
    fn replace_video_targets_video_subresource() {
        let req = client().build_replace_episode_video(2, 9, pilot().video);
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, format!("{BASE_URL}/movies/2/Episodes/9/video"));
        assert!(req.header("Content-Type").is_none());
        match req.body {
            Some(Body::Multipart(form)) => assert!(form.file_part("videoFile").is_some()),
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[test]
    fn get_episodes_decodes_list() {
        let api = api(vec![json_response(
            200,
            r#"[{"id":1,"episodeNumber":1,"title":"Pilot","isPremium":false,"videoUrl":"videos/1.mp4"}]"#,
        )]);
        let episodes = api.get_episodes(2).unwrap();
        assert_eq!(episodes[0].video_url.as_deref(), Some("videos/1.mp4"));
        assert_eq!(api.transport().last().path, format!("{BASE_URL}/movies/2/Episodes"));
    }
}
