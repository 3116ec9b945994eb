//! Admin statistics endpoints and the small aggregations dashboards derive
//! from them.

use super::{parse_list, parse_record, AdminApi, AdminClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;
use crate::types::{
    ActiveUser, DashboardStats, GenreDistribution, GenrePopularity, MonthlySummary, MovieRanking,
    NewUsersPoint, Review, ReviewsSummary, UserActivityPoint,
};

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_DAYS: u32 = 30;
pub const DEFAULT_MONTHS: u32 = 12;

impl AdminClient {
    fn stats(&self, endpoint: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/admin/stats/{endpoint}"))
    }

    pub fn build_get_dashboard_stats(&self) -> HttpRequest {
        self.stats("overview")
    }

    pub fn build_get_popular_movies(&self, limit: u32) -> HttpRequest {
        self.stats(&format!("popular-movies?limit={limit}"))
    }

    pub fn build_get_top_rated_movies(&self, limit: u32) -> HttpRequest {
        self.stats(&format!("top-rated-movies?limit={limit}"))
    }

    pub fn build_get_genre_distribution(&self) -> HttpRequest {
        self.stats("genre-distribution")
    }

    pub fn build_get_user_activity(&self, days: u32) -> HttpRequest {
        self.stats(&format!("user-activity?days={days}"))
    }

    pub fn build_get_reviews_summary(&self) -> HttpRequest {
        self.stats("reviews-summary")
    }

    pub fn build_get_new_users(&self, days: u32) -> HttpRequest {
        self.stats(&format!("new-users?days={days}"))
    }

    pub fn build_get_genre_popularity(&self) -> HttpRequest {
        self.stats("genre-popularity")
    }

    pub fn build_get_active_users(&self, limit: u32) -> HttpRequest {
        self.stats(&format!("active-users?limit={limit}"))
    }

    pub fn build_get_monthly_summary(&self, months: u32) -> HttpRequest {
        self.stats(&format!("monthly-summary?months={months}"))
    }
}

impl<T: Transport> AdminApi<T> {
    pub fn get_dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        parse_record(self.send(self.client.build_get_dashboard_stats())?)
    }

    pub fn get_popular_movies(&self, limit: u32) -> Result<Vec<MovieRanking>, ApiError> {
        parse_list(self.send(self.client.build_get_popular_movies(limit))?)
    }

    pub fn get_top_rated_movies(&self, limit: u32) -> Result<Vec<MovieRanking>, ApiError> {
        parse_list(self.send(self.client.build_get_top_rated_movies(limit))?)
    }

    pub fn get_genre_distribution(&self) -> Result<Vec<GenreDistribution>, ApiError> {
        parse_list(self.send(self.client.build_get_genre_distribution())?)
    }

    pub fn get_user_activity(&self, days: u32) -> Result<Vec<UserActivityPoint>, ApiError> {
        parse_list(self.send(self.client.build_get_user_activity(days))?)
    }

    pub fn get_reviews_summary(&self) -> Result<ReviewsSummary, ApiError> {
        parse_record(self.send(self.client.build_get_reviews_summary())?)
    }

    pub fn get_new_users(&self, days: u32) -> Result<Vec<NewUsersPoint>, ApiError> {
        parse_list(self.send(self.client.build_get_new_users(days))?)
    }

    pub fn get_genre_popularity(&self) -> Result<Vec<GenrePopularity>, ApiError> {
        parse_list(self.send(self.client.build_get_genre_popularity())?)
    }

    pub fn get_active_users(&self, limit: u32) -> Result<Vec<ActiveUser>, ApiError> {
        parse_list(self.send(self.client.build_get_active_users(limit))?)
    }

    pub fn get_monthly_summary(&self, months: u32) -> Result<Vec<MonthlySummary>, ApiError> {
        parse_list(self.send(self.client.build_get_monthly_summary(months))?)
    }
}

/// Mean rating, `None` for no reviews.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: f64 = reviews.iter().map(|r| r.rating).sum();
    Some(sum / reviews.len() as f64)
}

pub fn total_new_users(points: &[NewUsersPoint]) -> u64 {
    points.iter().map(|p| p.new_users).sum()
}

/// Largest value, never below 1, so bar widths can divide by it.
pub fn bar_scale_max(values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().max().unwrap_or(0).max(1)
}

/// Width of a bar as a percentage of `max`, clamped to 0..=100.
pub fn bar_percent(value: u64, max: u64) -> f64 {
    let max = max.max(1) as f64;
    (value as f64 / max * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn review(id: i64, rating: f64) -> Review {
        serde_json::from_value(serde_json::json!({ "id": id, "rating": rating })).unwrap()
    }

    #[test]
    fn stats_paths_carry_query_parameters() {
        let c = client();
        assert_eq!(
            c.build_get_top_rated_movies(5).path,
            format!("{BASE_URL}/admin/stats/top-rated-movies?limit=5")
        );
        assert_eq!(
            c.build_get_new_users(DEFAULT_DAYS).path,
            format!("{BASE_URL}/admin/stats/new-users?days=30")
        );
        assert_eq!(
            c.build_get_monthly_summary(DEFAULT_MONTHS).path,
            format!("{BASE_URL}/admin/stats/monthly-summary?months=12")
        );
        assert_eq!(
            c.build_get_active_users(DEFAULT_LIMIT).path,
            format!("{BASE_URL}/admin/stats/active-users?limit=10")
        );
        assert_eq!(c.build_get_dashboard_stats().path, format!("{BASE_URL}/admin/stats/overview"));
    }

    #[test]
    fn dashboard_stats_decode() {
        let api = api(vec![json_response(
            200,
            r#"{"totalUsers":40,"totalMovies":12,"totalViews":9000,"totalReviews":77}"#,
        )]);
        let stats = api.get_dashboard_stats().unwrap();
        assert_eq!(stats.total_views, 9000);
        assert_eq!(stats.total_reviews, 77);
    }

    #[test]
    fn empty_monthly_summary_is_empty_list() {
        let api = api(vec![json_response(200, "")]);
        assert!(api.get_monthly_summary(6).unwrap().is_empty());
    }

    #[test]
    fn average_rating_over_reviews() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[review(1, 8.0), review(2, 6.0), review(3, 7.0)]), Some(7.0));
    }

    #[test]
    fn new_user_totals_and_bar_scaling() {
        let points: Vec<NewUsersPoint> = serde_json::from_str(
            r#"[{"date":"2024-05-01","newUsers":3},{"date":"2024-05-02","newUsers":0},{"date":"2024-05-03","newUsers":9}]"#,
        )
        .unwrap();
        assert_eq!(total_new_users(&points), 12);

        let max = bar_scale_max(points.iter().map(|p| p.new_users));
        assert_eq!(max, 9);
        assert!((bar_percent(3, max) - 33.33).abs() < 0.01);
        assert_eq!(bar_scale_max(Vec::new()), 1);
        assert_eq!(bar_percent(0, 0), 0.0);
    }
}
