//! YouTube Analytics API v2 `reports.query` for per-video lifetime metrics.

use super::google_api::{self, ApiSurface, GoogleApiClient};
use crate::error::Error;
use crate::Id;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{Map, Value};
use service::config::Config;

pub const METRICS: &str =
    "views,likes,dislikes,comments,impressions,ctr,averageViewDuration,averageViewPercentage";
/// Reports start at the launch of YouTube so the totals cover a video's whole lifetime.
pub const REPORT_START_DATE: &str = "2005-01-01";

/// One report row keyed by column header name, e.g. `"views" -> 1200`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoMetrics(Map<String, Value>);

impl VideoMetrics {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn as_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|value| {
            value
                .as_i64()
                .or_else(|| value.as_f64().map(|float| float.round() as i64))
        })
    }

    pub fn as_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }
}

impl From<Map<String, Value>> for VideoMetrics {
    fn from(values: Map<String, Value>) -> Self {
        Self(values)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    #[serde(default)]
    column_headers: Vec<ColumnHeader>,
    #[serde(default)]
    rows: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Deserialize)]
struct ColumnHeader {
    name: String,
}

pub struct YouTubeAnalyticsClient {
    api: GoogleApiClient,
}

impl YouTubeAnalyticsClient {
    pub fn new(api: GoogleApiClient) -> Self {
        Self { api }
    }

    pub async fn for_user(
        db: &DatabaseConnection,
        config: &Config,
        user_id: Id,
    ) -> Result<Self, Error> {
        Ok(Self::new(
            google_api::for_user(db, config, user_id, ApiSurface::YouTubeAnalytics).await?,
        ))
    }

    /// Lifetime metrics of one video of the authenticated user's channel up to `today`.
    /// A report without rows yields `None`.
    pub async fn fetch_video_metrics(
        &self,
        video_id: &str,
        today: NaiveDate,
    ) -> Result<Option<VideoMetrics>, Error> {
        let report: ReportResponse = self
            .api
            .get(
                "reports",
                &[
                    ("ids", "channel==MINE".to_string()),
                    ("startDate", REPORT_START_DATE.to_string()),
                    ("endDate", today.format("%Y-%m-%d").to_string()),
                    ("metrics", METRICS.to_string()),
                    ("dimensions", "video".to_string()),
                    ("filters", format!("video=={video_id}")),
                ],
            )
            .await?;

        let Some(first_row) = report.rows.and_then(|rows| rows.into_iter().next()) else {
            return Ok(None);
        };

        Ok(Some(
            report
                .column_headers
                .into_iter()
                .map(|header| header.name)
                .zip(first_row)
                .collect::<Map<String, Value>>()
                .into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn first_row_is_keyed_by_column_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/reports")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ids".into(), "channel==MINE".into()),
                Matcher::UrlEncoded("startDate".into(), "2005-01-01".into()),
                Matcher::UrlEncoded("endDate".into(), "2026-03-01".into()),
                Matcher::UrlEncoded("metrics".into(), METRICS.into()),
                Matcher::UrlEncoded("filters".into(), "video==dQw4w9WgXcQ".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"columnHeaders":[{"name":"video"},{"name":"views"},{"name":"averageViewPercentage"}],
                    "rows":[["dQw4w9WgXcQ",1200,43.5]]}"#,
            )
            .create_async()
            .await;

        let client = YouTubeAnalyticsClient::new(
            GoogleApiClient::new(
                "ya29.token",
                &format!("{}/v2", server.url()),
                ApiSurface::YouTubeAnalytics,
            )
            .unwrap(),
        );
        let metrics = client
            .fetch_video_metrics("dQw4w9WgXcQ", NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(metrics.as_i64("views"), Some(1200));
        assert_eq!(metrics.as_f64("averageViewPercentage"), Some(43.5));
        assert_eq!(metrics.get("impressions"), None);
    }

    #[tokio::test]
    async fn report_without_rows_is_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/reports")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"columnHeaders":[{"name":"views"}]}"#)
            .create_async()
            .await;

        let client = YouTubeAnalyticsClient::new(
            GoogleApiClient::new(
                "ya29.token",
                &format!("{}/v2", server.url()),
                ApiSurface::YouTubeAnalytics,
            )
            .unwrap(),
        );
        let metrics = client
            .fetch_video_metrics("dQw4w9WgXcQ", NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
            .await
            .unwrap();

        assert_eq!(metrics, None);
    }
}
