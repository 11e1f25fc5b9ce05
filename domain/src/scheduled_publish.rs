//! Scheduled publishing of private uploads. Requests are stored and a background dispatcher
//! publishes each video once its time has come, then posts the requested comments.

use crate::channel::list_all_videos;
use crate::error::Error;
use crate::gateway::youtube_data::{
    ChannelSelector, PlaylistItemSnippet, ResourceStatus, YouTubeDataClient,
};
use crate::{scheduled_publishes, Id};
use chrono::{DateTime, NaiveDateTime, Utc};
use entity_api::scheduled_publish;
use log::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use service::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

pub use entity_api::scheduled_publish::find_by_user;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePublishParams {
    pub video_id: Option<String>,
    /// RFC 3339 timestamp, or a local `YYYY-MM-DDTHH:MM[:SS]` value read as UTC
    pub publish_time: Option<String>,
    pub comments: Option<Vec<String>>,
}

/// A private upload of the user's own channel.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrivateVideo {
    pub id: String,
    #[schema(value_type = Option<Object>)]
    pub snippet: Option<PlaylistItemSnippet>,
    #[schema(value_type = Option<Object>)]
    pub status: Option<ResourceStatus>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub published: usize,
    pub failed: usize,
}

fn parse_publish_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|naive| naive.and_utc())
        })
}

pub async fn create(
    db: &DatabaseConnection,
    user_id: Id,
    params: SchedulePublishParams,
) -> Result<scheduled_publishes::Model, Error> {
    let (Some(video_id), Some(publish_time)) = (params.video_id, params.publish_time) else {
        return Err(Error::invalid("Missing required fields: videoId, publishTime."));
    };
    let publish_time = parse_publish_time(&publish_time)
        .ok_or_else(|| Error::invalid("Invalid publishTime format."))?;

    let comments = params
        .comments
        .unwrap_or_default()
        .into_iter()
        .filter(|comment| !comment.trim().is_empty())
        .collect();

    let task = scheduled_publish::create(db, user_id, video_id, publish_time, comments).await?;
    info!(
        "Scheduled video {} for publish at {}",
        task.video_id, task.publish_time
    );
    Ok(task)
}

pub async fn list_private_videos(
    db: &DatabaseConnection,
    config: &Config,
    user_id: Id,
) -> Result<Vec<PrivateVideo>, Error> {
    let uploads = list_all_videos(db, config, user_id, &ChannelSelector::Mine, "snippet,status").await?;

    Ok(uploads
        .into_iter()
        .filter(|item| item.is_private())
        .filter_map(|item| {
            let id = item.video_id()?.to_string();
            Some(PrivateVideo {
                id,
                snippet: item.snippet,
                status: item.status,
            })
        })
        .collect())
}

async fn publish(
    db: &DatabaseConnection,
    config: &Config,
    task: &scheduled_publishes::Model,
) -> Result<(), Error> {
    let client = YouTubeDataClient::for_user(db, config, task.user_id).await?;
    client.publish_video(&task.video_id).await?;
    for comment in &task.comments {
        client.post_comment(&task.video_id, comment).await?;
    }
    Ok(())
}

/// Publishes every pending task whose time is at or before `now`, recording each outcome.
pub async fn dispatch_due(
    db: &DatabaseConnection,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<DispatchSummary, Error> {
    let mut summary = DispatchSummary::default();

    for task in scheduled_publish::find_due(db, now).await? {
        match publish(db, config, &task).await {
            Ok(()) => {
                scheduled_publish::mark_published(db, task.id).await?;
                info!("Published scheduled video {}", task.video_id);
                summary.published += 1;
            }
            Err(e) => {
                warn!("Scheduled publish of video {} failed: {e:?}", task.video_id);
                scheduled_publish::mark_failed(db, task.id, format!("{:?}", e.error_kind)).await?;
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Periodically runs [`dispatch_due`] in the background.
pub struct PublishDispatcher;

impl PublishDispatcher {
    pub fn start(db: Arc<DatabaseConnection>, config: Config) -> JoinHandle<()> {
        let period = Duration::from_secs(config.publish_dispatch_interval_secs.max(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match dispatch_due(&db, &config, Utc::now()).await {
                    Ok(summary) if summary != DispatchSummary::default() => {
                        info!("Scheduled publish run: {summary:?}")
                    }
                    Ok(_) => {}
                    Err(e) => error!("Scheduled publish run failed: {e:?}"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_time_accepts_rfc3339_and_local_forms() {
        assert_eq!(
            parse_publish_time("2026-03-01T10:00:00+02:00").map(|t| t.to_rfc3339()),
            Some("2026-03-01T08:00:00+00:00".to_string())
        );
        assert!(parse_publish_time("2026-03-01T10:00").is_some());
        assert!(parse_publish_time("tomorrow").is_none());
    }
}
