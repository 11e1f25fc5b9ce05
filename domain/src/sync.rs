//! Project sync: refreshes every upload of a project's channel with platform details,
//! analytics and derived analysis, one video at a time.
//!
//! Platform and analytics lookups are required; a failure there aborts the whole run. The
//! analysis service is best effort: a failed analysis leaves the derived columns as they were and
//! a failed embedding upload is only logged. Both are counted in the [`SyncReport`].
//!
//! A re-sync only writes the columns some source actually reported, so values stored by an
//! earlier run survive a source that has nothing to say this time.

use crate::duration::parse_iso8601_duration;
use crate::error::{DomainErrorKind, Error, InternalErrorKind};
use crate::gateway::analyzer::{AnalysisResult, AnalyzerClient, EmbeddingDocument};
use crate::gateway::youtube_analytics::{VideoMetrics, YouTubeAnalyticsClient};
use crate::gateway::youtube_data::{ChannelSelector, PlaylistItem, VideoResource, YouTubeDataClient};
use crate::video::blank_model;
use crate::youtube_reference::watch_url;
use crate::{videos, Id};
use chrono::{DateTime, Utc};
use entity_api::error::EntityApiErrorKind;
use entity_api::{project, video};
use log::*;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use service::config::Config;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub project_id: Id,
    pub videos_synced: usize,
    pub analysis_failures: usize,
    pub embedding_failures: usize,
}

/// Values one source knows about a video. `None` means "no opinion", so applying a patch never
/// erases what an earlier source provided.
#[derive(Debug, Default)]
struct VideoPatch {
    title: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    upload_time: Option<DateTime<Utc>>,
    duration: Option<i32>,
    views: Option<i64>,
    likes: Option<i64>,
    dislikes: Option<i64>,
    comments_count: Option<i64>,
    impressions: Option<i64>,
    ctr: Option<f64>,
    avg_watch_time: Option<f64>,
    retention_curve: Option<Value>,
    hook_length: Option<f64>,
    cta_position: Option<f64>,
    scene_cuts: Option<Value>,
    script_segments: Option<Value>,
    subtitle_text: Option<String>,
    editing_pattern: Option<String>,
}

impl VideoPatch {
    fn from_listing(item: &PlaylistItem) -> Self {
        let snippet = item.snippet.clone().unwrap_or_default();
        VideoPatch {
            title: snippet.title,
            upload_time: snippet.published_at,
            ..Default::default()
        }
    }

    fn from_details(resource: Option<&VideoResource>) -> Self {
        let Some(resource) = resource else {
            return Self::default();
        };
        let snippet = resource.snippet.clone().unwrap_or_default();
        let statistics = resource.statistics.clone().unwrap_or_default();
        VideoPatch {
            title: snippet.title,
            description: snippet.description,
            tags: snippet.tags,
            upload_time: snippet.published_at,
            duration: resource
                .content_details
                .as_ref()
                .and_then(|details| details.duration.as_deref())
                .and_then(parse_iso8601_duration),
            views: statistics.views(),
            likes: statistics.likes(),
            dislikes: statistics.dislikes(),
            comments_count: statistics.comments(),
            ..Default::default()
        }
    }

    fn from_analytics(metrics: Option<&VideoMetrics>) -> Self {
        let Some(metrics) = metrics else {
            return Self::default();
        };
        VideoPatch {
            impressions: metrics.as_i64("impressions"),
            ctr: metrics.as_f64("ctr"),
            avg_watch_time: metrics.as_f64("averageViewDuration"),
            retention_curve: metrics
                .get("averageViewPercentage")
                .map(|percentage| json!({ "percentage": percentage })),
            ..Default::default()
        }
    }

    fn from_analysis(analysis: &AnalysisResult) -> Self {
        VideoPatch {
            hook_length: analysis.hook_length,
            cta_position: analysis.cta_position,
            scene_cuts: analysis.scene_cuts.clone(),
            script_segments: analysis
                .transcript
                .as_ref()
                .map(|text| json!([{ "text": text, "start": 0, "end": 0 }])),
            subtitle_text: analysis.ocr_text.clone(),
            editing_pattern: analysis.editing_pattern.clone(),
            ..Default::default()
        }
    }

    /// Combines two patches; values of `later` win wherever it has one.
    fn overlay(self, later: VideoPatch) -> VideoPatch {
        VideoPatch {
            title: later.title.or(self.title),
            description: later.description.or(self.description),
            tags: later.tags.or(self.tags),
            upload_time: later.upload_time.or(self.upload_time),
            duration: later.duration.or(self.duration),
            views: later.views.or(self.views),
            likes: later.likes.or(self.likes),
            dislikes: later.dislikes.or(self.dislikes),
            comments_count: later.comments_count.or(self.comments_count),
            impressions: later.impressions.or(self.impressions),
            ctr: later.ctr.or(self.ctr),
            avg_watch_time: later.avg_watch_time.or(self.avg_watch_time),
            retention_curve: later.retention_curve.or(self.retention_curve),
            hook_length: later.hook_length.or(self.hook_length),
            cta_position: later.cta_position.or(self.cta_position),
            scene_cuts: later.scene_cuts.or(self.scene_cuts),
            script_segments: later.script_segments.or(self.script_segments),
            subtitle_text: later.subtitle_text.or(self.subtitle_text),
            editing_pattern: later.editing_pattern.or(self.editing_pattern),
        }
    }

    /// Columns this patch has a value for. Only these are written to an already stored video.
    fn columns(&self) -> Vec<videos::Column> {
        [
            (self.title.is_some(), videos::Column::Title),
            (self.description.is_some(), videos::Column::Description),
            (self.tags.is_some(), videos::Column::Tags),
            (self.upload_time.is_some(), videos::Column::UploadTime),
            (self.duration.is_some(), videos::Column::Duration),
            (self.views.is_some(), videos::Column::Views),
            (self.likes.is_some(), videos::Column::Likes),
            (self.dislikes.is_some(), videos::Column::Dislikes),
            (self.comments_count.is_some(), videos::Column::CommentsCount),
            (self.impressions.is_some(), videos::Column::Impressions),
            (self.ctr.is_some(), videos::Column::Ctr),
            (self.avg_watch_time.is_some(), videos::Column::AvgWatchTime),
            (self.retention_curve.is_some(), videos::Column::RetentionCurve),
            (self.hook_length.is_some(), videos::Column::HookLength),
            (self.cta_position.is_some(), videos::Column::CtaPosition),
            (self.scene_cuts.is_some(), videos::Column::SceneCuts),
            (self.script_segments.is_some(), videos::Column::ScriptSegments),
            (self.subtitle_text.is_some(), videos::Column::SubtitleText),
            (self.editing_pattern.is_some(), videos::Column::EditingPattern),
        ]
        .into_iter()
        .filter_map(|(present, column)| present.then_some(column))
        .collect()
    }

    fn apply(self, model: &mut videos::Model) {
        if let Some(title) = self.title {
            model.title = title;
        }
        if let Some(tags) = self.tags {
            model.tags = tags;
        }
        model.description = self.description.or(model.description.take());
        model.upload_time = self.upload_time.map(Into::into).or(model.upload_time.take());
        model.duration = self.duration.or(model.duration);
        model.views = self.views.or(model.views);
        model.likes = self.likes.or(model.likes);
        model.dislikes = self.dislikes.or(model.dislikes);
        model.comments_count = self.comments_count.or(model.comments_count);
        model.impressions = self.impressions.or(model.impressions);
        model.ctr = self.ctr.or(model.ctr);
        model.avg_watch_time = self.avg_watch_time.or(model.avg_watch_time);
        model.retention_curve = self.retention_curve.or(model.retention_curve.take());
        model.hook_length = self.hook_length.or(model.hook_length);
        model.cta_position = self.cta_position.or(model.cta_position);
        model.scene_cuts = self.scene_cuts.or(model.scene_cuts.take());
        model.script_segments = self.script_segments.or(model.script_segments.take());
        model.subtitle_text = self.subtitle_text.or(model.subtitle_text.take());
        model.editing_pattern = self.editing_pattern.or(model.editing_pattern.take());
    }
}

/// Builds the stored form of one upload together with the columns the sources filled in.
/// Later sources take precedence over earlier ones: listing, then platform details, then
/// analytics, then analysis.
fn merge_video(
    project_id: Id,
    video_id: &str,
    item: &PlaylistItem,
    details: Option<&VideoResource>,
    metrics: Option<&VideoMetrics>,
    analysis: &AnalysisResult,
) -> (videos::Model, Vec<videos::Column>) {
    let patch = VideoPatch::from_listing(item)
        .overlay(VideoPatch::from_details(details))
        .overlay(VideoPatch::from_analytics(metrics))
        .overlay(VideoPatch::from_analysis(analysis));
    let columns = patch.columns();

    let mut model = blank_model(project_id, video_id, "");
    patch.apply(&mut model);
    (model, columns)
}

/// Syncs every upload of a project of `user_id` from YouTube and the analysis service.
pub async fn sync_project_videos(
    db: &DatabaseConnection,
    config: &Config,
    user_id: Id,
    project_id: Id,
) -> Result<SyncReport, Error> {
    let project = match project::find_by_id_and_user(db, project_id, user_id).await {
        Ok(project) => project,
        Err(e) if e.error_kind == EntityApiErrorKind::RecordNotFound => {
            return Err(Error::not_found(format!(
                "Project with ID {project_id} not found."
            )))
        }
        Err(e) => return Err(e.into()),
    };
    info!(
        "Starting sync for project {project_id} (channel: {})",
        project.channel_id
    );

    let data_client = YouTubeDataClient::for_user(db, config, user_id).await?;
    let analytics_client = YouTubeAnalyticsClient::for_user(db, config, user_id).await?;
    let analyzer = AnalyzerClient::from_config(config)?;

    let uploads = data_client
        .list_uploads(
            &ChannelSelector::Id(project.channel_id.clone()),
            "snippet,status",
        )
        .await?;

    let mut report = SyncReport {
        project_id,
        videos_synced: 0,
        analysis_failures: 0,
        embedding_failures: 0,
    };
    let today = Utc::now().date_naive();

    for item in &uploads {
        let Some(video_id) = item
            .snippet
            .as_ref()
            .and_then(|snippet| snippet.resource_id.as_ref())
            .and_then(|resource_id| resource_id.video_id.as_deref())
        else {
            warn!("Skipping playlist item without a video id in project {project_id}");
            continue;
        };
        let url = watch_url(video_id);

        let details = data_client
            .fetch_video(video_id, "snippet,contentDetails,statistics")
            .await?;
        let metrics = analytics_client.fetch_video_metrics(video_id, today).await?;

        let analysis = match analyzer.analyze_video(&url, video_id).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Analysis of video {video_id} failed, continuing without it: {e:?}");
                report.analysis_failures += 1;
                AnalysisResult::default()
            }
        };

        let (merged, columns) = merge_video(
            project_id,
            video_id,
            item,
            details.as_ref(),
            metrics.as_ref(),
            &analysis,
        );
        let stored = video::upsert_by_video_id(db, merged, &columns).await?;
        debug!("Upserted video: {} ({})", stored.title, stored.video_id);
        report.videos_synced += 1;

        if let Some(transcript) = analysis.transcript.as_deref() {
            let document = EmbeddingDocument::transcript(
                video_id,
                &stored.title,
                &project_id.to_string(),
                transcript,
            );
            if let Err(e) = analyzer.store_embeddings(&document).await {
                warn!("Failed to store embeddings for video {video_id}: {e:?}");
                report.embedding_failures += 1;
            }
        }
    }

    info!("Sync for project {project_id} completed: {report:?}");
    Ok(report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncJob {
    pub user_id: Id,
    pub project_id: Id,
}

/// Runs project syncs on a background worker, one at a time in submission order, so a request
/// can hand off a sync without waiting for it.
#[derive(Debug, Clone)]
pub struct SyncQueue {
    sender: mpsc::UnboundedSender<SyncJob>,
}

impl SyncQueue {
    pub fn start(db: Arc<DatabaseConnection>, config: Config) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<SyncJob>();

        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                match sync_project_videos(&db, &config, job.user_id, job.project_id).await {
                    Ok(report) => info!("Background sync finished: {report:?}"),
                    Err(e) => error!(
                        "Background sync of project {} failed: {e:?}",
                        job.project_id
                    ),
                }
            }
            debug!("Sync queue closed");
        });

        Self { sender }
    }

    pub fn enqueue(&self, job: SyncJob) -> Result<(), Error> {
        self.sender.send(job).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Sync queue is not running".to_string(),
            )),
        })?;
        debug!("Queued sync of project {}", job.project_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> PlaylistItem {
        serde_json::from_str(
            r#"{"snippet":{"title":"Listed title","publishedAt":"2024-05-01T12:00:00Z",
                "resourceId":{"videoId":"dQw4w9WgXcQ"}}}"#,
        )
        .unwrap()
    }

    fn column_names(columns: &[videos::Column]) -> Vec<String> {
        columns.iter().map(|column| format!("{column:?}")).collect()
    }

    #[test]
    fn later_sources_take_precedence() {
        let details: VideoResource = serde_json::from_str(
            r#"{"id":"dQw4w9WgXcQ","snippet":{"title":"Detail title","tags":["music"]},
                "contentDetails":{"duration":"PT3M32S"},
                "statistics":{"viewCount":"1200","likeCount":"oops"}}"#,
        )
        .unwrap();
        let metrics: VideoMetrics = serde_json::from_value::<serde_json::Map<String, Value>>(
            json!({"impressions": 5000, "ctr": 4.2, "averageViewDuration": 97.0, "averageViewPercentage": 45.5}),
        )
        .map(VideoMetrics::from)
        .unwrap();
        let analysis = AnalysisResult {
            transcript: Some("never gonna".to_string()),
            ocr_text: Some("LIKE AND SUBSCRIBE".to_string()),
            hook_length: Some(2.5),
            ..Default::default()
        };

        let (model, columns) = merge_video(
            Id::new_v4(),
            "dQw4w9WgXcQ",
            &listing(),
            Some(&details),
            Some(&metrics),
            &analysis,
        );

        assert_eq!(model.title, "Detail title");
        assert_eq!(model.tags, vec!["music".to_string()]);
        assert!(model.upload_time.is_some());
        assert_eq!(model.duration, Some(212));
        assert_eq!(model.views, Some(1200));
        assert_eq!(model.likes, None);
        assert_eq!(model.impressions, Some(5000));
        assert_eq!(model.retention_curve, Some(json!({"percentage": 45.5})));
        assert_eq!(
            model.script_segments,
            Some(json!([{"text": "never gonna", "start": 0, "end": 0}]))
        );
        assert_eq!(model.subtitle_text.as_deref(), Some("LIKE AND SUBSCRIBE"));
        assert_eq!(model.hook_length, Some(2.5));
        let columns = column_names(&columns);
        assert!(columns.contains(&"HookLength".to_string()));
        assert!(!columns.contains(&"CtaPosition".to_string()));
        assert!(!columns.contains(&"Likes".to_string()));
    }

    #[test]
    fn missing_sources_leave_listing_values() {
        let (model, columns) = merge_video(
            Id::new_v4(),
            "dQw4w9WgXcQ",
            &listing(),
            None,
            None,
            &AnalysisResult::default(),
        );

        assert_eq!(model.title, "Listed title");
        assert_eq!(model.description, None);
        assert_eq!(model.hook_length, None);
        assert_eq!(model.script_segments, None);
        assert_eq!(column_names(&columns), vec!["Title", "UploadTime"]);
    }
}
