//! SeaORM Entity for the videos table.
//! A video merges platform metadata, analytics and externally derived analysis.

use crate::video_status::VideoStatus;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::videos::Model)]
#[sea_orm(schema_name = "channel_insights", table_name = "videos")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    #[serde(skip_deserializing)]
    pub project_id: Id,

    /// External YouTube video ID, unique across all videos
    #[sea_orm(unique)]
    pub video_id: String,

    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub upload_time: Option<DateTimeWithTimeZone>,

    /// Length in seconds
    pub duration: Option<i32>,

    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
    pub comments_count: Option<i64>,

    pub impressions: Option<i64>,
    /// Impression click-through rate as reported by YouTube Analytics
    pub ctr: Option<f64>,
    /// Average view duration in seconds
    pub avg_watch_time: Option<f64>,
    #[schema(value_type = Option<Object>)]
    pub retention_curve: Option<Json>,

    pub hook_length: Option<f64>,
    pub cta_position: Option<f64>,
    #[schema(value_type = Option<Object>)]
    pub scene_cuts: Option<Json>,
    #[schema(value_type = Option<Object>)]
    pub script_segments: Option<Json>,
    pub subtitle_text: Option<String>,
    pub editing_pattern: Option<String>,

    pub status: VideoStatus,

    /// Full payload posted back by the analysis service
    #[schema(value_type = Option<Object>)]
    pub analysis: Option<Json>,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Projects,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
