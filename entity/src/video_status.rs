use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Analysis lifecycle of a video: `NotAnalyzed` → `Pending` → `Completed` | `Failed`.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    EnumIter,
    Deserialize,
    Default,
    Serialize,
    DeriveActiveEnum,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "video_status")]
pub enum VideoStatus {
    #[sea_orm(string_value = "not_analyzed")]
    #[default]
    NotAnalyzed,
    /// Analysis was requested and the analysis service has not reported back yet
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoStatus::NotAnalyzed => write!(fmt, "not_analyzed"),
            VideoStatus::Pending => write!(fmt, "pending"),
            VideoStatus::Completed => write!(fmt, "completed"),
            VideoStatus::Failed => write!(fmt, "failed"),
        }
    }
}
