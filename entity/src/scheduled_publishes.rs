//! A request to flip a private video to public at a given time and then post comments on it.

use crate::scheduled_publish_status::ScheduledPublishStatus;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::scheduled_publishes::Model)]
#[sea_orm(schema_name = "channel_insights", table_name = "scheduled_publishes")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    #[serde(skip_deserializing)]
    pub user_id: Id,
    /// External YouTube video ID
    pub video_id: String,
    #[schema(value_type = String, format = DateTime)]
    pub publish_time: DateTimeWithTimeZone,
    pub comments: Vec<String>,
    #[serde(skip_deserializing)]
    pub status: ScheduledPublishStatus,
    #[serde(skip_deserializing)]
    pub error_message: Option<String>,
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
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
