use crate::Id;
use axum_login::AuthUser;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An account created by signing in with Google. The stored token pair authorizes every
/// YouTube Data and Analytics call made on the user's behalf.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::users::Model)]
#[sea_orm(schema_name = "channel_insights", table_name = "users")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    #[sea_orm(unique)]
    pub email: String,
    pub google_id: Option<String>,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub access_token: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub refresh_token: Option<String>,
    #[serde(skip)]
    #[schema(ignore)]
    pub token_expires_at: Option<DateTimeWithTimeZone>,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::projects::Entity")]
    Projects,
    #[sea_orm(has_many = "super::scheduled_publishes::Entity")]
    ScheduledPublishes,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::scheduled_publishes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduledPublishes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl AuthUser for Model {
    type Id = Id;

    fn id(&self) -> Self::Id {
        self.id
    }

    // Sessions are invalidated when the linked Google account changes.
    fn session_auth_hash(&self) -> &[u8] {
        self.google_id.as_deref().unwrap_or(&self.email).as_bytes()
    }
}
