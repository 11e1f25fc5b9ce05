use super::error::Error;
use chrono::{DateTime, Utc};
use entity::scheduled_publish_status::ScheduledPublishStatus;
use entity::scheduled_publishes::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ActiveValue::Unchanged, ConnectionTrait, QueryOrder, Set};

pub async fn create(
    db: &impl ConnectionTrait,
    user_id: Id,
    video_id: String,
    publish_time: DateTime<Utc>,
    comments: Vec<String>,
) -> Result<Model, Error> {
    debug!("Scheduling publish of video {video_id} at {publish_time}");

    let now = Utc::now();
    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        user_id: Set(user_id),
        video_id: Set(video_id),
        publish_time: Set(publish_time.into()),
        comments: Set(comments),
        status: Set(ScheduledPublishStatus::Pending),
        error_message: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?)
}

pub async fn find_by_user(db: &impl ConnectionTrait, user_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::PublishTime)
        .all(db)
        .await?)
}

/// Pending tasks whose publish time has been reached, oldest first.
pub async fn find_due(db: &impl ConnectionTrait, now: DateTime<Utc>) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Status.eq(ScheduledPublishStatus::Pending))
        .filter(Column::PublishTime.lte(now))
        .order_by_asc(Column::PublishTime)
        .all(db)
        .await?)
}

pub async fn mark_published(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    set_outcome(db, id, ScheduledPublishStatus::Published, None).await
}

pub async fn mark_failed(
    db: &impl ConnectionTrait,
    id: Id,
    error_message: String,
) -> Result<Model, Error> {
    set_outcome(db, id, ScheduledPublishStatus::Failed, Some(error_message)).await
}

async fn set_outcome(
    db: &impl ConnectionTrait,
    id: Id,
    status: ScheduledPublishStatus,
    error_message: Option<String>,
) -> Result<Model, Error> {
    let active_model = ActiveModel {
        id: Unchanged(id),
        status: Set(status),
        error_message: Set(error_message),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    };
    Ok(active_model.update(db).await?)
}
