use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::video_status::VideoStatus;
use entity::videos::{ActiveModel, Column, Entity, Model};
use entity::{projects, Id};
use log::*;
use sea_orm::{
    entity::prelude::*, ActiveValue::Unchanged, ConnectionTrait, IntoActiveModel, QueryOrder,
    Set,
};

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

pub async fn find_by_video_id(
    db: &impl ConnectionTrait,
    video_id: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::VideoId.eq(video_id))
        .one(db)
        .await?)
}

/// Finds a video by its external id, but only within projects owned by `user_id`.
pub async fn find_by_video_id_and_user(
    db: &impl ConnectionTrait,
    video_id: &str,
    user_id: Id,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .inner_join(projects::Entity)
        .filter(Column::VideoId.eq(video_id))
        .filter(projects::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

pub async fn find_by_project(db: &impl ConnectionTrait, project_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::ProjectId.eq(project_id))
        .order_by_desc(Column::UploadTime)
        .all(db)
        .await?)
}

pub async fn create(db: &impl ConnectionTrait, video_model: Model) -> Result<Model, Error> {
    debug!("New video model to be inserted: {}", video_model.video_id);

    let now = Utc::now();
    let mut active_model = video_model.into_active_model();
    active_model.id = Set(Id::new_v4());
    active_model.created_at = Set(now.into());
    active_model.updated_at = Set(now.into());

    Ok(active_model.insert(db).await?)
}

/// Creates the video identified by `video_model.video_id`, or overwrites `update_columns` of
/// the existing row with the values carried by `video_model`.
///
/// Columns not listed keep their stored value on update, so a caller that only knows part of
/// a video cannot erase the rest. A video already tracked under a different project is never
/// moved; that case fails with `ValidationError`.
pub async fn upsert_by_video_id(
    db: &impl ConnectionTrait,
    video_model: Model,
    update_columns: &[Column],
) -> Result<Model, Error> {
    match find_by_video_id(db, &video_model.video_id).await? {
        Some(existing) if existing.project_id != video_model.project_id => {
            warn!(
                "Video {} belongs to project {}, refusing to upsert it under {}",
                existing.video_id, existing.project_id, video_model.project_id
            );
            Err(Error {
                source: None,
                error_kind: EntityApiErrorKind::ValidationError,
            })
        }
        Some(existing) => {
            let mut active_model = existing.into_active_model();
            for column in update_columns {
                active_model.set(*column, video_model.get(*column));
            }
            active_model.updated_at = Set(Utc::now().into());
            Ok(active_model.update(db).await?)
        }
        None => create(db, video_model).await,
    }
}

pub async fn update_status(
    db: &impl ConnectionTrait,
    id: Id,
    status: VideoStatus,
) -> Result<Model, Error> {
    debug!("Setting status of video {id} to {status}");

    let active_model = ActiveModel {
        id: Unchanged(id),
        status: Set(status),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    };
    Ok(active_model.update(db).await?)
}

/// Stores the analysis payload and marks the video `Completed`.
pub async fn complete_analysis(
    db: &impl ConnectionTrait,
    id: Id,
    analysis: Json,
) -> Result<Model, Error> {
    let active_model = ActiveModel {
        id: Unchanged(id),
        status: Set(VideoStatus::Completed),
        analysis: Set(Some(analysis)),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    };
    Ok(active_model.update(db).await?)
}

pub async fn delete_by_id(db: &impl ConnectionTrait, id: Id) -> Result<(), Error> {
    let result = Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }
    Ok(())
}
