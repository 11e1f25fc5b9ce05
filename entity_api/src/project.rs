use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::projects::{ActiveModel, Column, Entity, Model};
use entity::{videos, Id};
use log::*;
use sea_orm::{
    entity::prelude::*, ConnectionTrait, IntoActiveModel, QueryOrder, Set, TransactionTrait,
};

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Finds a project only when it is owned by `user_id`; a project owned by anyone else is
/// reported exactly like a missing one.
pub async fn find_by_id_and_user(
    db: &impl ConnectionTrait,
    id: Id,
    user_id: Id,
) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

pub async fn find_by_channel_id(
    db: &impl ConnectionTrait,
    channel_id: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::ChannelId.eq(channel_id))
        .one(db)
        .await?)
}

pub async fn find_by_user_with_videos(
    db: &impl ConnectionTrait,
    user_id: Id,
) -> Result<Vec<(Model, Vec<videos::Model>)>, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::CreatedAt)
        .find_with_related(videos::Entity)
        .all(db)
        .await?)
}

pub async fn find_with_videos(
    db: &impl ConnectionTrait,
    id: Id,
) -> Result<(Model, Vec<videos::Model>), Error> {
    Entity::find_by_id(id)
        .find_with_related(videos::Entity)
        .all(db)
        .await?
        .into_iter()
        .next()
        .ok_or_else(Error::not_found)
}

/// Creates or refreshes the project tracking `channel_id`.
///
/// An existing project keeps its owner; refreshing a channel tracked by another user fails
/// with `RecordNotFound` so no data of that user is touched or returned.
pub async fn upsert_by_channel_id(
    db: &impl ConnectionTrait,
    user_id: Id,
    channel_id: &str,
    channel_name: String,
    description: Option<String>,
) -> Result<Model, Error> {
    let now = Utc::now();

    match find_by_channel_id(db, channel_id).await? {
        Some(existing) if existing.user_id != user_id => {
            warn!("Channel {channel_id} is already tracked by another user");
            Err(Error::not_found())
        }
        Some(existing) => {
            debug!("Refreshing project {} for channel {channel_id}", existing.id);
            let mut active_model = existing.into_active_model();
            active_model.channel_name = Set(channel_name);
            active_model.description = Set(description);
            active_model.updated_at = Set(now.into());
            Ok(active_model.update(db).await?)
        }
        None => {
            debug!("Creating project for channel {channel_id}");
            let active_model = ActiveModel {
                id: Set(Id::new_v4()),
                user_id: Set(user_id),
                channel_id: Set(channel_id.to_string()),
                channel_name: Set(channel_name),
                description: Set(description),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };
            Ok(active_model.insert(db).await?)
        }
    }
}

/// Deletes the project and its videos atomically.
pub async fn delete_with_videos(db: &impl TransactionTrait, id: Id) -> Result<(), Error> {
    let txn = db.begin().await?;

    videos::Entity::delete_many()
        .filter(videos::Column::ProjectId.eq(id))
        .exec(&txn)
        .await?;

    let result = Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        });
    }

    txn.commit().await?;
    Ok(())
}
