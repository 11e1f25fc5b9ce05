use super::error::{EntityApiErrorKind, Error};
use async_trait::async_trait;
use axum_login::{AuthnBackend, UserId};
use chrono::Utc;
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, sea_query::OnConflict, ConnectionTrait, DatabaseConnection, Set,
};
use std::sync::Arc;

/// A Google account whose tokens have already been verified by the OAuth code exchange.
#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    pub google_id: String,
    pub email: String,
    pub name: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<chrono::DateTime<Utc>>,
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

pub async fn find_by_email(db: &impl ConnectionTrait, email: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await?)
}

/// Creates the user on first sign-in, or refreshes the Google id, name and tokens of an
/// existing user with the same email.
///
/// A refresh token is only issued on the first consent, so an absent one never overwrites a
/// stored one.
pub async fn upsert_by_email(db: &impl ConnectionTrait, identity: GoogleIdentity) -> Result<Model, Error> {
    debug!("Upserting user by email: {}", identity.email);

    let now = Utc::now();
    let mut update_columns = vec![
        Column::GoogleId,
        Column::Name,
        Column::AccessToken,
        Column::TokenExpiresAt,
        Column::UpdatedAt,
    ];
    if identity.refresh_token.is_some() {
        update_columns.push(Column::RefreshToken);
    }

    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        email: Set(identity.email),
        google_id: Set(Some(identity.google_id)),
        name: Set(identity.name),
        access_token: Set(Some(identity.access_token)),
        refresh_token: Set(identity.refresh_token),
        token_expires_at: Set(identity.token_expires_at.map(Into::into)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(Entity::insert(active_model)
        .on_conflict(
            OnConflict::column(Column::Email)
                .update_columns(update_columns)
                .to_owned(),
        )
        .exec_with_returning(db)
        .await?)
}

/// Replaces the stored access token after a refresh-token grant.
pub async fn update_access_token(
    db: &impl ConnectionTrait,
    user: Model,
    access_token: String,
    expires_at: Option<chrono::DateTime<Utc>>,
) -> Result<Model, Error> {
    debug!("Storing refreshed access token for user {}", user.id);

    let mut active_model: ActiveModel = user.into();
    active_model.access_token = Set(Some(access_token));
    active_model.token_expires_at = Set(expires_at.map(Into::into));
    active_model.updated_at = Set(Utc::now().into());
    Ok(active_model.update(db).await?)
}

#[derive(Debug, Clone)]
pub struct Backend {
    db: Arc<DatabaseConnection>,
}

impl Backend {
    pub fn new(db: &Arc<DatabaseConnection>) -> Self {
        Self { db: Arc::clone(db) }
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = Model;
    type Credentials = GoogleIdentity;
    type Error = Error;

    async fn authenticate(
        &self,
        identity: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        if identity.access_token.is_empty() {
            return Err(Error {
                source: None,
                error_kind: EntityApiErrorKind::RecordUnauthenticated,
            });
        }
        upsert_by_email(self.db.as_ref(), identity).await.map(Some)
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        Ok(Entity::find_by_id(*user_id).one(self.db.as_ref()).await?)
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;
