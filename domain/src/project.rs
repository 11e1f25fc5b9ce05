use crate::error::Error;
use crate::{projects, videos, Id};
use chrono::Utc;
use entity_api::mutate::{self, IntoUpdateMap, UpdateMap};
use entity_api::project;
use log::*;
use sea_orm::{DatabaseConnection, IntoActiveModel, Value};
use serde::Serialize;
use utoipa::ToSchema;

pub use entity_api::project::{find_by_id, find_by_id_and_user, find_with_videos};

/// Columns a client may change on a project.
const MUTABLE_COLUMNS: [&str; 2] = ["channel_name", "description"];

/// A project as returned to clients, with its videos nested.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectWithVideos {
    #[serde(flatten)]
    pub project: projects::Model,
    pub videos: Vec<videos::Model>,
}

impl From<(projects::Model, Vec<videos::Model>)> for ProjectWithVideos {
    fn from((project, videos): (projects::Model, Vec<videos::Model>)) -> Self {
        Self { project, videos }
    }
}

pub async fn find_by_user_with_videos(
    db: &DatabaseConnection,
    user_id: Id,
) -> Result<Vec<ProjectWithVideos>, Error> {
    Ok(project::find_by_user_with_videos(db, user_id)
        .await?
        .into_iter()
        .map(ProjectWithVideos::from)
        .collect())
}

/// Partially updates a project of `user_id`. Only the channel name and description can change.
pub async fn update(
    db: &DatabaseConnection,
    user_id: Id,
    id: Id,
    params: impl IntoUpdateMap,
) -> Result<projects::Model, Error> {
    let existing = project::find_by_id_and_user(db, id, user_id).await?;

    let mut requested = params.into_update_map();
    let mut update_map = UpdateMap::new();
    for column in MUTABLE_COLUMNS {
        update_map.insert(column.to_string(), requested.remove(column));
    }
    if update_map.is_empty() {
        debug!("Nothing to update on project {id}");
        return Ok(existing);
    }
    update_map.insert(
        "updated_at".to_string(),
        Some(Value::from(Utc::now().fixed_offset())),
    );

    Ok(mutate::update::<projects::ActiveModel, projects::Column>(
        db,
        existing.into_active_model(),
        update_map,
    )
    .await?)
}

/// Deletes a project of `user_id` together with its videos.
pub async fn delete(db: &DatabaseConnection, user_id: Id, id: Id) -> Result<(), Error> {
    project::find_by_id_and_user(db, id, user_id).await?;
    project::delete_with_videos(db, id).await?;
    info!("Deleted project {id}");
    Ok(())
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    struct Patch(Vec<(&'static str, Value)>);

    impl IntoUpdateMap for Patch {
        fn into_update_map(self) -> UpdateMap {
            let mut map = UpdateMap::new();
            for (key, value) in self.0 {
                map.insert(key.to_string(), Some(value));
            }
            map
        }
    }

    fn project(user_id: Id) -> projects::Model {
        let now = Utc::now();
        projects::Model {
            id: Id::new_v4(),
            user_id,
            channel_id: "UCabc".to_string(),
            channel_name: "Original".to_string(),
            description: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn update_ignores_immutable_columns() {
        let user_id = Id::new_v4();
        let existing = project(user_id);
        let mut renamed = existing.clone();
        renamed.channel_name = "Renamed".to_string();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()], vec![renamed.clone()]])
            .into_connection();

        let updated = update(
            &db,
            user_id,
            existing.id,
            Patch(vec![
                ("channel_name", Value::from("Renamed")),
                ("channel_id", Value::from("UChijacked")),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(updated.channel_name, "Renamed");
        let log = db.into_transaction_log();
        let update_sql = log[1].statements()[0].sql.clone();
        assert!(update_sql.contains("\"channel_name\""));
        assert!(!update_sql.contains("\"channel_id\" ="));
    }

    #[tokio::test]
    async fn delete_of_foreign_project_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<projects::Model>::new()])
            .into_connection();

        let err = delete(&db, Id::new_v4(), Id::new_v4()).await.unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound(None)))
        );
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_videos_then_project() {
        let user_id = Id::new_v4();
        let existing = project(user_id);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        delete(&db, user_id, existing.id).await.unwrap();

        let log = db.into_transaction_log();
        let statements = log[1].statements();
        assert!(statements[1].sql.starts_with(r#"DELETE FROM "channel_insights"."videos""#));
        assert!(statements[2].sql.starts_with(r#"DELETE FROM "channel_insights"."projects""#));
    }
}
