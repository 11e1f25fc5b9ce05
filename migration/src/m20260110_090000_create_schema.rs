use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS channel_insights;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO channel_insights, public;")
            .await?;

        // The application role runs every query against this schema
        manager
            .get_connection()
            .execute_unprepared(r#"
                DO $$ BEGIN
                    GRANT ALL ON SCHEMA channel_insights TO channel_insights;

                    ALTER DEFAULT PRIVILEGES IN SCHEMA channel_insights GRANT ALL ON TABLES TO channel_insights;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA channel_insights GRANT ALL ON SEQUENCES TO channel_insights;
                END $$;
            "#)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(r#"
                DO $$ BEGIN
                    ALTER DEFAULT PRIVILEGES IN SCHEMA channel_insights REVOKE ALL ON SEQUENCES FROM channel_insights;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA channel_insights REVOKE ALL ON TABLES FROM channel_insights;
                    REVOKE ALL ON SCHEMA channel_insights FROM channel_insights;
                END $$;
            "#)
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS channel_insights CASCADE;")
            .await?;

        Ok(())
    }
}
