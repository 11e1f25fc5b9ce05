use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const UP_STATEMENTS: [&str; 8] = [
    "CREATE TYPE channel_insights.video_status AS ENUM (
        'not_analyzed',
        'pending',
        'completed',
        'failed'
    )",
    "CREATE TYPE channel_insights.scheduled_publish_status AS ENUM (
        'pending',
        'published',
        'failed'
    )",
    r#"
    CREATE TABLE IF NOT EXISTS channel_insights.users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        email VARCHAR(255) NOT NULL UNIQUE,
        google_id VARCHAR(255),
        name VARCHAR(255),
        access_token TEXT,
        refresh_token TEXT,
        token_expires_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS channel_insights.projects (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES channel_insights.users(id) ON DELETE CASCADE,
        channel_id VARCHAR(64) NOT NULL UNIQUE,
        channel_name VARCHAR(255) NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    // Analytics and analysis columns stay NULL until a sync or analysis fills them
    r#"
    CREATE TABLE IF NOT EXISTS channel_insights.videos (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        project_id UUID NOT NULL REFERENCES channel_insights.projects(id) ON DELETE CASCADE,
        video_id VARCHAR(32) NOT NULL UNIQUE,
        title TEXT NOT NULL,
        description TEXT,
        tags TEXT[] NOT NULL DEFAULT '{}',
        upload_time TIMESTAMPTZ,
        duration INTEGER,

        views BIGINT,
        likes BIGINT,
        dislikes BIGINT,
        comments_count BIGINT,
        impressions BIGINT,
        ctr DOUBLE PRECISION,
        avg_watch_time DOUBLE PRECISION,
        retention_curve JSONB,

        hook_length DOUBLE PRECISION,
        cta_position DOUBLE PRECISION,
        scene_cuts JSONB,
        script_segments JSONB,
        subtitle_text TEXT,
        editing_pattern TEXT,

        status channel_insights.video_status NOT NULL DEFAULT 'not_analyzed',
        analysis JSONB,

        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS channel_insights.scheduled_publishes (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES channel_insights.users(id) ON DELETE CASCADE,
        video_id VARCHAR(32) NOT NULL,
        publish_time TIMESTAMPTZ NOT NULL,
        comments TEXT[] NOT NULL DEFAULT '{}',
        status channel_insights.scheduled_publish_status NOT NULL DEFAULT 'pending',
        error_message TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_videos_project_upload_time
     ON channel_insights.videos(project_id, upload_time DESC)",
    // The dispatcher polls pending tasks by time
    "CREATE INDEX IF NOT EXISTS idx_scheduled_publishes_status_time
     ON channel_insights.scheduled_publishes(status, publish_time)",
];

const DOWN_STATEMENTS: [&str; 6] = [
    "DROP TABLE IF EXISTS channel_insights.scheduled_publishes",
    "DROP TABLE IF EXISTS channel_insights.videos",
    "DROP TABLE IF EXISTS channel_insights.projects",
    "DROP TABLE IF EXISTS channel_insights.users",
    "DROP TYPE IF EXISTS channel_insights.scheduled_publish_status",
    "DROP TYPE IF EXISTS channel_insights.video_status",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for statement in UP_STATEMENTS {
            manager.get_connection().execute_unprepared(statement).await?;
        }

        for table in ["users", "projects", "videos", "scheduled_publishes"] {
            manager
                .get_connection()
                .execute_unprepared(&format!(
                    "ALTER TABLE channel_insights.{table} OWNER TO channel_insights"
                ))
                .await?;
        }

        for enum_type in ["video_status", "scheduled_publish_status"] {
            manager
                .get_connection()
                .execute_unprepared(&format!(
                    "ALTER TYPE channel_insights.{enum_type} OWNER TO channel_insights"
                ))
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for statement in DOWN_STATEMENTS {
            manager.get_connection().execute_unprepared(statement).await?;
        }

        Ok(())
    }
}
