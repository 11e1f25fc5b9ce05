use chrono::Utc;
use log::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub use entity::{
    projects, scheduled_publish_status, scheduled_publishes, users, video_status, videos, Id,
};

pub mod error;
pub mod mutate;
pub mod project;
pub mod scheduled_publish;
pub mod user;
pub mod video;

/// Inserts a demo user owning one project with a couple of unanalyzed videos, for local
/// development against an empty database.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let now = Utc::now();

    let demo_user = users::ActiveModel {
        id: Set(Id::new_v4()),
        email: Set("demo.creator@example.com".to_owned()),
        google_id: Set(None),
        name: Set(Some("Demo Creator".to_owned())),
        access_token: Set(None),
        refresh_token: Set(None),
        token_expires_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;

    let demo_project = projects::ActiveModel {
        id: Set(Id::new_v4()),
        user_id: Set(demo_user.id),
        channel_id: Set("UC_demo_channel_0000000".to_owned()),
        channel_name: Set("Demo Channel".to_owned()),
        description: Set(Some("A channel seeded for local development".to_owned())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;

    for (video_id, title, duration) in [
        ("dQw4w9WgXcQ", "Channel trailer", 212),
        ("9bZkp7q19f0", "Behind the scenes", 253),
    ] {
        videos::ActiveModel {
            id: Set(Id::new_v4()),
            project_id: Set(demo_project.id),
            video_id: Set(video_id.to_owned()),
            title: Set(title.to_owned()),
            description: Set(None),
            tags: Set(vec!["demo".to_owned()]),
            upload_time: Set(Some(now.into())),
            duration: Set(Some(duration)),
            views: Set(None),
            likes: Set(None),
            dislikes: Set(None),
            comments_count: Set(None),
            impressions: Set(None),
            ctr: Set(None),
            avg_watch_time: Set(None),
            retention_curve: Set(None),
            hook_length: Set(None),
            cta_position: Set(None),
            scene_cuts: Set(None),
            script_segments: Set(None),
            subtitle_text: Set(None),
            editing_pattern: Set(None),
            status: Set(video_status::VideoStatus::NotAnalyzed),
            analysis: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await?;
    }

    info!(
        "Seeded user {} with project {}",
        demo_user.email, demo_project.channel_name
    );
    Ok(())
}
