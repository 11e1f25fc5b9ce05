use uuid::Uuid;

pub mod projects;
pub mod scheduled_publish_status;
pub mod scheduled_publishes;
pub mod users;
pub mod video_status;
pub mod videos;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
