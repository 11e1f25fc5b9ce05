//! This module re-exports various items from the `entity_api` crate.
//!
//! The purpose of this re-export is to ensure that consumers of the `domain` crate do not need to
//! directly depend on the `entity_api` crate. Entities and update maps are both
//! reached through `domain`, while the persistence details stay in `entity_api`.
pub use entity_api::mutate::{IntoUpdateMap, UpdateMap};

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{
    projects, scheduled_publish_status, scheduled_publishes, users, video_status, videos, Id,
};

pub mod ask;
pub mod channel;
pub mod duration;
pub mod error;
pub mod project;
pub mod scheduled_publish;
pub mod sync;
pub mod user;
pub mod video;
pub mod youtube_reference;

pub mod gateway;
