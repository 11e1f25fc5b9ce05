pub(crate) mod ask_controller;
pub(crate) mod auth_controller;
pub(crate) mod channel_controller;
pub(crate) mod health_check_controller;
pub(crate) mod project_controller;
pub(crate) mod short_controller;
pub(crate) mod upload_controller;
pub(crate) mod video_controller;
pub(crate) mod youtube_controller;
