use chrono::{DateTime, Utc};
use domain::video_status::VideoStatus;
use domain::{IntoUpdateMap, UpdateMap};
use sea_orm::{JsonValue, Value};
use serde::Deserialize;
use utoipa::ToSchema;

/// Partial update of a stored video. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub upload_time: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
    pub comments_count: Option<i64>,
    pub impressions: Option<i64>,
    pub ctr: Option<f64>,
    pub avg_watch_time: Option<f64>,
    #[schema(value_type = Option<Object>)]
    pub retention_curve: Option<JsonValue>,
    pub hook_length: Option<f64>,
    pub cta_position: Option<f64>,
    #[schema(value_type = Option<Object>)]
    pub scene_cuts: Option<JsonValue>,
    #[schema(value_type = Option<Object>)]
    pub script_segments: Option<JsonValue>,
    pub subtitle_text: Option<String>,
    pub editing_pattern: Option<String>,
    #[schema(value_type = Option<String>)]
    pub status: Option<VideoStatus>,
    #[schema(value_type = Option<Object>)]
    pub analysis: Option<JsonValue>,
}

fn json(value: JsonValue) -> Value {
    Value::Json(Some(Box::new(value)))
}

impl IntoUpdateMap for UpdateParams {
    fn into_update_map(self) -> UpdateMap {
        let fields = [
            ("title", self.title.map(Value::from)),
            ("description", self.description.map(Value::from)),
            ("tags", self.tags.map(Value::from)),
            (
                "upload_time",
                self.upload_time.map(|time| Value::from(time.fixed_offset())),
            ),
            ("duration", self.duration.map(Value::from)),
            ("views", self.views.map(Value::from)),
            ("likes", self.likes.map(Value::from)),
            ("dislikes", self.dislikes.map(Value::from)),
            ("comments_count", self.comments_count.map(Value::from)),
            ("impressions", self.impressions.map(Value::from)),
            ("ctr", self.ctr.map(Value::from)),
            ("avg_watch_time", self.avg_watch_time.map(Value::from)),
            ("retention_curve", self.retention_curve.map(json)),
            ("hook_length", self.hook_length.map(Value::from)),
            ("cta_position", self.cta_position.map(Value::from)),
            ("scene_cuts", self.scene_cuts.map(json)),
            ("script_segments", self.script_segments.map(json)),
            ("subtitle_text", self.subtitle_text.map(Value::from)),
            ("editing_pattern", self.editing_pattern.map(Value::from)),
            (
                "status",
                self.status.map(|status| Value::from(status.to_string())),
            ),
            ("analysis", self.analysis.map(json)),
        ];

        let mut update_map = UpdateMap::new();
        for (column, value) in fields {
            update_map.insert(column.to_string(), value);
        }
        update_map
    }
}
