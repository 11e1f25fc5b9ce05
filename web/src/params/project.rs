use sea_orm::Value;
use serde::Deserialize;
use utoipa::ToSchema;

use domain::{IntoUpdateMap, UpdateMap};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParams {
    pub channel_name: Option<String>,
    pub description: Option<String>,
}

impl IntoUpdateMap for UpdateParams {
    fn into_update_map(self) -> UpdateMap {
        let mut update_map = UpdateMap::new();
        update_map.insert("channel_name".to_string(), self.channel_name.map(Value::from));
        update_map.insert("description".to_string(), self.description.map(Value::from));
        update_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_present_fields_reach_the_update_map() {
        let params: UpdateParams = serde_json::from_str(r#"{"channelName":"Renamed"}"#).unwrap();
        let update_map = params.into_update_map();

        assert_eq!(update_map.get("channel_name"), Some(&Value::from("Renamed")));
        assert_eq!(update_map.get("description"), None);
    }
}
