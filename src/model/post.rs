use derive_new::new;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{now, Timestamp};

/// A post owned by a user. Fields the dashboard does not look at are kept as-is in `fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub creator_id: String,
    #[new(value = "now()")]
    pub created: Timestamp,
    #[new(default)]
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

crate::define_collection!("posts" : Post = id);

impl Post {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
