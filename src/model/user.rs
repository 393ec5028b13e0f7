use derive_new::new;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The authenticated user as returned by the backend's auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct User {
    pub id: String,
    #[new(default)]
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[new(default)]
    #[serde(default)]
    pub verified: bool,
    #[new(default)]
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

crate::define_collection!("users" : User = id);

impl User {
    /// A copy of the user holding only the identifying fields.
    pub fn trimmed(&self) -> Self {
        Self {
            id: self.id.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            verified: self.verified,
            fields: Map::new(),
        }
    }
}
