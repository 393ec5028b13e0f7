use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::aggregate::Contribution;

/// One rating left on a post. `count` may be missing on records written by older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct Turd {
    #[new(default)]
    #[serde(default)]
    pub id: String,
    pub post_id: String,
    #[serde(default)]
    pub count: Option<i64>,
}

crate::define_collection!("turds" : Turd = id);

impl Contribution for Turd {
    fn parent_id(&self) -> &str {
        &self.post_id
    }

    fn amount(&self) -> Option<i64> {
        self.count
    }
}
