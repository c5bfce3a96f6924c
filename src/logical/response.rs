use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response produced by a backend. The router returns it untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl Response {
    pub fn with_data(key: impl Into<String>, value: Value) -> Self {
        let mut data = Map::new();
        data.insert(key.into(), value);
        Self { data, redirect: None }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}
