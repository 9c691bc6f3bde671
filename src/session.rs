//! Saved widget data for the running preview session.
//!
//! The state lives for the lifetime of the process and is lost on restart.

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Holds the most recently saved widget data.
///
/// Every save shallow-merges the incoming fields onto the held object, so a
/// partial update never drops fields saved earlier.
#[derive(Debug, Default)]
pub struct SessionState {
    data: RwLock<Option<Map<String, Value>>>,
}

impl SessionState {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `partial` onto the held object, creating it if absent.
    pub fn save_data(&self, partial: Map<String, Value>) {
        let mut data = self.data.write();
        let held = data.get_or_insert_with(Map::new);
        for (key, value) in partial {
            held.insert(key, value);
        }
        tracing::debug!(fields = held.len(), "Saved widget data");
    }

    /// The held object, or `None` if nothing was saved yet.
    pub fn current_data(&self) -> Option<Value> {
        self.data.read().clone().map(Value::Object)
    }
}
