use serde_json::{Map, Value as Json};

use crate::error::GambitError;

/// Namespaced per-rule state with LIFO undo snapshots.
///
/// Namespaces are lazily initialized and live for the enclosing match; the
/// engine resets the store on new-game start.
#[derive(Debug, Default)]
pub struct StateStore {
    namespaces: Map<String, Json>,
    undo_stack: Vec<Map<String, Json>>,
}

impl StateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the namespace's state, installing `initial` on first reference.
    pub fn get_or_init(&mut self, namespace: &str, initial: Json) -> &mut Json {
        self.namespaces
            .entry(namespace.to_owned())
            .or_insert(initial)
    }

    /// The whole namespace map, for read-only condition evaluation.
    #[must_use]
    pub fn namespaces(&self) -> &Map<String, Json> {
        &self.namespaces
    }

    /// Set one key inside a namespace, creating the namespace as an object
    /// if needed.
    pub fn set_path(&mut self, namespace: &str, key: &str, value: Json) {
        let ns = self.get_or_init(namespace, Json::Object(Map::new()));
        if let Json::Object(map) = ns {
            map.insert(key.to_owned(), value);
        } else {
            let mut map = Map::new();
            map.insert(key.to_owned(), value);
            *ns = Json::Object(map);
        }
    }

    #[must_use]
    pub fn get(&self, namespace: &str, key: &str) -> Option<&Json> {
        self.namespaces.get(namespace)?.get(key)
    }

    /// Remove one key from a namespace. Returns whether it was present.
    pub fn remove_path(&mut self, namespace: &str, key: &str) -> bool {
        match self.namespaces.get_mut(namespace) {
            Some(Json::Object(map)) => map.remove(key).is_some(),
            _ => false,
        }
    }

    /// Snapshot the current namespace map onto the undo stack.
    pub fn push_undo(&mut self) {
        self.undo_stack.push(self.namespaces.clone());
    }

    /// Restore and discard the most recent snapshot. Returns false when the
    /// stack is empty.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(snapshot) => {
                self.namespaces = snapshot;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn serialize(&self) -> String {
        Json::Object(self.namespaces.clone()).to_string()
    }

    /// Replace the namespace map with a previously serialized blob. The undo
    /// stack is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`GambitError::Json`] if the blob is not a JSON object.
    pub fn deserialize(&mut self, blob: &str) -> Result<(), GambitError> {
        let value: Json = serde_json::from_str(blob)?;
        match value {
            Json::Object(map) => {
                self.namespaces = map;
                self.undo_stack.clear();
                Ok(())
            }
            other => Err(GambitError::Json(serde::de::Error::custom(format!(
                "state blob must be an object, got {other}"
            )))),
        }
    }

    pub fn reset(&mut self) {
        self.namespaces.clear();
        self.undo_stack.clear();
    }
}
