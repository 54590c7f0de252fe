//! Item id generation

use parking_lot::Mutex;
use std::collections::VecDeque;
use uuid::Uuid;

/// Source of candidate item ids
///
/// Ids only need to be unique with overwhelming probability: `add` detects
/// a collision at insert time and asks for another id.
pub trait IdGenerator: Send + Sync {
    /// A fresh candidate id
    fn generate(&self) -> String;
}

/// Random UUID v4 ids in hyphenated form
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Hands out a fixed list of ids, then falls back to UUIDs
///
/// Useful for forcing id collisions.
#[derive(Debug, Default)]
pub struct ScriptedIds {
    queue: Mutex<VecDeque<String>>,
}

impl ScriptedIds {
    /// Generator that yields `ids` in order first
    pub fn new<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            queue: Mutex::new(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Scripted ids not yet handed out
    pub fn remaining(&self) -> usize {
        self.queue.lock().len()
    }
}

impl IdGenerator for ScriptedIds {
    fn generate(&self) -> String {
        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| UuidGenerator.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_are_hyphenated_v4() {
        let id = UuidGenerator.generate();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id.len(), 36);
        assert_ne!(id, UuidGenerator.generate());
    }

    #[test]
    fn test_scripted_ids_then_fallback() {
        let ids = ScriptedIds::new(["a", "a", "b"]);
        assert_eq!(ids.generate(), "a");
        assert_eq!(ids.generate(), "a");
        assert_eq!(ids.remaining(), 1);
        assert_eq!(ids.generate(), "b");
        assert_eq!(ids.generate().len(), 36);
    }
}
