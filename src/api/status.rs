//! Latest status line per tag for a status/log collaborator

use crate::core::TagId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct TagStatusBoard {
    entries: BTreeMap<TagId, String>,
}

impl TagStatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, tag_id: TagId, status: String) {
        self.entries.insert(tag_id, status);
    }

    pub fn get(&self, tag_id: TagId) -> Option<&str> {
        self.entries.get(&tag_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// One line per tag in ascending tag order
    pub fn render(&self) -> String {
        self.entries.values().cloned().collect::<Vec<_>>().join("\n")
    }
}
