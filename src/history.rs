use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    pub word: String,
    pub result: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl SearchEntry {
    pub fn new(word: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            result: result.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Back/forward log of lookups with a cursor.
///
/// Only a branching `record_result` changes the entries; navigation moves the
/// cursor.
#[derive(Debug, Clone, Default)]
pub struct NavigationHistory {
    entries: Vec<SearchEntry>,
    current_index: Option<usize>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finished lookup.
    ///
    /// With `branch`, every entry after the cursor is dropped before the new
    /// entry becomes the tip. Without it (replays) nothing changes.
    pub fn record_result(&mut self, word: &str, result: &str, branch: bool) -> Option<&SearchEntry> {
        if !branch {
            return None;
        }

        let keep = self.current_index.map_or(0, |i| i + 1);
        self.entries.truncate(keep);

        self.entries.push(SearchEntry::new(word, result));
        self.current_index = Some(self.entries.len() - 1);
        self.entries.last()
    }

    pub fn can_go_back(&self) -> bool {
        self.current_index.is_some_and(|i| i > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.current_index
            .is_some_and(|i| i + 1 < self.entries.len())
    }

    pub fn back(&mut self) -> Option<&SearchEntry> {
        if !self.can_go_back() {
            return None;
        }
        let index = self.current_index? - 1;
        self.current_index = Some(index);
        self.entries.get(index)
    }

    pub fn forward(&mut self) -> Option<&SearchEntry> {
        if !self.can_go_forward() {
            return None;
        }
        let index = self.current_index? + 1;
        self.current_index = Some(index);
        self.entries.get(index)
    }

    pub fn jump_to(&mut self, index: usize) -> Option<&SearchEntry> {
        if index >= self.entries.len() || self.current_index == Some(index) {
            return None;
        }
        self.current_index = Some(index);
        self.entries.get(index)
    }

    pub fn current(&self) -> Option<&SearchEntry> {
        self.current_index.and_then(|i| self.entries.get(i))
    }

    /// Cursor position, `None` when empty.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the log with loaded data. A stored index outside the entries
    /// is clamped to the tip.
    pub fn restore(&mut self, entries: Vec<SearchEntry>, current_index: Option<usize>) {
        self.current_index = match (entries.len(), current_index) {
            (0, _) => None,
            (len, Some(i)) if i < len => Some(i),
            (len, _) => Some(len - 1),
        };
        self.entries = entries;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_index = None;
    }
}
