use crate::config::DEFAULT_RECENT_LIMIT;

/// Most-recent-first list of unique queries.
#[derive(Debug, Clone)]
pub struct RecentSearches {
    words: Vec<String>,
    capacity: usize,
}

impl Default for RecentSearches {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECENT_LIMIT)
    }
}

impl RecentSearches {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Moves `word` to the front, dropping any earlier occurrence.
    pub fn record(&mut self, word: &str) {
        self.words.retain(|w| w != word);
        self.words.insert(0, word.to_string());
        self.words.truncate(self.capacity);
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Loads stored words, most recent first.
    pub fn restore(&mut self, words: Vec<String>) {
        self.words.clear();
        for word in words {
            if self.words.len() == self.capacity {
                break;
            }
            if !self.words.contains(&word) {
                self.words.push(word);
            }
        }
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }
}
