//! Failure history fed back into the conversation.

use std::collections::VecDeque;

/// Bounded log of failure messages, oldest dropped first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl FeedbackLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All entries, one per line.
    #[must_use]
    pub fn render(&self) -> String {
        self.iter().collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_past_capacity() {
        let mut log = FeedbackLog::new(3);
        for i in 1..=4 {
            log.push(i.to_string());
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().collect::<Vec<_>>(), vec!["2", "3", "4"]);
        assert_eq!(log.render(), "2\n3\n4");
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut log = FeedbackLog::new(0);
        log.push("x");
        assert!(log.is_empty());
    }
}
