//! Moods: named tag sets acting as the default content filter.

use super::{tag_set, PackError};
use serde::Serialize;
use std::collections::BTreeSet;

/// A named tag filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mood {
    name: String,
    description: String,
    tags: BTreeSet<String>,
}

impl Mood {
    /// Creates a mood; tags are normalized.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            description: String::new(),
            tags: tag_set(tags),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

/// Moods of a pack, in declaration order.
///
/// Never empty; the first mood is the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodIndex {
    moods: Vec<Mood>,
}

impl MoodIndex {
    /// Builds an index.
    ///
    /// # Errors
    ///
    /// [`PackError::NoMoods`] for an empty list and
    /// [`PackError::DuplicateMood`] when two moods share a name.
    pub fn new(moods: Vec<Mood>) -> Result<Self, PackError> {
        if moods.is_empty() {
            return Err(PackError::NoMoods);
        }
        let mut seen = BTreeSet::new();
        for mood in &moods {
            if !seen.insert(mood.name.as_str()) {
                return Err(PackError::DuplicateMood(mood.name.clone()));
            }
        }
        Ok(Self { moods })
    }

    /// Looks up a mood by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Mood> {
        self.moods.iter().find(|m| m.name == name)
    }

    /// The mood active when a pack is first loaded.
    #[must_use]
    pub fn default_mood(&self) -> &Mood {
        &self.moods[0]
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.moods.iter().map(|m| m.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mood> {
        self.moods.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.moods.len()
    }

    /// Always `false` for a constructed index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moods.is_empty()
    }
}
