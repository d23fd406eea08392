//! Content catalog, mood index and packs.
//!
//! # Model
//!
//! ```text
//! Pack
//! ├── required: Capability         what the pack asks the user for
//! ├── catalog: Catalog
//! │   ├── image   → [ContentItem { tags, content }, ...]
//! │   ├── audio   → [...]
//! │   └── ...                      one list per Category, never shared
//! └── moods: MoodIndex
//!     ├── "calm"  → { nature, calm }   ← first mood is the default
//!     └── "focus" → { work }
//! ```
//!
//! Items are immutable once loaded. The only thing a script ever sees of
//! an item is the effect of showing it: tags and content references stay on
//! the host side.

mod manifest;
mod mood;
mod pack;

pub use manifest::{AssetEntry, AssetsSection, ManifestMeta, MoodEntry, PackManifest, WebsiteEntry};
pub use mood::{Mood, MoodIndex};
pub use pack::{Pack, PackError};

use serde::Serialize;
use stagehand_types::Category;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Normalizes a list of tags: trimmed, lowercased, empty entries dropped.
///
/// # Example
///
/// ```
/// use stagehand_runtime::catalog::tag_set;
///
/// let tags = tag_set([" Beach", "calm", "", "CALM"]);
/// assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["beach", "calm"]);
/// ```
pub fn tag_set<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Where the host finds the content of an item.
///
/// Opaque to scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContentRef {
    /// Local media file.
    Path(PathBuf),
    /// External link.
    Url(String),
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => f.write_str(u),
        }
    }
}

/// One selectable asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    category: Category,
    tags: BTreeSet<String>,
    content: ContentRef,
}

impl ContentItem {
    /// Creates an item; tags are normalized with [`tag_set`].
    #[must_use]
    pub fn new<I, S>(category: Category, tags: I, content: ContentRef) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            category,
            tags: tag_set(tags),
            content,
        }
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    #[must_use]
    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    /// Returns `true` if the item shares at least one tag with `tags`.
    #[must_use]
    pub fn matches_any(&self, tags: &BTreeSet<String>) -> bool {
        !self.tags.is_disjoint(tags)
    }
}

/// Tagged content items grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: BTreeMap<Category, Vec<ContentItem>>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item under its own category.
    pub fn insert(&mut self, item: ContentItem) {
        self.items.entry(item.category).or_default().push(item);
    }

    /// Returns every item of `category` (empty slice if none).
    #[must_use]
    pub fn items(&self, category: Category) -> &[ContentItem] {
        self.items.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of items in `category`.
    #[must_use]
    pub fn count(&self, category: Category) -> usize {
        self.items(category).len()
    }

    /// Total number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<ContentItem> for Catalog {
    fn from_iter<T: IntoIterator<Item = ContentItem>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for item in iter {
            catalog.insert(item);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(tags: &[&str], path: &str) -> ContentItem {
        ContentItem::new(Category::Image, tags, ContentRef::Path(path.into()))
    }

    #[test]
    fn items_are_grouped_by_category() {
        let catalog: Catalog = vec![
            image(&["beach"], "a.png"),
            ContentItem::new(
                Category::Audio,
                ["calm"],
                ContentRef::Path("a.ogg".into()),
            ),
            image(&["city"], "b.png"),
        ]
        .into_iter()
        .collect();

        assert_eq!(catalog.count(Category::Image), 2);
        assert_eq!(catalog.count(Category::Audio), 1);
        assert_eq!(catalog.count(Category::Video), 0);
        assert!(catalog.items(Category::Video).is_empty());
        assert_eq!(catalog.len(), 3);
        assert!(catalog
            .items(Category::Image)
            .iter()
            .all(|i| i.category() == Category::Image));
    }

    #[test]
    fn matches_any_is_intersection_not_subset() {
        let item = image(&["beach", "calm"], "a.png");
        assert!(item.matches_any(&tag_set(["calm", "nature"])));
        assert!(!item.matches_any(&tag_set(["city"])));
        assert!(!item.matches_any(&BTreeSet::new()));
    }

    #[test]
    fn content_ref_display() {
        assert_eq!(ContentRef::Url("https://x.test".into()).to_string(), "https://x.test");
        assert_eq!(ContentRef::Path("/a/b.png".into()).to_string(), "/a/b.png");
    }
}
