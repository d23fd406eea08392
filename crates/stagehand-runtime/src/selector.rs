//! Mood- and tag-based asset selection.
//!
//! Resolves an abstract [`AssetQuery`] into one concrete [`ContentItem`].
//!
//! # Tiers
//!
//! Evaluated in order; the first non-empty candidate set wins and one of
//! its members is picked uniformly at random.
//!
//! | Tier | Candidates in `query.category` |
//! |------|--------------------------------|
//! | 1 | tags meet the mood **and** the query (only when query tags given) |
//! | 2 | tags meet the mood |
//! | 3 | tags meet the query (only when query tags given) |
//! | 4 | every item |
//!
//! "Meet" means the tag sets intersect; it is never a subset test. Empty
//! query tags add no constraint.

use crate::catalog::{tag_set, Catalog, ContentItem, Mood};
use rand::seq::SliceRandom;
use rand::Rng;
use stagehand_types::Category;
use std::collections::BTreeSet;
use thiserror::Error;

/// A selection request; one per operation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetQuery {
    pub category: Category,
    pub tags: BTreeSet<String>,
}

impl AssetQuery {
    /// Creates a query; tags are normalized.
    #[must_use]
    pub fn new<I, S>(category: Category, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            category,
            tags: tag_set(tags),
        }
    }

    /// A query with no extra tags.
    #[must_use]
    pub fn any(category: Category) -> Self {
        Self {
            category,
            tags: BTreeSet::new(),
        }
    }
}

/// Which fallback level produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    MoodAndQuery = 1,
    Mood = 2,
    Query = 3,
    Any = 4,
}

/// Result of a successful selection.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub item: &'a ContentItem,
    pub tier: Tier,
    /// Size of the winning candidate set.
    pub candidates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    /// The category has no items at all.
    #[error("no {0} content available")]
    AssetNotFound(Category),
}

/// Four-tier selector.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetSelector;

impl AssetSelector {
    /// Selects one item for `query` under `mood`.
    ///
    /// # Errors
    ///
    /// [`SelectError::AssetNotFound`] only when the category is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use rand::rngs::StdRng;
    /// use rand::SeedableRng;
    /// use stagehand_runtime::catalog::{Catalog, ContentItem, ContentRef, Mood};
    /// use stagehand_runtime::selector::{AssetQuery, AssetSelector, Tier};
    /// use stagehand_types::Category;
    ///
    /// let catalog: Catalog = vec![
    ///     ContentItem::new(Category::Image, ["beach", "calm"], ContentRef::Path("a.png".into())),
    ///     ContentItem::new(Category::Image, ["city"], ContentRef::Path("b.png".into())),
    /// ]
    /// .into_iter()
    /// .collect();
    /// let mood = Mood::new("calm", ["nature", "calm"]);
    /// let query = AssetQuery::new(Category::Image, ["beach"]);
    ///
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let selection = AssetSelector::select(&query, &mood, &catalog, &mut rng).expect("found");
    /// assert_eq!(selection.tier, Tier::MoodAndQuery);
    /// assert_eq!(selection.item.content(), &ContentRef::Path("a.png".into()));
    /// ```
    pub fn select<'a, R: Rng + ?Sized>(
        query: &AssetQuery,
        mood: &Mood,
        catalog: &'a Catalog,
        rng: &mut R,
    ) -> Result<Selection<'a>, SelectError> {
        let items = catalog.items(query.category);
        if items.is_empty() {
            tracing::warn!(category = %query.category, "selection failed: category is empty");
            return Err(SelectError::AssetNotFound(query.category));
        }

        let has_query = !query.tags.is_empty();
        let by_mood = |i: &&ContentItem| i.matches_any(mood.tags());
        let by_query = |i: &&ContentItem| i.matches_any(&query.tags);

        let tiers: [(Tier, Vec<&ContentItem>); 3] = [
            (
                Tier::MoodAndQuery,
                if has_query {
                    items.iter().filter(by_mood).filter(by_query).collect()
                } else {
                    Vec::new()
                },
            ),
            (Tier::Mood, items.iter().filter(by_mood).collect()),
            (
                Tier::Query,
                if has_query {
                    items.iter().filter(by_query).collect()
                } else {
                    Vec::new()
                },
            ),
        ];

        let (tier, candidates) = tiers
            .into_iter()
            .find(|(_, c)| !c.is_empty())
            .unwrap_or_else(|| (Tier::Any, items.iter().collect()));

        match candidates.choose(rng) {
            Some(&item) => {
                tracing::debug!(
                    category = %query.category,
                    mood = mood.name(),
                    tier = tier as u8,
                    candidates = candidates.len(),
                    "asset selected"
                );
                Ok(Selection {
                    item,
                    tier,
                    candidates: candidates.len(),
                })
            }
            None => Err(SelectError::AssetNotFound(query.category)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ContentRef;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(category: Category, tags: &[&str], path: &str) -> ContentItem {
        ContentItem::new(category, tags, ContentRef::Path(path.into()))
    }

    fn path_of(selection: &Selection<'_>) -> String {
        selection.item.content().to_string()
    }

    fn catalog(items: Vec<ContentItem>) -> Catalog {
        items.into_iter().collect()
    }

    #[test]
    fn tier_one_wins_when_mood_and_query_meet() {
        let catalog = catalog(vec![
            item(Category::Image, &["beach", "calm"], "A"),
            item(Category::Image, &["city"], "B"),
        ]);
        let mood = Mood::new("calm", ["nature", "calm"]);
        let query = AssetQuery::new(Category::Image, ["beach"]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sel = AssetSelector::select(&query, &mood, &catalog, &mut rng).expect("found");
            assert_eq!(path_of(&sel), "A");
            assert_eq!(sel.tier, Tier::MoodAndQuery);
        }
    }

    #[test]
    fn falls_back_to_mood_only() {
        let catalog = catalog(vec![item(Category::Image, &["work", "quiet"], "C")]);
        let mood = Mood::new("focus", ["work"]);
        let query = AssetQuery::new(Category::Image, ["beach"]);

        let mut rng = StdRng::seed_from_u64(7);
        let sel = AssetSelector::select(&query, &mood, &catalog, &mut rng).expect("tier 2");
        assert_eq!(path_of(&sel), "C");
        assert_eq!(sel.tier, Tier::Mood);
    }

    #[test]
    fn falls_back_to_query_only() {
        let catalog = catalog(vec![
            item(Category::Image, &["beach"], "D"),
            item(Category::Image, &["city"], "E"),
        ]);
        let mood = Mood::new("focus", ["work"]);
        let query = AssetQuery::new(Category::Image, ["beach"]);

        let mut rng = StdRng::seed_from_u64(3);
        let sel = AssetSelector::select(&query, &mood, &catalog, &mut rng).expect("tier 3");
        assert_eq!(path_of(&sel), "D");
        assert_eq!(sel.tier, Tier::Query);
    }

    #[test]
    fn falls_back_to_whole_category() {
        let catalog = catalog(vec![
            item(Category::Image, &["city"], "E"),
            item(Category::Image, &["night"], "F"),
        ]);
        let mood = Mood::new("focus", ["work"]);
        let query = AssetQuery::new(Category::Image, ["beach"]);

        let mut rng = StdRng::seed_from_u64(3);
        let sel = AssetSelector::select(&query, &mood, &catalog, &mut rng).expect("tier 4");
        assert_eq!(sel.tier, Tier::Any);
        assert_eq!(sel.candidates, 2);
    }

    #[test]
    fn empty_query_tags_add_no_constraint() {
        let catalog = catalog(vec![
            item(Category::Audio, &["calm"], "G"),
            item(Category::Audio, &["loud"], "H"),
        ]);
        let mood = Mood::new("calm", ["calm"]);

        let mut rng = StdRng::seed_from_u64(11);
        let sel = AssetSelector::select(&AssetQuery::any(Category::Audio), &mood, &catalog, &mut rng)
            .expect("found");
        assert_eq!(path_of(&sel), "G");
        assert_eq!(sel.tier, Tier::Mood);
    }

    #[test]
    fn empty_mood_tags_skip_mood_tiers() {
        let catalog = catalog(vec![
            item(Category::Image, &["beach"], "D"),
            item(Category::Image, &["city"], "E"),
        ]);
        let mood = Mood::new("blank", Vec::<String>::new());
        let query = AssetQuery::new(Category::Image, ["city"]);

        let mut rng = StdRng::seed_from_u64(5);
        let sel = AssetSelector::select(&query, &mood, &catalog, &mut rng).expect("found");
        assert_eq!(path_of(&sel), "E");
        assert_eq!(sel.tier, Tier::Query);
    }

    #[test]
    fn never_crosses_categories() {
        let catalog = catalog(vec![
            item(Category::Video, &["beach", "calm"], "V"),
            item(Category::Image, &["city"], "I"),
        ]);
        let mood = Mood::new("calm", ["calm"]);
        let query = AssetQuery::new(Category::Image, ["beach"]);

        let mut rng = StdRng::seed_from_u64(0);
        let sel = AssetSelector::select(&query, &mood, &catalog, &mut rng).expect("found");
        assert_eq!(path_of(&sel), "I");
        assert_eq!(sel.item.category(), Category::Image);
    }

    #[test]
    fn empty_category_is_asset_not_found() {
        let catalog = catalog(vec![item(Category::Image, &["x"], "I")]);
        let mood = Mood::new("m", ["x"]);

        let mut rng = StdRng::seed_from_u64(0);
        let err = AssetSelector::select(&AssetQuery::any(Category::Video), &mood, &catalog, &mut rng)
            .expect_err("empty");
        assert_eq!(err, SelectError::AssetNotFound(Category::Video));
    }

    #[test]
    fn choice_within_tier_covers_all_members() {
        let catalog = catalog(vec![
            item(Category::Image, &["calm"], "P"),
            item(Category::Image, &["calm"], "Q"),
            item(Category::Image, &["city"], "R"),
        ]);
        let mood = Mood::new("calm", ["calm"]);
        let query = AssetQuery::any(Category::Image);

        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            let sel = AssetSelector::select(&query, &mood, &catalog, &mut rng).expect("found");
            seen.insert(path_of(&sel));
        }
        assert_eq!(
            seen,
            ["P", "Q"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
        );
    }
}
