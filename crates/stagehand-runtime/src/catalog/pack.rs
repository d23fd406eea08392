//! Packs: a bundle of required capabilities, catalog and moods.

use super::{Catalog, Mood, MoodIndex};
use stagehand_auth::Capability;
use stagehand_types::Category;
use std::path::PathBuf;
use thiserror::Error;

/// Pack loading and validation errors.
#[derive(Debug, Error)]
pub enum PackError {
    /// A pack must declare at least one mood.
    #[error("pack declares no moods")]
    NoMoods,

    /// Two moods share a name.
    #[error("duplicate mood name: {0}")]
    DuplicateMood(String),

    /// The pack requires a catalog-backed capability but ships no items for it.
    #[error("pack requires {capability} but has no {category} items")]
    EmptyCategory {
        category: Category,
        capability: Capability,
    },

    /// A permission name in the manifest is not a known capability.
    #[error("unknown permission in pack manifest: {0}")]
    UnknownPermission(String),

    /// Failed to read the manifest file.
    #[error("failed to read pack manifest '{path}': {source}")]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the manifest TOML.
    #[error("failed to parse pack manifest '{path}': {source}")]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl PackError {
    pub fn read_manifest(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadManifest {
            path: path.into(),
            source,
        }
    }

    pub fn parse_manifest(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseManifest {
            path: path.into(),
            source,
        }
    }
}

/// A validated content pack.
///
/// Immutable for the duration of a session; switching packs replaces the
/// whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pack {
    name: String,
    version: Option<String>,
    required: Capability,
    catalog: Catalog,
    moods: MoodIndex,
}

impl Pack {
    /// Validates and builds a pack.
    ///
    /// # Errors
    ///
    /// - [`PackError::NoMoods`] / [`PackError::DuplicateMood`] for a bad mood list
    /// - [`PackError::EmptyCategory`] when a required capability draws from the
    ///   catalog but the catalog has no items of that category
    ///
    /// # Example
    ///
    /// ```
    /// use stagehand_auth::Capability;
    /// use stagehand_runtime::catalog::{Catalog, ContentItem, ContentRef, Mood, Pack};
    /// use stagehand_types::Category;
    ///
    /// let catalog: Catalog = vec![ContentItem::new(
    ///     Category::Image,
    ///     ["beach"],
    ///     ContentRef::Path("a.png".into()),
    /// )]
    /// .into_iter()
    /// .collect();
    ///
    /// let pack = Pack::new(
    ///     "demo",
    ///     Capability::IMAGE | Capability::PROMPT,
    ///     catalog,
    ///     vec![Mood::new("calm", ["calm"])],
    /// )
    /// .expect("valid pack");
    /// assert_eq!(pack.moods().default_mood().name(), "calm");
    /// ```
    pub fn new(
        name: impl Into<String>,
        required: Capability,
        catalog: Catalog,
        moods: Vec<Mood>,
    ) -> Result<Self, PackError> {
        let moods = MoodIndex::new(moods)?;
        for category in required.categories() {
            if category.uses_catalog() && catalog.count(category) == 0 {
                return Err(PackError::EmptyCategory {
                    category,
                    capability: Capability::for_category(category),
                });
            }
        }
        Ok(Self {
            name: name.into(),
            version: None,
            required,
            catalog,
            moods,
        })
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Capabilities the pack declares it needs.
    #[must_use]
    pub fn required(&self) -> Capability {
        self.required
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn moods(&self) -> &MoodIndex {
        &self.moods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ContentItem, ContentRef};

    fn one_image() -> Catalog {
        vec![ContentItem::new(
            Category::Image,
            ["beach"],
            ContentRef::Path("a.png".into()),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn required_category_without_items_rejected() {
        let err = Pack::new(
            "p",
            Capability::IMAGE | Capability::AUDIO,
            one_image(),
            vec![Mood::new("m", ["x"])],
        )
        .expect_err("audio has no items");

        match err {
            PackError::EmptyCategory {
                category,
                capability,
            } => {
                assert_eq!(category, Category::Audio);
                assert_eq!(capability, Capability::AUDIO);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn prompt_needs_no_items() {
        let pack = Pack::new(
            "p",
            Capability::PROMPT,
            Catalog::new(),
            vec![Mood::new("m", ["x"])],
        )
        .expect("prompt is catalog-free");
        assert_eq!(pack.required(), Capability::PROMPT);
        assert!(pack.catalog().is_empty());
    }

    #[test]
    fn unrequired_empty_category_is_fine() {
        let pack = Pack::new("p", Capability::IMAGE, one_image(), vec![Mood::new("m", ["x"])])
            .expect("video not required")
            .with_version("1.2");
        assert_eq!(pack.version(), Some("1.2"));
        assert_eq!(pack.name(), "p");
    }

    #[test]
    fn moods_are_validated() {
        assert!(matches!(
            Pack::new("p", Capability::empty(), Catalog::new(), vec![]),
            Err(PackError::NoMoods)
        ));
    }
}
