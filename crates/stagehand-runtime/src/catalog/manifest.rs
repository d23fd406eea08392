//! TOML pack manifests.
//!
//! ```toml
//! [meta]
//! name = "seaside"
//! version = "1.0.0"
//! permissions = ["image", "audio", "prompt"]
//!
//! [[moods]]
//! name = "calm"
//! description = "Slow and quiet"
//! tags = ["nature", "calm"]
//!
//! [[assets.image]]
//! path = "image/beach.jpg"
//! tags = ["beach", "calm"]
//!
//! [[assets.audio]]
//! path = "audio/waves.ogg"
//! tags = ["calm"]
//!
//! [[websites]]
//! name = "Tide tables"
//! url = "https://tides.example"
//! tags = ["beach"]
//! ```
//!
//! Relative asset paths are resolved against the directory holding the
//! manifest. `hypno` is accepted as the section name for overlays.

use super::{Catalog, ContentItem, ContentRef, Mood, Pack, PackError};
use serde::{Deserialize, Serialize};
use stagehand_auth::Capability;
use stagehand_types::Category;
use std::path::Path;

/// Parsed manifest, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackManifest {
    pub meta: ManifestMeta,
    #[serde(default)]
    pub moods: Vec<MoodEntry>,
    #[serde(default)]
    pub assets: AssetsSection,
    #[serde(default)]
    pub websites: Vec<WebsiteEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMeta {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsSection {
    pub image: Vec<AssetEntry>,
    pub video: Vec<AssetEntry>,
    pub audio: Vec<AssetEntry>,
    #[serde(alias = "hypno")]
    pub overlay: Vec<AssetEntry>,
    pub wallpaper: Vec<AssetEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub path: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsiteEntry {
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PackManifest {
    /// Parses manifest TOML.
    ///
    /// # Errors
    ///
    /// Returns the TOML error on malformed input.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Reads, parses and validates a manifest file into a [`Pack`].
    ///
    /// # Errors
    ///
    /// Read and parse failures, plus every validation error of
    /// [`PackManifest::into_pack`].
    pub fn load(path: &Path) -> Result<Pack, PackError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PackError::read_manifest(path, e))?;
        let manifest = Self::from_toml(&content).map_err(|e| PackError::parse_manifest(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let pack = manifest.into_pack(base)?;
        tracing::debug!(
            path = %path.display(),
            pack = pack.name(),
            items = pack.catalog().len(),
            moods = pack.moods().len(),
            "loaded pack manifest"
        );
        Ok(pack)
    }

    /// Converts into a validated [`Pack`], resolving relative asset paths
    /// against `base_dir`.
    ///
    /// # Errors
    ///
    /// [`PackError::UnknownPermission`] for an unrecognized permission name,
    /// plus everything [`Pack::new`] rejects.
    pub fn into_pack(self, base_dir: &Path) -> Result<Pack, PackError> {
        let (required, unknown) = Capability::parse_list(&self.meta.permissions);
        if let Some(name) = unknown.first() {
            return Err(PackError::UnknownPermission((*name).to_string()));
        }

        let mut catalog = Catalog::new();
        let sections = [
            (Category::Image, &self.assets.image),
            (Category::Video, &self.assets.video),
            (Category::Audio, &self.assets.audio),
            (Category::Overlay, &self.assets.overlay),
            (Category::Wallpaper, &self.assets.wallpaper),
        ];
        for (category, entries) in sections {
            for entry in entries {
                let path = base_dir.join(&entry.path);
                catalog.insert(ContentItem::new(
                    category,
                    &entry.tags,
                    ContentRef::Path(path),
                ));
            }
        }
        for site in &self.websites {
            catalog.insert(ContentItem::new(
                Category::Website,
                &site.tags,
                ContentRef::Url(site.url.clone()),
            ));
        }

        let moods = self
            .moods
            .iter()
            .map(|m| Mood::new(m.name.clone(), &m.tags).with_description(m.description.clone()))
            .collect();

        let pack = Pack::new(self.meta.name, required, catalog, moods)?;
        Ok(match self.meta.version {
            Some(v) => pack.with_version(v),
            None => pack,
        })
    }
}
