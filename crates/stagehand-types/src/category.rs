//! Content and host-object categories.
//!
//! Every catalog item, every handle and every gated operation belongs to
//! exactly one [`Category`]. Selection never crosses categories.
//!
//! | Category | Host object | Catalog-backed | Creates handle |
//! |----------|-------------|----------------|----------------|
//! | `image` | image window | yes | yes |
//! | `video` | video window | yes | yes |
//! | `audio` | audio stream | yes | yes |
//! | `overlay` | animated overlay window | yes | yes |
//! | `prompt` | text prompt window | no | yes |
//! | `wallpaper` | desktop wallpaper | yes | no |
//! | `website` | external browser tab | yes | no |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of content / host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Video,
    Audio,
    /// Animated overlay ("hypno" in pack files).
    #[serde(alias = "hypno")]
    Overlay,
    Wallpaper,
    Prompt,
    Website,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Category; 7] = [
        Category::Image,
        Category::Video,
        Category::Audio,
        Category::Overlay,
        Category::Wallpaper,
        Category::Prompt,
        Category::Website,
    ];

    /// Lowercase name used in scripts, pack files and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Overlay => "overlay",
            Self::Wallpaper => "wallpaper",
            Self::Prompt => "prompt",
            Self::Website => "website",
        }
    }

    /// Whether the primary operation of this category leaves a live host
    /// object behind that scripts can reference later.
    #[must_use]
    pub const fn creates_handle(self) -> bool {
        !matches!(self, Self::Wallpaper | Self::Website)
    }

    /// Whether the primary operation resolves content from the pack catalog.
    ///
    /// Prompts carry their own text and never touch the catalog.
    #[must_use]
    pub const fn uses_catalog(self) -> bool {
        !matches!(self, Self::Prompt)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError(pub String);

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category: {}", self.0)
    }
}

impl std::error::Error for ParseCategoryError {}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "overlay" | "hypno" => Ok(Self::Overlay),
            "wallpaper" => Ok(Self::Wallpaper),
            "prompt" => Ok(Self::Prompt),
            "website" => Ok(Self::Website),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_knows_hypno() {
        assert_eq!("IMAGE".parse::<Category>(), Ok(Category::Image));
        assert_eq!("hypno".parse::<Category>(), Ok(Category::Overlay));
        assert!("popup".parse::<Category>().is_err());
    }

    #[test]
    fn only_wallpaper_and_website_are_fire_and_forget() {
        let fire_and_forget: Vec<_> = Category::ALL
            .into_iter()
            .filter(|c| !c.creates_handle())
            .collect();
        assert_eq!(fire_and_forget, vec![Category::Wallpaper, Category::Website]);
    }

    #[test]
    fn prompt_is_the_only_catalog_free_category() {
        let free: Vec<_> = Category::ALL
            .into_iter()
            .filter(|c| !c.uses_catalog())
            .collect();
        assert_eq!(free, vec![Category::Prompt]);
    }

    #[test]
    fn serde_accepts_hypno_alias() {
        let parsed: Category = serde_json::from_str("\"hypno\"").expect("deserialize");
        assert_eq!(parsed, Category::Overlay);
        let json = serde_json::to_string(&Category::Overlay).expect("serialize");
        assert_eq!(json, "\"overlay\"");
    }
}
