//! Capability set.
//!
//! Defines the grantable abilities that control *which kinds* of host
//! effects a script may cause.
//!
//! # Narrowing Only
//!
//! Both a pack and the user contribute a capability set. The enforced set is
//! their intersection, so neither side can widen what the other allows:
//!
//! ```text
//! Pack requires   IMAGE | AUDIO
//! User grants     IMAGE | VIDEO
//!                 ─────────────
//! Effective       IMAGE
//! ```
//!
//! # Example
//!
//! ```
//! use stagehand_auth::Capability;
//!
//! let pack = Capability::IMAGE | Capability::AUDIO;
//! let user = Capability::IMAGE | Capability::VIDEO;
//! assert_eq!(pack & user, Capability::IMAGE);
//!
//! assert_eq!(Capability::parse("hypno"), Some(Capability::OVERLAY));
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use stagehand_types::Category;

bitflags! {
    /// Abilities a pack can request and a user can grant.
    ///
    /// Each capability gates every operation of exactly one [`Category`].
    ///
    /// | Capability | Operations |
    /// |------------|------------|
    /// | [`IMAGE`](Self::IMAGE) | `image.show`, `image.close`, `image.move`, ... |
    /// | [`VIDEO`](Self::VIDEO) | `video.play`, `video.pause`, `video.set_volume`, ... |
    /// | [`AUDIO`](Self::AUDIO) | `audio.play`, `audio.stop`, `audio.set_loop`, ... |
    /// | [`OVERLAY`](Self::OVERLAY) | `overlay.show`, `overlay.set_opacity`, ... |
    /// | [`WALLPAPER`](Self::WALLPAPER) | `wallpaper.set` |
    /// | [`PROMPT`](Self::PROMPT) | `prompt.show`, `prompt.close`, ... |
    /// | [`WEBSITE`](Self::WEBSITE) | `website.open` |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capability: u16 {
        /// Display image windows.
        const IMAGE     = 0b0000_0001;
        /// Play video windows.
        const VIDEO     = 0b0000_0010;
        /// Play audio streams.
        const AUDIO     = 0b0000_0100;
        /// Display animated overlays.
        const OVERLAY   = 0b0000_1000;
        /// Change the desktop wallpaper.
        const WALLPAPER = 0b0001_0000;
        /// Display text prompts.
        const PROMPT    = 0b0010_0000;
        /// Open external links.
        const WEBSITE   = 0b0100_0000;
    }
}

impl Capability {
    /// All capabilities.
    pub const ALL: Self = Self::IMAGE
        .union(Self::VIDEO)
        .union(Self::AUDIO)
        .union(Self::OVERLAY)
        .union(Self::WALLPAPER)
        .union(Self::PROMPT)
        .union(Self::WEBSITE);

    /// Returns the capability gating every operation of `category`.
    ///
    /// # Example
    ///
    /// ```
    /// use stagehand_auth::Capability;
    /// use stagehand_types::Category;
    ///
    /// assert_eq!(Capability::for_category(Category::Overlay), Capability::OVERLAY);
    /// ```
    #[must_use]
    pub const fn for_category(category: Category) -> Self {
        match category {
            Category::Image => Self::IMAGE,
            Category::Video => Self::VIDEO,
            Category::Audio => Self::AUDIO,
            Category::Overlay => Self::OVERLAY,
            Category::Wallpaper => Self::WALLPAPER,
            Category::Prompt => Self::PROMPT,
            Category::Website => Self::WEBSITE,
        }
    }

    /// Returns the categories gated by the flags in this set.
    #[must_use]
    pub fn categories(self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.contains(Self::for_category(*c)))
            .collect()
    }

    /// Returns a human-readable list of capability names.
    ///
    /// # Example
    ///
    /// ```
    /// use stagehand_auth::Capability;
    ///
    /// let caps = Capability::IMAGE | Capability::AUDIO;
    /// assert_eq!(caps.names(), vec!["IMAGE", "AUDIO"]);
    /// ```
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::IMAGE) {
            names.push("IMAGE");
        }
        if self.contains(Self::VIDEO) {
            names.push("VIDEO");
        }
        if self.contains(Self::AUDIO) {
            names.push("AUDIO");
        }
        if self.contains(Self::OVERLAY) {
            names.push("OVERLAY");
        }
        if self.contains(Self::WALLPAPER) {
            names.push("WALLPAPER");
        }
        if self.contains(Self::PROMPT) {
            names.push("PROMPT");
        }
        if self.contains(Self::WEBSITE) {
            names.push("WEBSITE");
        }
        names
    }

    /// Parses a capability name (case-insensitive).
    ///
    /// Accepts the names pack files use as aliases: `hypno` for
    /// [`OVERLAY`](Self::OVERLAY), `link` and `external-link` for
    /// [`WEBSITE`](Self::WEBSITE).
    ///
    /// # Example
    ///
    /// ```
    /// use stagehand_auth::Capability;
    ///
    /// assert_eq!(Capability::parse("image"), Some(Capability::IMAGE));
    /// assert_eq!(Capability::parse("Hypno"), Some(Capability::OVERLAY));
    /// assert_eq!(Capability::parse("external-link"), Some(Capability::WEBSITE));
    /// assert_eq!(Capability::parse("shell"), None);
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "IMAGE" => Some(Self::IMAGE),
            "VIDEO" => Some(Self::VIDEO),
            "AUDIO" => Some(Self::AUDIO),
            "OVERLAY" | "HYPNO" => Some(Self::OVERLAY),
            "WALLPAPER" => Some(Self::WALLPAPER),
            "PROMPT" => Some(Self::PROMPT),
            "WEBSITE" | "LINK" | "EXTERNAL-LINK" | "EXTERNAL_LINK" => Some(Self::WEBSITE),
            "ALL" => Some(Self::ALL),
            _ => None,
        }
    }

    /// Parses a list of capability names into a combined set.
    ///
    /// Returns the combined capabilities and the names that were not
    /// recognized. Callers decide whether unknown names are fatal.
    ///
    /// # Example
    ///
    /// ```
    /// use stagehand_auth::Capability;
    ///
    /// let (caps, unknown) = Capability::parse_list(&["image", "bogus", "audio"]);
    /// assert_eq!(caps, Capability::IMAGE | Capability::AUDIO);
    /// assert_eq!(unknown, vec!["bogus"]);
    /// ```
    #[must_use]
    pub fn parse_list<'a, S: AsRef<str>>(names: &'a [S]) -> (Self, Vec<&'a str>) {
        let mut caps = Self::empty();
        let mut unknown = Vec::new();
        for name in names {
            let name = name.as_ref();
            match Self::parse(name) {
                Some(c) => caps |= c,
                None => unknown.push(name),
            }
        }
        (caps, unknown)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.names();
        if names.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_every_capability() {
        for category in Category::ALL {
            assert!(Capability::ALL.contains(Capability::for_category(category)));
        }
        assert_eq!(Capability::ALL, Capability::all());
    }

    #[test]
    fn every_category_maps_to_a_distinct_flag() {
        let mut seen = Capability::empty();
        for category in Category::ALL {
            let cap = Capability::for_category(category);
            assert_eq!(cap.bits().count_ones(), 1, "{category} maps to {cap}");
            assert!(!seen.intersects(cap), "{category} shares a flag");
            seen |= cap;
        }
        assert_eq!(seen, Capability::ALL);
    }

    #[test]
    fn categories_follow_flags() {
        let caps = Capability::IMAGE | Capability::WEBSITE;
        assert_eq!(caps.categories(), vec![Category::Image, Category::Website]);
        assert!(Capability::empty().categories().is_empty());
    }

    #[test]
    fn empty_capability() {
        let empty = Capability::empty();
        assert!(!empty.contains(Capability::IMAGE));
        assert_eq!(empty.names(), Vec::<&str>::new());
        assert_eq!(empty.to_string(), "(none)");
    }

    #[test]
    fn parse_case_insensitive() {
        assert_eq!(Capability::parse("video"), Some(Capability::VIDEO));
        assert_eq!(Capability::parse("VIDEO"), Some(Capability::VIDEO));
        assert_eq!(Capability::parse("Video"), Some(Capability::VIDEO));
        assert_eq!(Capability::parse(" audio "), Some(Capability::AUDIO));
    }

    #[test]
    fn parse_aliases() {
        assert_eq!(Capability::parse("hypno"), Some(Capability::OVERLAY));
        assert_eq!(Capability::parse("link"), Some(Capability::WEBSITE));
        assert_eq!(Capability::parse("external-link"), Some(Capability::WEBSITE));
        assert_eq!(Capability::parse("all"), Some(Capability::ALL));
    }

    #[test]
    fn parse_unknown_returns_none() {
        assert_eq!(Capability::parse("NETWORK"), None);
        assert_eq!(Capability::parse(""), None);
    }

    #[test]
    fn parse_list_accepts_owned_strings() {
        let names = vec!["image".to_string(), "nope".to_string()];
        let (caps, unknown) = Capability::parse_list(&names);
        assert_eq!(caps, Capability::IMAGE);
        assert_eq!(unknown, vec!["nope"]);
    }

    #[test]
    fn display_formatting() {
        assert_eq!(Capability::IMAGE.to_string(), "IMAGE");
        assert_eq!(
            (Capability::IMAGE | Capability::AUDIO).to_string(),
            "IMAGE | AUDIO"
        );
    }

    #[test]
    fn serde_roundtrip() {
        let caps = Capability::PROMPT | Capability::WALLPAPER;
        let json = serde_json::to_string(&caps).expect("serialize");
        let parsed: Capability = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, caps);
    }
}
