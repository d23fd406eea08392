//! Handle attribute snapshots and all-or-nothing deltas.

use serde::{Deserialize, Serialize};
use stagehand_types::Category;
use thiserror::Error;

/// Window position in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Window size in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// A mutable attribute of a host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    Opacity,
    Position,
    Size,
    Volume,
    Looping,
    Paused,
}

impl Attr {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opacity => "opacity",
            Self::Position => "position",
            Self::Size => "size",
            Self::Volume => "volume",
            Self::Looping => "loop",
            Self::Paused => "paused",
        }
    }

    /// Returns whether handles of `category` carry this attribute.
    ///
    /// | Category | opacity | position | size | volume | loop | paused |
    /// |----------|:-:|:-:|:-:|:-:|:-:|:-:|
    /// | image, overlay, prompt | ✓ | ✓ | ✓ | | | |
    /// | video | ✓ | ✓ | ✓ | ✓ | ✓ | ✓ |
    /// | audio | | | | ✓ | ✓ | ✓ |
    #[must_use]
    pub const fn supported_by(self, category: Category) -> bool {
        let window = matches!(
            category,
            Category::Image | Category::Overlay | Category::Prompt | Category::Video
        );
        let media = matches!(category, Category::Video | Category::Audio);
        match self {
            Self::Opacity | Self::Position | Self::Size => window,
            Self::Volume | Self::Looping | Self::Paused => media,
        }
    }
}

impl std::fmt::Display for Attr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttrError {
    #[error("{category} handles have no '{attr}' attribute")]
    Unsupported { attr: Attr, category: Category },

    #[error("'{attr}' must be between 0.0 and 1.0, got {value}")]
    OutOfRange { attr: Attr, value: f32 },

    #[error("size must be non-zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
}

/// Current attribute values of a live handle.
///
/// Each field is `Some` only when the category supports it and a value is
/// known; `position` and `size` stay `None` until set when the host picks
/// placement itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HandleAttrs {
    pub opacity: Option<f32>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub volume: Option<f32>,
    pub looping: Option<bool>,
    pub paused: Option<bool>,
}

impl HandleAttrs {
    /// Default snapshot for a freshly created handle of `category`.
    #[must_use]
    pub fn defaults_for(category: Category) -> Self {
        let mut attrs = Self::default();
        if Attr::Opacity.supported_by(category) {
            attrs.opacity = Some(1.0);
        }
        if Attr::Volume.supported_by(category) {
            attrs.volume = Some(1.0);
            attrs.looping = Some(false);
            attrs.paused = Some(false);
        }
        attrs
    }

    /// Returns a copy with `delta` applied, leaving `self` untouched.
    ///
    /// # Errors
    ///
    /// Any invalid field fails the whole delta; nothing is applied.
    pub fn with_delta(&self, category: Category, delta: &AttrDelta) -> Result<Self, AttrError> {
        delta.validate(category)?;
        let mut next = self.clone();
        if let Some(v) = delta.opacity {
            next.opacity = Some(v);
        }
        if let Some(v) = delta.position {
            next.position = Some(v);
        }
        if let Some(v) = delta.size {
            next.size = Some(v);
        }
        if let Some(v) = delta.volume {
            next.volume = Some(v);
        }
        if let Some(v) = delta.looping {
            next.looping = Some(v);
        }
        if let Some(v) = delta.paused {
            next.paused = Some(v);
        }
        Ok(next)
    }

    /// Applies `delta` in place; on error `self` is unchanged.
    ///
    /// For callers that own the attributes outright. The dispatcher goes
    /// through [`HandleAttrs::with_delta`] under the registry's handle lock.
    ///
    /// # Errors
    ///
    /// See [`HandleAttrs::with_delta`].
    pub fn apply(&mut self, category: Category, delta: &AttrDelta) -> Result<(), AttrError> {
        *self = self.with_delta(category, delta)?;
        Ok(())
    }
}

/// A requested change to some attributes of a handle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttrDelta {
    pub opacity: Option<f32>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub volume: Option<f32>,
    pub looping: Option<bool>,
    pub paused: Option<bool>,
}

impl AttrDelta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Checks every field against `category` before anything is written.
    ///
    /// # Errors
    ///
    /// The first failing field, checked in declaration order.
    pub fn validate(&self, category: Category) -> Result<(), AttrError> {
        let supported = |attr: Attr, present: bool| {
            if present && !attr.supported_by(category) {
                Err(AttrError::Unsupported { attr, category })
            } else {
                Ok(())
            }
        };
        supported(Attr::Opacity, self.opacity.is_some())?;
        supported(Attr::Position, self.position.is_some())?;
        supported(Attr::Size, self.size.is_some())?;
        supported(Attr::Volume, self.volume.is_some())?;
        supported(Attr::Looping, self.looping.is_some())?;
        supported(Attr::Paused, self.paused.is_some())?;

        check_unit(Attr::Opacity, self.opacity)?;
        check_unit(Attr::Volume, self.volume)?;
        if let Some(size) = self.size {
            check_size(size)?;
        }
        Ok(())
    }
}

/// Checks that an optional value lies in `[0.0, 1.0]`.
pub(crate) fn check_unit(attr: Attr, value: Option<f32>) -> Result<(), AttrError> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(AttrError::OutOfRange { attr, value: v }),
        _ => Ok(()),
    }
}

pub(crate) fn check_size(size: Size) -> Result<(), AttrError> {
    if size.width == 0 || size.height == 0 {
        Err(AttrError::ZeroSize {
            width: size.width,
            height: size.height,
        })
    } else {
        Ok(())
    }
}
