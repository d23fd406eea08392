//! Typed option structs for the show/play operations.
//!
//! Scripts pass a table of options; it is deserialized into one of these
//! structs, which reject unknown keys, and then [`validate`](ImageOptions::validate)d
//! before the call reaches the dispatcher.
//!
//! | Struct | Used by | Defaults |
//! |--------|---------|----------|
//! | [`ImageOptions`] | `image.show`, `overlay.show` | opacity 1.0 |
//! | [`VideoOptions`] | `video.play` | opacity 1.0, volume 1.0, loop off, autoplay on |
//! | [`AudioOptions`] | `audio.play` | volume 1.0, loop off |
//! | [`PromptOptions`] | `prompt.show` | font size 32, left aligned, opacity 1.0 |
//! | [`QueryOptions`] | `wallpaper.set`, `website.open` | no tags |

use crate::handle::{check_size, check_unit, Attr, AttrError, HandleAttrs, Position, Size};
use serde::{Deserialize, Serialize};
use stagehand_types::Category;
use std::time::Duration;
use thiserror::Error;

/// Largest accepted prompt font size.
pub const MAX_FONT_SIZE: u32 = 512;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    #[error(transparent)]
    Attr(#[from] AttrError),

    #[error("'duration' must be a non-negative number of seconds, got {0}")]
    Duration(f64),

    #[error("'{0}' must not be empty")]
    Empty(&'static str),

    #[error("'font_size' must be between 1 and 512, got {0}")]
    FontSize(u32),
}

fn check_duration(duration: Option<f64>) -> Result<Option<Duration>, OptionsError> {
    match duration {
        None => Ok(None),
        Some(secs) if secs.is_finite() && secs >= 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
        Some(secs) => Err(OptionsError::Duration(secs)),
    }
}

fn check_window(opacity: f32, size: Option<Size>) -> Result<(), OptionsError> {
    check_unit(Attr::Opacity, Some(opacity))?;
    if let Some(size) = size {
        check_size(size)?;
    }
    Ok(())
}

/// Options for `image.show` and `overlay.show`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageOptions {
    pub tags: Vec<String>,
    /// Seconds until the host closes the window by itself.
    pub duration: Option<f64>,
    pub opacity: f32,
    pub position: Option<Position>,
    pub size: Option<Size>,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            duration: None,
            opacity: 1.0,
            position: None,
            size: None,
        }
    }
}

impl ImageOptions {
    /// # Errors
    ///
    /// Out-of-range opacity, zero size or a negative duration.
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_window(self.opacity, self.size)?;
        check_duration(self.duration)?;
        Ok(())
    }

    #[must_use]
    pub fn attrs(&self, category: Category) -> HandleAttrs {
        HandleAttrs {
            opacity: Some(self.opacity),
            position: self.position,
            size: self.size,
            ..HandleAttrs::defaults_for(category)
        }
    }
}

/// Options for `video.play`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoOptions {
    pub tags: Vec<String>,
    pub duration: Option<f64>,
    pub opacity: f32,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub volume: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub autoplay: bool,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            duration: None,
            opacity: 1.0,
            position: None,
            size: None,
            volume: 1.0,
            looping: false,
            autoplay: true,
        }
    }
}

impl VideoOptions {
    /// # Errors
    ///
    /// Out-of-range opacity or volume, zero size or a negative duration.
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_window(self.opacity, self.size)?;
        check_unit(Attr::Volume, Some(self.volume))?;
        check_duration(self.duration)?;
        Ok(())
    }

    #[must_use]
    pub fn attrs(&self) -> HandleAttrs {
        HandleAttrs {
            opacity: Some(self.opacity),
            position: self.position,
            size: self.size,
            volume: Some(self.volume),
            looping: Some(self.looping),
            paused: Some(!self.autoplay),
        }
    }
}

/// Options for `audio.play`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioOptions {
    pub tags: Vec<String>,
    pub duration: Option<f64>,
    pub volume: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            duration: None,
            volume: 1.0,
            looping: false,
        }
    }
}

impl AudioOptions {
    /// # Errors
    ///
    /// Out-of-range volume or a negative duration.
    pub fn validate(&self) -> Result<(), OptionsError> {
        check_unit(Attr::Volume, Some(self.volume))?;
        check_duration(self.duration)?;
        Ok(())
    }

    #[must_use]
    pub fn attrs(&self) -> HandleAttrs {
        HandleAttrs {
            volume: Some(self.volume),
            looping: Some(self.looping),
            paused: Some(false),
            ..HandleAttrs::default()
        }
    }
}

/// Horizontal text alignment of a prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Presentation of prompt text, handed to the prompt executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub font_size: u32,
    pub color: Option<String>,
    pub background: Option<String>,
    pub alignment: Alignment,
}

/// Options for `prompt.show`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromptOptions {
    /// Required; the text to display.
    pub text: String,
    pub font_size: u32,
    pub color: Option<String>,
    pub background: Option<String>,
    pub alignment: Alignment,
    pub duration: Option<f64>,
    pub opacity: f32,
    pub position: Option<Position>,
    pub size: Option<Size>,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 32,
            color: None,
            background: None,
            alignment: Alignment::Left,
            duration: None,
            opacity: 1.0,
            position: None,
            size: None,
        }
    }
}

impl PromptOptions {
    /// Options showing `text` with every other field at its default.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Empty text, a font size outside `1..=MAX_FONT_SIZE`, out-of-range
    /// opacity, zero size or a negative duration.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.text.trim().is_empty() {
            return Err(OptionsError::Empty("text"));
        }
        if self.font_size == 0 || self.font_size > MAX_FONT_SIZE {
            return Err(OptionsError::FontSize(self.font_size));
        }
        check_window(self.opacity, self.size)?;
        check_duration(self.duration)?;
        Ok(())
    }

    #[must_use]
    pub fn attrs(&self) -> HandleAttrs {
        HandleAttrs {
            opacity: Some(self.opacity),
            position: self.position,
            size: self.size,
            ..HandleAttrs::default()
        }
    }

    #[must_use]
    pub fn style(&self) -> TextStyle {
        TextStyle {
            font_size: self.font_size,
            color: self.color.clone(),
            background: self.background.clone(),
            alignment: self.alignment,
        }
    }
}

/// Options for `wallpaper.set` and `website.open`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryOptions {
    pub tags: Vec<String>,
}

impl QueryOptions {
    #[must_use]
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Typed payload of a show/play call, one variant per category.
#[derive(Debug, Clone, PartialEq)]
pub enum ShowRequest {
    Image(ImageOptions),
    Video(VideoOptions),
    Audio(AudioOptions),
    Overlay(ImageOptions),
    Prompt(PromptOptions),
    Wallpaper(QueryOptions),
    Website(QueryOptions),
}

impl ShowRequest {
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Self::Image(_) => Category::Image,
            Self::Video(_) => Category::Video,
            Self::Audio(_) => Category::Audio,
            Self::Overlay(_) => Category::Overlay,
            Self::Prompt(_) => Category::Prompt,
            Self::Wallpaper(_) => Category::Wallpaper,
            Self::Website(_) => Category::Website,
        }
    }

    /// Extra selection tags (empty for prompts).
    #[must_use]
    pub fn tags(&self) -> &[String] {
        match self {
            Self::Image(o) | Self::Overlay(o) => &o.tags,
            Self::Video(o) => &o.tags,
            Self::Audio(o) => &o.tags,
            Self::Prompt(_) => &[],
            Self::Wallpaper(o) | Self::Website(o) => &o.tags,
        }
    }

    /// # Errors
    ///
    /// The first invalid option.
    pub fn validate(&self) -> Result<(), OptionsError> {
        match self {
            Self::Image(o) | Self::Overlay(o) => o.validate(),
            Self::Video(o) => o.validate(),
            Self::Audio(o) => o.validate(),
            Self::Prompt(o) => o.validate(),
            Self::Wallpaper(_) | Self::Website(_) => Ok(()),
        }
    }

    /// Initial attribute snapshot of the handle this request creates.
    #[must_use]
    pub fn attrs(&self) -> HandleAttrs {
        match self {
            Self::Image(o) | Self::Overlay(o) => o.attrs(self.category()),
            Self::Video(o) => o.attrs(),
            Self::Audio(o) => o.attrs(),
            Self::Prompt(o) => o.attrs(),
            Self::Wallpaper(_) | Self::Website(_) => HandleAttrs::default(),
        }
    }

    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        let secs = match self {
            Self::Image(o) | Self::Overlay(o) => o.duration,
            Self::Video(o) => o.duration,
            Self::Audio(o) => o.duration,
            Self::Prompt(o) => o.duration,
            Self::Wallpaper(_) | Self::Website(_) => None,
        };
        check_duration(secs).ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_documented_values() {
        let image = ImageOptions::default();
        assert!((image.opacity - 1.0).abs() < f32::EPSILON);

        let video = VideoOptions::default();
        assert!((video.volume - 1.0).abs() < f32::EPSILON);
        assert!(!video.looping);
        assert!(video.autoplay);

        let prompt = PromptOptions::default();
        assert_eq!(prompt.font_size, 32);
        assert_eq!(prompt.alignment, Alignment::Left);
    }

    #[test]
    fn deserialize_partial_and_renamed_fields() {
        let opts: VideoOptions =
            serde_json::from_str(r#"{"tags":["beach"],"loop":true,"volume":0.4}"#).expect("parse");
        assert_eq!(opts.tags, vec!["beach"]);
        assert!(opts.looping);
        assert!((opts.volume - 0.4).abs() < f32::EPSILON);
        assert!(opts.autoplay);
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = serde_json::from_str::<ImageOptions>(r#"{"tags":[],"blur":3}"#)
            .expect_err("unknown field");
        assert!(err.to_string().contains("blur"), "got: {err}");
    }

    #[test]
    fn prompt_requires_text() {
        assert_eq!(
            PromptOptions::default().validate(),
            Err(OptionsError::Empty("text"))
        );
        assert!(PromptOptions::text("breathe").validate().is_ok());

        let huge = PromptOptions {
            font_size: 9000,
            ..PromptOptions::text("x")
        };
        assert_eq!(huge.validate(), Err(OptionsError::FontSize(9000)));
    }

    #[test]
    fn ranges_validated() {
        let bad = ImageOptions {
            opacity: 1.2,
            ..ImageOptions::default()
        };
        assert!(matches!(bad.validate(), Err(OptionsError::Attr(_))));

        let bad = AudioOptions {
            duration: Some(-1.0),
            ..AudioOptions::default()
        };
        assert_eq!(bad.validate(), Err(OptionsError::Duration(-1.0)));
    }

    #[test]
    fn video_autoplay_off_starts_paused() {
        let opts = VideoOptions {
            autoplay: false,
            ..VideoOptions::default()
        };
        assert_eq!(opts.attrs().paused, Some(true));
    }

    #[test]
    fn show_request_accessors() {
        let req = ShowRequest::Overlay(ImageOptions {
            tags: vec!["calm".into()],
            duration: Some(2.5),
            ..ImageOptions::default()
        });
        assert_eq!(req.category(), Category::Overlay);
        assert_eq!(req.tags(), ["calm".to_string()]);
        assert_eq!(req.duration(), Some(Duration::from_millis(2500)));
        assert_eq!(req.attrs().opacity, Some(1.0));
        assert!(ShowRequest::Prompt(PromptOptions::text("hi")).tags().is_empty());
    }
}
