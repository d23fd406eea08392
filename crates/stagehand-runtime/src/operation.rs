//! The closed set of operations a script can call.
//!
//! Operations are identified by an [`OperationId`]: a [`Category`] plus a
//! [`Verb`] the category supports. The set is closed at compile time by
//! [`verbs`], an exhaustive match; the required capability follows
//! statically from the category.
//!
//! | Category | Verbs (script names) |
//! |----------|----------------------|
//! | image, overlay | show, close, set_opacity, move, resize |
//! | prompt | show, close, set_opacity, move, resize |
//! | video | play, close, set_opacity, move, resize, set_volume, set_loop, pause, resume |
//! | audio | play, stop, set_volume, set_loop, pause, resume |
//! | wallpaper | set |
//! | website | open |
//!
//! Mood operations (`mood.get`, `mood.set`, `mood.list`) are not gated and
//! are not part of the table.

use crate::handle::{AttrDelta, Position, Size};
use crate::options::ShowRequest;
use serde::Serialize;
use stagehand_auth::Capability;
use stagehand_types::{Category, HandleId};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// What an operation does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verb {
    /// Create the host object (show, play, set, open).
    Show,
    Close,
    SetOpacity,
    Move,
    Resize,
    SetVolume,
    SetLoop,
    Pause,
    Resume,
}

const WINDOW_VERBS: &[Verb] = &[
    Verb::Show,
    Verb::Close,
    Verb::SetOpacity,
    Verb::Move,
    Verb::Resize,
];

const VIDEO_VERBS: &[Verb] = &[
    Verb::Show,
    Verb::Close,
    Verb::SetOpacity,
    Verb::Move,
    Verb::Resize,
    Verb::SetVolume,
    Verb::SetLoop,
    Verb::Pause,
    Verb::Resume,
];

const AUDIO_VERBS: &[Verb] = &[
    Verb::Show,
    Verb::Close,
    Verb::SetVolume,
    Verb::SetLoop,
    Verb::Pause,
    Verb::Resume,
];

const ONESHOT_VERBS: &[Verb] = &[Verb::Show];

/// Verbs supported by `category`.
#[must_use]
pub const fn verbs(category: Category) -> &'static [Verb] {
    match category {
        Category::Image | Category::Overlay | Category::Prompt => WINDOW_VERBS,
        Category::Video => VIDEO_VERBS,
        Category::Audio => AUDIO_VERBS,
        Category::Wallpaper | Category::Website => ONESHOT_VERBS,
    }
}

/// Script-facing name of `verb` within `category`.
#[must_use]
pub const fn verb_name(category: Category, verb: Verb) -> &'static str {
    match (verb, category) {
        (Verb::Show, Category::Video | Category::Audio) => "play",
        (Verb::Show, Category::Wallpaper) => "set",
        (Verb::Show, Category::Website) => "open",
        (Verb::Show, _) => "show",
        (Verb::Close, Category::Audio) => "stop",
        (Verb::Close, _) => "close",
        (Verb::SetOpacity, _) => "set_opacity",
        (Verb::Move, _) => "move",
        (Verb::Resize, _) => "resize",
        (Verb::SetVolume, _) => "set_volume",
        (Verb::SetLoop, _) => "set_loop",
        (Verb::Pause, _) => "pause",
        (Verb::Resume, _) => "resume",
    }
}

/// A supported `(category, verb)` pair.
///
/// # Example
///
/// ```
/// use stagehand_auth::Capability;
/// use stagehand_runtime::operation::{OperationId, Verb};
/// use stagehand_types::Category;
///
/// let op = OperationId::new(Category::Audio, Verb::Close).expect("supported");
/// assert_eq!(op.to_string(), "audio.stop");
/// assert_eq!(op.required_capability(), Capability::AUDIO);
///
/// assert!(OperationId::new(Category::Audio, Verb::Resize).is_none());
/// assert_eq!(OperationId::parse("video.play"), OperationId::new(Category::Video, Verb::Show));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OperationId {
    category: Category,
    verb: Verb,
}

impl OperationId {
    /// Returns `None` when `category` does not support `verb`.
    #[must_use]
    pub fn new(category: Category, verb: Verb) -> Option<Self> {
        verbs(category)
            .contains(&verb)
            .then_some(Self { category, verb })
    }

    /// Parses a script name such as `"image.show"` or `"audio.stop"`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let (category, verb) = name.split_once('.')?;
        let category: Category = category.parse().ok()?;
        verbs(category)
            .iter()
            .find(|v| verb_name(category, **v) == verb)
            .map(|v| Self {
                category,
                verb: *v,
            })
    }

    #[must_use]
    pub fn category(self) -> Category {
        self.category
    }

    #[must_use]
    pub fn verb(self) -> Verb {
        self.verb
    }

    #[must_use]
    pub fn verb_name(self) -> &'static str {
        verb_name(self.category, self.verb)
    }

    /// Capability every call of this operation requires.
    #[must_use]
    pub fn required_capability(self) -> Capability {
        Capability::for_category(self.category)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category, self.verb_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationTableError {
    #[error("operation name registered twice: {0}")]
    Duplicate(String),

    #[error("operation name does not parse back to its id: {0}")]
    Unparseable(String),
}

/// Every operation, by script name.
///
/// Built once at startup and checked with [`OperationTable::verify`].
#[derive(Debug, Clone)]
pub struct OperationTable {
    ops: Vec<OperationId>,
    by_name: HashMap<String, OperationId>,
}

impl OperationTable {
    /// Table of every supported `(category, verb)` pair.
    #[must_use]
    pub fn standard() -> Self {
        let ops: Vec<OperationId> = Category::ALL
            .into_iter()
            .flat_map(|c| verbs(c).iter().map(move |v| OperationId { category: c, verb: *v }))
            .collect();
        let by_name = ops.iter().map(|op| (op.to_string(), *op)).collect();
        Self { ops, by_name }
    }

    /// Checks that names are unique and parse back to their ids.
    ///
    /// # Errors
    ///
    /// The first offending name.
    pub fn verify(&self) -> Result<(), OperationTableError> {
        if self.by_name.len() != self.ops.len() {
            let mut seen = HashMap::new();
            for op in &self.ops {
                if seen.insert(op.to_string(), *op).is_some() {
                    return Err(OperationTableError::Duplicate(op.to_string()));
                }
            }
        }
        for op in &self.ops {
            let name = op.to_string();
            if OperationId::parse(&name) != Some(*op) {
                return Err(OperationTableError::Unparseable(name));
            }
        }
        tracing::debug!(operations = self.ops.len(), "operation table verified");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<OperationId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = OperationId> + '_ {
        self.ops.iter().copied()
    }

    /// Operations of one category, in verb order.
    pub fn for_category(&self, category: Category) -> impl Iterator<Item = OperationId> + '_ {
        self.iter().filter(move |op| op.category == category)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A follow-up change to an existing handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleChange {
    Close,
    Opacity(f32),
    Move(Position),
    Resize(Size),
    Volume(f32),
    Loop(bool),
    Pause,
    Resume,
}

impl HandleChange {
    #[must_use]
    pub fn verb(self) -> Verb {
        match self {
            Self::Close => Verb::Close,
            Self::Opacity(_) => Verb::SetOpacity,
            Self::Move(_) => Verb::Move,
            Self::Resize(_) => Verb::Resize,
            Self::Volume(_) => Verb::SetVolume,
            Self::Loop(_) => Verb::SetLoop,
            Self::Pause => Verb::Pause,
            Self::Resume => Verb::Resume,
        }
    }

    /// Attribute delta this change applies; empty for `Close`.
    #[must_use]
    pub fn delta(self) -> AttrDelta {
        let mut delta = AttrDelta::default();
        match self {
            Self::Close => {}
            Self::Opacity(v) => delta.opacity = Some(v),
            Self::Move(p) => delta.position = Some(p),
            Self::Resize(s) => delta.size = Some(s),
            Self::Volume(v) => delta.volume = Some(v),
            Self::Loop(b) => delta.looping = Some(b),
            Self::Pause => delta.paused = Some(true),
            Self::Resume => delta.paused = Some(false),
        }
        delta
    }
}

/// One script-to-host request.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationCall {
    /// Create a host object (or fire a one-shot effect).
    Show(ShowRequest),
    /// Change or close an existing handle.
    Handle {
        category: Category,
        handle: HandleId,
        change: HandleChange,
    },
    /// A call whose arguments could not be decoded on the script side.
    ///
    /// Still gated: the dispatcher checks the capability before reporting
    /// the arguments as invalid.
    Malformed {
        category: Category,
        verb: Verb,
        reason: String,
    },
    GetMood,
    SetMood(String),
    ListMoods,
}

impl OperationCall {
    /// Capability the call requires, `None` for mood operations.
    #[must_use]
    pub fn required_capability(&self) -> Option<Capability> {
        self.category().map(Capability::for_category)
    }

    #[must_use]
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::Show(req) => Some(req.category()),
            Self::Handle { category, .. } | Self::Malformed { category, .. } => Some(*category),
            Self::GetMood | Self::SetMood(_) | Self::ListMoods => None,
        }
    }

    /// Script-facing name, used in logs and errors.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Show(req) => format!("{}.{}", req.category(), verb_name(req.category(), Verb::Show)),
            Self::Handle {
                category, change, ..
            } => format!("{}.{}", category, verb_name(*category, change.verb())),
            Self::Malformed { category, verb, .. } => {
                format!("{}.{}", category, verb_name(*category, *verb))
            }
            Self::GetMood => "mood.get".to_string(),
            Self::SetMood(_) => "mood.set".to_string(),
            Self::ListMoods => "mood.list".to_string(),
        }
    }
}
