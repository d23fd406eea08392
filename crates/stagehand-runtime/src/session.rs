//! Session context: the pack, the user's grants, the enforced permissions
//! and the active mood.
//!
//! There is no global state. The dispatcher owns one `SessionContext`
//! behind a lock; every change goes through a method here that recomputes
//! what depends on it.
//!
//! | Change | Recomputed |
//! |--------|------------|
//! | [`set_grants`](SessionContext::set_grants) | effective permissions |
//! | [`switch_pack`](SessionContext::switch_pack) | effective permissions, active mood (reset to the pack default) |
//! | [`set_mood`](SessionContext::set_mood) | active mood |

use crate::catalog::{Mood, Pack};
use crate::error::DispatchError;
use stagehand_auth::{Capability, EffectivePermissions, PermissionResolver};

#[derive(Debug, Clone)]
pub struct SessionContext {
    pack: Pack,
    grants: Capability,
    effective: EffectivePermissions,
    mood: Mood,
}

impl SessionContext {
    /// Creates a session with the pack's default mood active.
    #[must_use]
    pub fn new(pack: Pack, grants: Capability) -> Self {
        let effective = PermissionResolver::resolve(pack.required(), grants);
        let mood = pack.moods().default_mood().clone();
        let session = Self {
            pack,
            grants,
            effective,
            mood,
        };
        session.log_resolution();
        session
    }

    /// Starts in `mood` instead of the default.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownMood`] when the pack has no such mood.
    pub fn with_mood(mut self, mood: &str) -> Result<Self, DispatchError> {
        self.set_mood(mood)?;
        Ok(self)
    }

    fn log_resolution(&self) {
        let missing = self.missing();
        if missing.is_empty() {
            tracing::debug!(
                pack = self.pack.name(),
                effective = %self.effective,
                "permissions resolved"
            );
        } else {
            tracing::warn!(
                pack = self.pack.name(),
                effective = %self.effective,
                missing = %missing,
                "pack requests capabilities the user has not granted"
            );
        }
    }

    /// Replaces the user's grants and re-resolves.
    pub fn set_grants(&mut self, grants: Capability) {
        self.grants = grants;
        self.effective = PermissionResolver::resolve(self.pack.required(), grants);
        self.log_resolution();
    }

    /// Replaces the pack, re-resolves and resets the mood.
    pub fn switch_pack(&mut self, pack: Pack) {
        self.effective = PermissionResolver::resolve(pack.required(), self.grants);
        self.mood = pack.moods().default_mood().clone();
        self.pack = pack;
        tracing::info!(pack = self.pack.name(), mood = self.mood.name(), "pack switched");
        self.log_resolution();
    }

    /// Activates the mood called `name`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownMood`]; the active mood is left unchanged.
    pub fn set_mood(&mut self, name: &str) -> Result<(), DispatchError> {
        let mood = self
            .pack
            .moods()
            .get(name)
            .ok_or_else(|| DispatchError::UnknownMood(name.to_string()))?;
        self.mood = mood.clone();
        tracing::info!(mood = name, "mood changed");
        Ok(())
    }

    #[must_use]
    pub fn pack(&self) -> &Pack {
        &self.pack
    }

    #[must_use]
    pub fn grants(&self) -> Capability {
        self.grants
    }

    #[must_use]
    pub fn effective(&self) -> &EffectivePermissions {
        &self.effective
    }

    #[must_use]
    pub fn mood(&self) -> &Mood {
        &self.mood
    }

    /// Capabilities the pack requires but the user has not granted.
    #[must_use]
    pub fn missing(&self) -> Capability {
        PermissionResolver::find_missing(self.pack.required(), self.grants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ContentItem, ContentRef};
    use stagehand_types::Category;

    fn pack(name: &str, required: Capability, moods: &[&str]) -> Pack {
        let catalog: Catalog = [Category::Image, Category::Audio, Category::Video]
            .into_iter()
            .map(|c| ContentItem::new(c, ["x"], ContentRef::Path(format!("{c}.bin").into())))
            .collect();
        Pack::new(
            name,
            required,
            catalog,
            moods.iter().map(|m| Mood::new(*m, [*m])).collect(),
        )
        .expect("valid pack")
    }

    #[test]
    fn effective_is_intersection() {
        let session = SessionContext::new(
            pack("p", Capability::IMAGE | Capability::AUDIO, &["calm"]),
            Capability::IMAGE | Capability::VIDEO,
        );
        assert_eq!(session.effective().capabilities(), Capability::IMAGE);
        assert_eq!(session.missing(), Capability::AUDIO);
    }

    #[test]
    fn set_grants_recomputes_not_unions() {
        let mut session = SessionContext::new(
            pack("p", Capability::IMAGE | Capability::AUDIO, &["calm"]),
            Capability::IMAGE,
        );
        session.set_grants(Capability::AUDIO);
        assert_eq!(session.effective().capabilities(), Capability::AUDIO);
        session.set_grants(Capability::empty());
        assert!(session.effective().is_empty());
    }

    #[test]
    fn switch_pack_recomputes_and_resets_mood() {
        let mut session = SessionContext::new(
            pack("a", Capability::IMAGE, &["calm", "focus"]),
            Capability::IMAGE | Capability::VIDEO,
        );
        session.set_mood("focus").expect("known mood");
        assert_eq!(session.mood().name(), "focus");

        session.switch_pack(pack("b", Capability::VIDEO | Capability::AUDIO, &["night"]));
        assert_eq!(session.effective().capabilities(), Capability::VIDEO);
        assert_eq!(session.mood().name(), "night");
        assert_eq!(session.pack().name(), "b");
    }

    #[test]
    fn unknown_mood_keeps_current() {
        let mut session =
            SessionContext::new(pack("p", Capability::IMAGE, &["calm"]), Capability::IMAGE);
        let err = session.set_mood("party").expect_err("unknown");
        assert_eq!(err, DispatchError::UnknownMood("party".into()));
        assert_eq!(session.mood().name(), "calm");
    }

    #[test]
    fn with_mood_builder() {
        let session = SessionContext::new(pack("p", Capability::IMAGE, &["a", "b"]), Capability::IMAGE)
            .with_mood("b")
            .expect("known");
        assert_eq!(session.mood().name(), "b");
    }
}
