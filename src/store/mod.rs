//! The session store.
//!
//! [`SessionStore`] owns the current [`Timeline`] and the file it belongs
//! to. Each operation validates and computes the next timeline, commits it,
//! and then hands it to the [`StateCache`]. Rejected edits leave the store
//! untouched and are reported as `false`. Cache failures are logged and
//! never reach the caller.

use parking_lot::RwLock;
use splitforge_core::{MarkerId, SegmentId};
use splitforge_timeline::{Rejection, Timeline, Transition};

use crate::cache::{FileDescriptor, NullCache, StateCache};

/// How [`SessionStore::open`] initialised the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The cache held a valid session for the same file.
    Restored,
    /// A fresh timeline with a single segment.
    Fresh,
}

#[derive(Debug, Default)]
struct Session {
    file: Option<FileDescriptor>,
    timeline: Timeline,
}

pub struct SessionStore {
    session: RwLock<Session>,
    cache: Box<dyn StateCache>,
}

impl SessionStore {
    /// An empty store persisting through `cache`.
    pub fn new(cache: Box<dyn StateCache>) -> Self {
        Self {
            session: RwLock::new(Session::default()),
            cache,
        }
    }

    /// An empty store that persists nothing.
    pub fn in_memory() -> Self {
        Self::new(Box::new(NullCache))
    }

    /// A store resuming whatever session `cache` holds.
    ///
    /// An unreadable or inconsistent slot is logged and ignored.
    pub fn restore(cache: Box<dyn StateCache>) -> Self {
        let store = Self::new(cache);
        match store.cache.load_state() {
            Ok(Some(state)) => match state.to_timeline() {
                Ok(timeline) => {
                    tracing::debug!(
                        "Resumed session for {} ({} segments)",
                        state.file_name,
                        timeline.segments().len()
                    );
                    *store.session.write() = Session {
                        file: Some(state.file()),
                        timeline,
                    };
                }
                Err(violation) => {
                    tracing::warn!("Ignoring inconsistent cached session: {violation}");
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring unreadable cached session: {e}"),
        }
        store
    }

    /// Open `file` with the given duration.
    ///
    /// When the cache holds a valid session for the same name, size and
    /// duration it is restored, unless `fresh` is set. Otherwise the model is
    /// discarded and re-initialised with a single segment.
    pub fn open(&self, file: FileDescriptor, duration: f64, fresh: bool) -> OpenOutcome {
        if !fresh {
            if let Some(timeline) = self.cached_timeline_for(&file, duration) {
                tracing::info!("Restored session for {}", file.name);
                *self.session.write() = Session {
                    file: Some(file),
                    timeline,
                };
                return OpenOutcome::Restored;
            }
        }

        tracing::info!("Opened {} ({duration:.3}s)", file.name);
        let mut session = self.session.write();
        *session = Session {
            file: Some(file),
            timeline: Timeline::new(duration),
        };
        self.persist(&session);
        OpenOutcome::Fresh
    }

    fn cached_timeline_for(&self, file: &FileDescriptor, duration: f64) -> Option<Timeline> {
        let state = match self.cache.load_state() {
            Ok(Some(state)) => state,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read state cache: {e}");
                return None;
            }
        };
        if !state.matches(file) {
            return None;
        }
        if state.duration != duration {
            tracing::info!(
                "Cached session for {} has duration {} instead of {duration}; starting fresh",
                file.name,
                state.duration
            );
            return None;
        }
        match state.to_timeline() {
            Ok(timeline) => Some(timeline),
            Err(violation) => {
                tracing::warn!("Ignoring inconsistent cached session: {violation}");
                None
            }
        }
    }

    /// Discard the model and start over with `duration`, keeping the file.
    pub fn set_duration(&self, duration: f64) {
        let mut session = self.session.write();
        session.timeline = Timeline::new(duration);
        tracing::info!("Timeline reset to {duration:.3}s");
        self.persist(&session);
    }

    /// Forget the session and empty the cache slot.
    pub fn clear(&self) {
        *self.session.write() = Session::default();
        if let Err(e) = self.cache.clear_state() {
            tracing::error!("Failed to clear state cache: {e}");
        }
        tracing::info!("Session cleared");
    }

    /// A copy of the current timeline.
    pub fn snapshot(&self) -> Timeline {
        self.session.read().timeline.clone()
    }

    pub fn file(&self) -> Option<FileDescriptor> {
        self.session.read().file.clone()
    }

    pub fn has_stored_state(&self) -> bool {
        self.cache.has_stored_state()
    }

    /// Apply `edit` to the current timeline and commit the result.
    ///
    /// The write lock is held across compute and commit, so edits apply in
    /// the order they are issued.
    pub fn apply(&self, edit: impl FnOnce(&Timeline) -> Transition) -> Result<(), Rejection> {
        let mut session = self.session.write();
        match edit(&session.timeline) {
            Ok(next) => {
                session.timeline = next;
                self.persist(&session);
                Ok(())
            }
            Err(rejection) => {
                tracing::debug!("Edit rejected: {rejection}");
                Err(rejection)
            }
        }
    }

    pub fn add_marker(&self, time: f64) -> bool {
        self.apply(|t| t.add_marker(time)).is_ok()
    }

    pub fn update_marker(&self, id: MarkerId, new_time: f64) -> bool {
        self.apply(|t| t.update_marker(id, new_time)).is_ok()
    }

    pub fn delete_marker(&self, id: MarkerId) -> bool {
        self.apply(|t| t.delete_marker(id)).is_ok()
    }

    pub fn rename_segment(&self, id: SegmentId, name: &str) -> bool {
        self.apply(|t| t.rename_segment(id, name)).is_ok()
    }

    pub fn toggle_segment_selected(&self, id: SegmentId) -> bool {
        self.apply(|t| t.toggle_segment_selected(id)).is_ok()
    }

    pub fn delete_segment(&self, id: SegmentId) -> bool {
        self.apply(|t| t.delete_segment(id)).is_ok()
    }

    pub fn update_segment_time(&self, id: SegmentId, new_start: f64, new_end: f64) -> bool {
        self.apply(|t| t.update_segment_time(id, new_start, new_end))
            .is_ok()
    }

    fn persist(&self, session: &Session) {
        let Some(file) = &session.file else {
            return;
        };
        let t = &session.timeline;
        if let Err(e) = self
            .cache
            .save_state(file, t.duration(), t.markers(), t.segments())
        {
            tracing::error!("Failed to persist session for {}: {e}", file.name);
        }
    }
}
