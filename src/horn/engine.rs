//! Session bookkeeping on top of whichever [`AudioBackend`] was selected.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use super::backend::{AudioBackend, SessionEvent, SessionId, StartOutcome};
use super::error::PlaybackError;
use super::hook::Hook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartOptions {
    pub looping: bool,
}

impl StartOptions {
    pub const LOOPING: Self = Self { looping: true };
    pub const ONCE: Self = Self { looping: false };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the asset before any sound is made.
    Loading,
    Sounding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSession {
    pub id: SessionId,
    pub looping: bool,
    pub phase: SessionPhase,
}

struct EngineInner {
    backend: RefCell<Box<dyn AudioBackend>>,
    session: Cell<Option<PlaybackSession>>,
    next_id: Cell<u64>,
    stopped: Hook<()>,
    failed: Hook<PlaybackError>,
}

/// Plays the horn. Cloning yields another handle to the same engine.
#[derive(Clone)]
pub struct PlaybackEngine {
    inner: Rc<EngineInner>,
}

impl PlaybackEngine {
    pub fn new(mut backend: Box<dyn AudioBackend>) -> Self {
        let mode = backend.mode();
        let inner = Rc::new_cyclic(|weak: &Weak<EngineInner>| {
            let weak = weak.clone();
            backend.bind(Rc::new(move |id, event| {
                if let Some(inner) = weak.upgrade() {
                    PlaybackEngine { inner }.on_session_event(id, event);
                }
            }));
            EngineInner {
                backend: RefCell::new(backend),
                session: Cell::new(None),
                next_id: Cell::new(1),
                stopped: Hook::new("stopped"),
                failed: Hook::new("failed"),
            }
        });
        debug!(?mode, "playback engine ready");
        Self { inner }
    }

    /// Fired once for every `stop()`, including natural ends.
    pub fn stopped(&self) -> &Hook<()> {
        &self.inner.stopped
    }

    /// Fired when a pending session gives up before making any sound. The
    /// session is gone afterwards but `stopped` does not fire for it.
    pub fn failed(&self) -> &Hook<PlaybackError> {
        &self.inner.failed
    }

    pub fn session(&self) -> Option<PlaybackSession> {
        self.inner.session.get()
    }

    /// Starts a new session, superseding any active one.
    pub fn start(&self, options: StartOptions) -> Result<SessionId, PlaybackError> {
        let id = SessionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let superseded = self.inner.session.replace(Some(PlaybackSession {
            id,
            looping: options.looping,
            phase: SessionPhase::Loading,
        }));
        if let Some(previous) = superseded {
            trace!(previous = previous.id.0, next = id.0, "superseding horn session");
        }

        let outcome = self.inner.backend.borrow_mut().start(id, options.looping);
        match outcome {
            Ok(StartOutcome::Sounding) => self.mark_sounding(id),
            Ok(StartOutcome::Pending) => {}
            Err(err) => {
                self.inner.session.set(None);
                warn!(session = id.0, "horn failed to start: {err}");
                return Err(err);
            }
        }
        Ok(id)
    }

    pub fn stop(&self) {
        if let Some(session) = self.inner.session.take() {
            trace!(session = session.id.0, "stopping horn session");
        }
        self.inner.backend.borrow_mut().stop();
        self.inner.stopped.emit(&());
    }

    fn mark_sounding(&self, id: SessionId) {
        if let Some(session) = self.session().filter(|s| s.id == id) {
            self.inner.session.set(Some(PlaybackSession {
                phase: SessionPhase::Sounding,
                ..session
            }));
        }
    }

    fn on_session_event(&self, id: SessionId, event: SessionEvent) {
        if self.session().map(|s| s.id) != Some(id) {
            trace!(session = id.0, ?event, "ignoring event from released session");
            return;
        }
        match event {
            SessionEvent::Started => self.mark_sounding(id),
            SessionEvent::Ended => self.stop(),
            SessionEvent::Failed(err) => {
                warn!(session = id.0, "horn never sounded: {err}");
                self.inner.session.set(None);
                self.inner.failed.emit(&err);
            }
        }
    }
}
