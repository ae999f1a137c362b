//! Input binding for the horn: presses, releases and page visibility in,
//! playback and the "horning" indicator out.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, warn};

use super::analytics::{AnalyticsEvent, AnalyticsSink};
use super::engine::{PlaybackEngine, StartOptions};
use super::error::PlaybackError;
use super::hook::Hook;

/// What caused a start, reported as the analytics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HornTrigger {
    Press,
    Instant,
    Ambient,
    Remote,
}

impl HornTrigger {
    fn label(self) -> &'static str {
        match self {
            HornTrigger::Press => "press",
            HornTrigger::Instant => "instant",
            HornTrigger::Ambient => "ambient",
            HornTrigger::Remote => "remote",
        }
    }
}

/// A press on the horn. `touches` is `None` for mouse/pen input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressInput {
    pub touches: Option<usize>,
}

impl PressInput {
    pub const POINTER: Self = Self { touches: None };

    pub fn touch(touches: usize) -> Self {
        Self {
            touches: Some(touches),
        }
    }

    fn is_multi_touch(&self) -> bool {
        self.touches.is_some_and(|n| n > 1)
    }
}

struct HornShared {
    horning: Cell<bool>,
    indicator: Hook<bool>,
}

impl HornShared {
    fn set_horning(&self, on: bool) {
        if self.horning.replace(on) != on {
            self.indicator.emit(&on);
        }
    }
}

#[derive(Clone)]
pub struct AirHorn {
    engine: PlaybackEngine,
    shared: Rc<HornShared>,
    analytics: Rc<dyn AnalyticsSink>,
}

impl AirHorn {
    /// Takes over the engine's stop and failure hooks to keep the indicator
    /// in sync.
    pub fn new(engine: PlaybackEngine, analytics: Rc<dyn AnalyticsSink>) -> Self {
        let shared = Rc::new(HornShared {
            horning: Cell::new(false),
            indicator: Hook::new("horning"),
        });
        let on_stopped = {
            let weak = Rc::downgrade(&shared);
            move |_: &()| {
                if let Some(shared) = weak.upgrade() {
                    shared.set_horning(false);
                }
            }
        };
        let on_failed = {
            let weak = Rc::downgrade(&shared);
            move |_: &PlaybackError| {
                if let Some(shared) = weak.upgrade() {
                    shared.set_horning(false);
                }
            }
        };
        for registered in [
            engine.stopped().register(on_stopped),
            engine.failed().register(on_failed),
        ] {
            if let Err(err) = registered {
                warn!("{err}");
            }
        }
        Self {
            engine,
            shared,
            analytics,
        }
    }

    /// Fires with the new value whenever the "horning" indicator flips.
    pub fn indicator(&self) -> &Hook<bool> {
        &self.shared.indicator
    }

    pub fn is_horning(&self) -> bool {
        self.shared.horning.get()
    }

    pub fn start_with(&self, trigger: HornTrigger, options: StartOptions) {
        self.shared.set_horning(true);
        if let Err(err) = self.engine.start(options) {
            debug!(?trigger, "start failed: {err}");
            self.shared.set_horning(false);
        }
        self.analytics
            .send(AnalyticsEvent::new("horn", "play").with_label(trigger.label()));
    }

    pub fn stop(&self) {
        self.shared.set_horning(false);
        self.engine.stop();
    }

    /// Returns whether the press started the horn.
    pub fn press(&self, input: PressInput) -> bool {
        if input.is_multi_touch() {
            // Pinch and zoom gestures must not blast anyone.
            return false;
        }
        self.start_with(HornTrigger::Press, StartOptions::LOOPING);
        true
    }

    pub fn release(&self) {
        self.stop();
    }

    pub fn visibility_changed(&self, hidden: bool) {
        if hidden {
            self.stop();
        }
    }
}
