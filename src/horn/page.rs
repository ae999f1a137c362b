//! Page-level wiring: one horn, one ambient controller and one install
//! negotiator, connected the way the page uses them.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, warn};

use super::ambient::{AmbientLightController, AmbientSensorCapability};
use super::analytics::AnalyticsSink;
use super::controller::{AirHorn, HornTrigger};
use super::engine::{PlaybackEngine, StartOptions};
use super::install::InstallNegotiator;

/// URL fragments with special meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentDirective {
    /// `#instant`: blast once, no loop.
    Instant,
    /// `#dark`: blast while the room is dark.
    Dark,
}

impl FragmentDirective {
    /// Expects `location.hash` as is, leading `#` included.
    pub fn parse(fragment: &str) -> Option<Self> {
        match fragment.strip_prefix('#')? {
            "instant" => Some(Self::Instant),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct HornPage {
    horn: AirHorn,
    ambient: AmbientLightController,
    /// Set while a loop started by the ambient controller may be sounding.
    ambient_looping: Rc<Cell<bool>>,
    install: InstallNegotiator,
}

impl HornPage {
    pub fn new(
        engine: PlaybackEngine,
        sensor: AmbientSensorCapability,
        light_threshold: f64,
        analytics: Rc<dyn AnalyticsSink>,
    ) -> Self {
        let horn = AirHorn::new(engine, analytics.clone());
        let ambient = AmbientLightController::new(sensor, light_threshold);
        let install = InstallNegotiator::new(analytics);

        let ambient_looping = Rc::new(Cell::new(false));
        let under = {
            let horn = horn.clone();
            let looping = ambient_looping.clone();
            move |_: &()| {
                if !looping.replace(true) {
                    horn.start_with(HornTrigger::Ambient, StartOptions::LOOPING);
                }
            }
        };
        let over = {
            let horn = horn.clone();
            let looping = ambient_looping.clone();
            move |_: &()| {
                horn.stop();
                looping.set(false);
            }
        };
        for registered in [
            ambient.under_threshold().register(under),
            ambient.over_threshold().register(over),
        ] {
            if let Err(err) = registered {
                warn!("{err}");
            }
        }

        Self {
            horn,
            ambient,
            ambient_looping,
            install,
        }
    }

    pub fn horn(&self) -> &AirHorn {
        &self.horn
    }

    pub fn install(&self) -> &InstallNegotiator {
        &self.install
    }

    /// Applies the fragment on load and after every `hashchange`. Moving
    /// away from `#dark` unsubscribes from the light sensor and silences a
    /// loop it started.
    pub fn handle_fragment(&self, fragment: &str) -> Option<FragmentDirective> {
        let directive = FragmentDirective::parse(fragment);
        if directive != Some(FragmentDirective::Dark) {
            self.ambient.stop();
            if self.ambient_looping.replace(false) {
                self.horn.stop();
            }
        }
        let directive = directive?;
        debug!(?directive, "fragment directive");
        match directive {
            FragmentDirective::Instant => self
                .horn
                .start_with(HornTrigger::Instant, StartOptions::ONCE),
            FragmentDirective::Dark => self.ambient.start(),
        }
        Some(directive)
    }

    pub fn handle_visibility(&self, hidden: bool) {
        self.horn.visibility_changed(hidden);
    }
}
