//! Ambient-light autoplay: turns raw lux readings into over/under threshold
//! transitions.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::error::SensorError;
use super::hook::Hook;

pub trait LightSensor {
    /// Begin delivering illuminance readings (lux) to `on_reading`.
    fn start(&self, on_reading: Box<dyn FnMut(f64)>) -> Result<(), SensorError>;
    fn stop(&self);
}

pub enum AmbientSensorCapability {
    Present(Box<dyn LightSensor>),
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightLevel {
    Over,
    Under,
}

struct AmbientInner {
    sensor: AmbientSensorCapability,
    threshold: f64,
    level: Cell<LightLevel>,
    running: Cell<bool>,
    under: Hook<()>,
    over: Hook<()>,
}

#[derive(Clone)]
pub struct AmbientLightController {
    inner: Rc<AmbientInner>,
}

impl AmbientLightController {
    pub fn new(sensor: AmbientSensorCapability, threshold: f64) -> Self {
        Self {
            inner: Rc::new(AmbientInner {
                sensor,
                threshold,
                level: Cell::new(LightLevel::Over),
                running: Cell::new(false),
                under: Hook::new("under_threshold"),
                over: Hook::new("over_threshold"),
            }),
        }
    }

    pub fn under_threshold(&self) -> &Hook<()> {
        &self.inner.under
    }

    pub fn over_threshold(&self) -> &Hook<()> {
        &self.inner.over
    }

    /// Subscribes to the sensor. Without one this does nothing, and a second
    /// call while running is ignored.
    pub fn start(&self) {
        let AmbientSensorCapability::Present(sensor) = &self.inner.sensor else {
            debug!("no ambient light sensor, dark mode unavailable");
            return;
        };
        if self.inner.running.get() {
            return;
        }

        let weak: Weak<AmbientInner> = Rc::downgrade(&self.inner);
        let on_reading = Box::new(move |illuminance: f64| {
            if let Some(inner) = weak.upgrade() {
                AmbientLightController { inner }.observe(illuminance);
            }
        });
        match sensor.start(on_reading) {
            Ok(()) => self.inner.running.set(true),
            Err(err) => warn!("{err}"),
        }
    }

    pub fn stop(&self) {
        if !self.inner.running.replace(false) {
            return;
        }
        if let AmbientSensorCapability::Present(sensor) = &self.inner.sensor {
            sensor.stop();
        }
        self.inner.level.set(LightLevel::Over);
    }

    fn observe(&self, illuminance: f64) {
        if !self.inner.running.get() {
            return;
        }
        let level = if illuminance < self.inner.threshold {
            LightLevel::Under
        } else {
            LightLevel::Over
        };
        if self.inner.level.replace(level) == level {
            return;
        }
        debug!(illuminance, ?level, "ambient light crossed threshold");
        match level {
            LightLevel::Under => self.inner.under.emit(&()),
            LightLevel::Over => self.inner.over.emit(&()),
        };
    }
}
