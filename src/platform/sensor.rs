use std::cell::RefCell;

use js_sys::{Array, Function, Reflect};
use tracing::debug;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::window;

use super::describe_js;
use crate::horn::ambient::{AmbientSensorCapability, LightSensor};
use crate::horn::error::SensorError;

/// Generic Sensor API `AmbientLightSensor`, driven through reflection since
/// the interface is still behind flags in most browsers.
pub struct WebLightSensor {
    sensor: JsValue,
    reading: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl WebLightSensor {
    fn call(&self, method: &str) -> Result<(), JsValue> {
        let function: Function = Reflect::get(&self.sensor, &method.into())?.dyn_into()?;
        function.call0(&self.sensor).map(|_| ())
    }
}

impl LightSensor for WebLightSensor {
    fn start(&self, mut on_reading: Box<dyn FnMut(f64)>) -> Result<(), SensorError> {
        let sensor = self.sensor.clone();
        let closure = Closure::wrap(Box::new(move || {
            let lux = Reflect::get(&sensor, &"illuminance".into())
                .ok()
                .and_then(|value| value.as_f64());
            if let Some(lux) = lux {
                on_reading(lux);
            }
        }) as Box<dyn FnMut()>);

        let start_error = |err: JsValue| SensorError::Start(describe_js(&err));
        Reflect::set(&self.sensor, &"onreading".into(), closure.as_ref()).map_err(start_error)?;
        self.reading.replace(Some(closure));
        self.call("start").map_err(start_error)
    }

    fn stop(&self) {
        let _ = self.call("stop");
        let _ = Reflect::set(&self.sensor, &"onreading".into(), &JsValue::NULL);
        self.reading.replace(None);
    }
}

pub fn detect_ambient_sensor() -> AmbientSensorCapability {
    let constructor = window()
        .and_then(|win| Reflect::get(&win, &"AmbientLightSensor".into()).ok())
        .and_then(|value| value.dyn_into::<Function>().ok());
    let Some(constructor) = constructor else {
        return AmbientSensorCapability::Absent;
    };
    match Reflect::construct(&constructor, &Array::new()) {
        Ok(sensor) => AmbientSensorCapability::Present(Box::new(WebLightSensor {
            sensor,
            reading: RefCell::new(None),
        })),
        Err(err) => {
            debug!("AmbientLightSensor unavailable: {}", describe_js(&err));
            AmbientSensorCapability::Absent
        }
    }
}
