use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::window;

use crate::horn::analytics::{AnalyticsEvent, AnalyticsSink, TraceAnalytics};

/// Sends events to the page's `ga()` tracker when one is installed.
pub struct PageAnalytics;

impl AnalyticsSink for PageAnalytics {
    fn send(&self, event: AnalyticsEvent) {
        let tracker = window()
            .and_then(|win| Reflect::get(&win, &"ga".into()).ok())
            .and_then(|value| value.dyn_into::<Function>().ok());
        let Some(tracker) = tracker else {
            TraceAnalytics.send(event);
            return;
        };

        let args = Array::of4(
            &"send".into(),
            &"event".into(),
            &event.category.as_str().into(),
            &event.action.as_str().into(),
        );
        if let Some(label) = &event.label {
            args.push(&JsValue::from_str(label));
        }
        // Tracker failures never reach the horn.
        let _ = tracker.apply(&JsValue::NULL, &args);
    }
}
