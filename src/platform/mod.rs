//! Browser implementations of the horn's platform traits.

mod analytics;
mod audio;
mod install;
mod remote;
mod sensor;

use std::rc::Rc;

use crate::horn::engine::PlaybackEngine;
use crate::horn::page::HornPage;
use crate::settings::HornSettings;

pub use install::listen_for_install_offer;
pub use remote::expose_to_opener;

/// Inspects the browser once and builds the page's horn, ambient controller
/// and install negotiator.
pub fn build_page(settings: &HornSettings) -> HornPage {
    let backend = audio::select_browser_backend(settings);
    HornPage::new(
        PlaybackEngine::new(backend),
        sensor::detect_ambient_sensor(),
        settings.light_threshold,
        Rc::new(analytics::PageAnalytics),
    )
}

pub(crate) fn describe_js(value: &wasm_bindgen::JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    js_sys::Reflect::get(value, &"message".into())
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}
