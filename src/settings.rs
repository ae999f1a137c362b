use serde::{Deserialize, Serialize};

use crate::horn::backend::LoopWindow;

#[cfg(target_arch = "wasm32")]
use gloo_storage::{errors::StorageError, LocalStorage, Storage};
#[cfg(target_arch = "wasm32")]
use tracing::{debug, warn};

#[cfg(target_arch = "wasm32")]
const SETTINGS_KEY: &str = "airhorner.settings";

/// Horn settings, overridable per browser profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HornSettings {
    #[serde(default = "default_sound_url")]
    pub sound_url: String,
    /// Illuminance (lux) below which `#dark` mode sounds the horn.
    #[serde(default = "default_light_threshold")]
    pub light_threshold: f64,
    #[serde(default)]
    pub loop_window: LoopWindow,
}

fn default_sound_url() -> String {
    "/sounds/airhorn.mp3".to_string()
}

fn default_light_threshold() -> f64 {
    1.0
}

impl Default for HornSettings {
    fn default() -> Self {
        Self {
            sound_url: default_sound_url(),
            light_threshold: default_light_threshold(),
            loop_window: LoopWindow::default(),
        }
    }
}

impl HornSettings {
    /// Replaces nonsensical values with defaults.
    fn sanitized(mut self) -> Self {
        if self.sound_url.trim().is_empty() {
            self.sound_url = default_sound_url();
        }
        if !self.light_threshold.is_finite() || self.light_threshold < 0.0 {
            self.light_threshold = default_light_threshold();
        }
        let window = self.loop_window;
        if !(window.start.is_finite() && window.end.is_finite())
            || window.start < 0.0
            || window.end <= window.start
        {
            self.loop_window = LoopWindow::default();
        }
        self
    }
}

#[cfg(target_arch = "wasm32")]
pub fn load_settings() -> HornSettings {
    match LocalStorage::get::<HornSettings>(SETTINGS_KEY) {
        Ok(settings) => settings.sanitized(),
        Err(StorageError::KeyNotFound(_)) => {
            debug!("no stored settings, using defaults");
            HornSettings::default()
        }
        Err(err) => {
            warn!("failed to read stored settings: {err}");
            HornSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_settings(raw: &str) -> serde_json::Result<HornSettings> {
        serde_json::from_str(raw)
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let settings = parse_settings(r#"{"light_threshold": 5.5}"#).unwrap();
        assert_eq!(settings.light_threshold, 5.5);
        assert_eq!(settings.sound_url, "/sounds/airhorn.mp3");
        assert_eq!(settings.loop_window, LoopWindow::default());
    }

    #[test]
    fn inverted_loop_window_and_negative_threshold_are_reset() {
        let settings = parse_settings(
            r#"{"sound_url": " ", "light_threshold": -2, "loop_window": {"start": 0.5, "end": 0.1}}"#,
        )
        .unwrap()
        .sanitized();
        assert_eq!(settings, HornSettings::default());
    }

    #[test]
    fn malformed_settings_are_rejected() {
        assert!(parse_settings("{light_threshold").is_err());
    }
}
