//! The components module contains the page's UI around the horn.

mod app;
#[cfg(target_arch = "wasm32")]
mod air_horn;
#[cfg(target_arch = "wasm32")]
mod installer;

pub use app::*;
#[cfg(target_arch = "wasm32")]
pub use air_horn::*;
#[cfg(target_arch = "wasm32")]
pub use installer::*;
