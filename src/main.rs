use tracing::Level;

mod components;
// Native builds only render the shell; the horn itself runs in the browser.
#[cfg(any(target_arch = "wasm32", test))]
mod horn;
#[cfg(target_arch = "wasm32")]
mod platform;
#[cfg(any(target_arch = "wasm32", test))]
mod settings;

use components::App;

fn main() {
    let level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    // A subscriber may already be installed by the launcher; keep going either way.
    let _ = dioxus::logger::init(level);
    dioxus::launch(App);
}
