use dioxus::prelude::*;

#[cfg(target_arch = "wasm32")]
use crate::components::{AirHornView, InstallerView};
#[cfg(target_arch = "wasm32")]
use crate::horn::page::HornPage;
#[cfg(target_arch = "wasm32")]
use crate::platform::{build_page, expose_to_opener, listen_for_install_offer};
#[cfg(target_arch = "wasm32")]
use crate::settings::load_settings;
#[cfg(target_arch = "wasm32")]
use dioxus::core::{Runtime, RuntimeGuard};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use web_sys::window;

const MAIN_CSS: Asset = asset!("/assets/styling/main.css");

/// Page root: owns the horn page and wires document-level signals into it.
#[cfg(target_arch = "wasm32")]
#[component]
pub fn App() -> Element {
    let page = use_hook(|| {
        let settings = load_settings();
        let page = build_page(&settings);
        listen_for_install_offer(page.install().clone());
        expose_to_opener(page.horn().clone());
        page
    });
    use_context_provider(|| page.clone());

    let listeners_page = page.clone();
    use_effect(move || {
        let Some(win) = window() else {
            return;
        };
        let Some(doc) = win.document() else {
            return;
        };
        let runtime = Runtime::current();
        let page: HornPage = listeners_page.clone();

        // Releases are watched on the whole document so dragging off the
        // horn before letting go still stops it.
        let release_cb = {
            let page = page.clone();
            let runtime = runtime.clone();
            Closure::wrap(Box::new(move |_e: web_sys::Event| {
                let _guard = RuntimeGuard::new(runtime.clone());
                page.horn().release();
            }) as Box<dyn FnMut(_)>)
        };
        let visibility_cb = {
            let page = page.clone();
            let runtime = runtime.clone();
            let doc = doc.clone();
            Closure::wrap(Box::new(move |_e: web_sys::Event| {
                let _guard = RuntimeGuard::new(runtime.clone());
                page.handle_visibility(doc.hidden());
            }) as Box<dyn FnMut(_)>)
        };
        let hash_cb = {
            let page = page.clone();
            let runtime = runtime.clone();
            let win = win.clone();
            Closure::wrap(Box::new(move |_e: web_sys::Event| {
                let _guard = RuntimeGuard::new(runtime.clone());
                let hash = win.location().hash().unwrap_or_default();
                page.handle_fragment(&hash);
            }) as Box<dyn FnMut(_)>)
        };

        if let Some(root) = doc.document_element() {
            for event in ["mouseup", "touchend"] {
                let _ = root
                    .add_event_listener_with_callback(event, release_cb.as_ref().unchecked_ref());
            }
        }
        let _ = doc.add_event_listener_with_callback(
            "visibilitychange",
            visibility_cb.as_ref().unchecked_ref(),
        );
        let _ = win.add_event_listener_with_callback("hashchange", hash_cb.as_ref().unchecked_ref());

        release_cb.forget();
        visibility_cb.forget();
        hash_cb.forget();

        let hash = win.location().hash().unwrap_or_default();
        page.handle_fragment(&hash);
    });

    rsx! {
        document::Meta { name: "theme-color", content: "#2e3aa1" }
        document::Meta { name: "mobile-web-app-capable", content: "yes" }
        document::Link { rel: "manifest", href: "/manifest.json" }
        document::Stylesheet { href: MAIN_CSS }

        main { class: "stage",
            AirHornView {}
            InstallerView {}
        }
    }
}

/// Playback needs a browser; native builds only render the shell.
#[cfg(not(target_arch = "wasm32"))]
#[component]
pub fn App() -> Element {
    rsx! {
        document::Stylesheet { href: MAIN_CSS }
        main { class: "stage",
            p { class: "unsupported", "Air Horner needs a web browser to blast." }
        }
    }
}
