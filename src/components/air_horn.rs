use dioxus::prelude::*;

use crate::horn::controller::PressInput;
use crate::horn::page::HornPage;
use dioxus::core::{Runtime, RuntimeGuard};
use tracing::warn;

const HORN_IMAGE: Asset = asset!("/assets/images/airhorn.svg");

/// The horn button. Press to blast, release anywhere to stop.
#[component]
pub fn AirHornView() -> Element {
    let page = use_context::<HornPage>();
    let horning = use_signal(|| page.horn().is_horning());

    {
        let horn = page.horn().clone();
        use_hook(move || {
            let runtime = Runtime::current();
            let registered = horn.indicator().register(move |on| {
                let _guard = RuntimeGuard::new(runtime.clone());
                let mut horning = horning;
                horning.set(*on);
            });
            if let Err(err) = registered {
                warn!("{err}");
            }
        });
    }

    let on_mouse_down = {
        let horn = page.horn().clone();
        move |evt: MouseEvent| {
            evt.prevent_default();
            horn.press(PressInput::POINTER);
        }
    };

    let on_touch_start = {
        let horn = page.horn().clone();
        move |evt: TouchEvent| {
            evt.prevent_default();
            horn.press(PressInput::touch(evt.touches().len()));
        }
    };

    rsx! {
        div { id: "airhorn", class: "airhorn",
            img {
                class: if horning() { "horn horning" } else { "horn" },
                src: HORN_IMAGE,
                alt: "Air horn",
                draggable: "false",
                onmousedown: on_mouse_down,
                ontouchstart: on_touch_start,
            }
        }
    }
}
