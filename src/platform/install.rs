use futures_util::future::{FutureExt, LocalBoxFuture};
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, Event};

use super::describe_js;
use crate::horn::error::InstallError;
use crate::horn::install::{InstallNegotiator, InstallOutcome, InstallPromptEvent};

/// A captured `beforeinstallprompt` event.
struct DeferredInstallEvent {
    event: Event,
}

fn rejected(err: JsValue) -> InstallError {
    InstallError::Rejected(describe_js(&err))
}

impl InstallPromptEvent for DeferredInstallEvent {
    fn prevent_default(&self) {
        self.event.prevent_default();
    }

    fn prompt(&self) -> LocalBoxFuture<'static, Result<InstallOutcome, InstallError>> {
        let event: JsValue = self.event.clone().into();
        async move {
            let prompt: Function = Reflect::get(&event, &"prompt".into())
                .and_then(|value| value.dyn_into())
                .map_err(rejected)?;
            let shown = prompt.call0(&event).map_err(rejected)?;
            if let Ok(promise) = shown.dyn_into::<Promise>() {
                JsFuture::from(promise).await.map_err(rejected)?;
            }

            let choice: Promise = Reflect::get(&event, &"userChoice".into())
                .and_then(|value| value.dyn_into())
                .map_err(rejected)?;
            let choice = JsFuture::from(choice).await.map_err(rejected)?;
            let outcome = Reflect::get(&choice, &"outcome".into())
                .ok()
                .and_then(|value| value.as_string());
            Ok(match outcome.as_deref() {
                Some("accepted") => InstallOutcome::Accepted,
                _ => InstallOutcome::Dismissed,
            })
        }
        .boxed_local()
    }
}

/// Routes the page's `beforeinstallprompt` event into `negotiator`.
pub fn listen_for_install_offer(negotiator: InstallNegotiator) {
    let Some(win) = window() else {
        return;
    };
    let on_offer = Closure::wrap(Box::new(move |event: Event| {
        negotiator.capture(Box::new(DeferredInstallEvent { event }));
    }) as Box<dyn FnMut(_)>);
    let _ = win
        .add_event_listener_with_callback("beforeinstallprompt", on_offer.as_ref().unchecked_ref());
    on_offer.forget();
}
