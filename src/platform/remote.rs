use js_sys::{Array, JSON};
use tracing::{info, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, MessageChannel, MessageEvent, Window};

use super::describe_js;
use crate::horn::controller::AirHorn;
use crate::horn::remote::{dispatch, RemoteAnnouncement};

fn message_text(data: &JsValue) -> Option<String> {
    if let Some(text) = data.as_string() {
        return Some(text);
    }
    JSON::stringify(data).ok().map(String::from)
}

/// When this page was opened by another window, hands that window a message
/// port that drives `horn`, and announces readiness on it.
pub fn expose_to_opener(horn: AirHorn) {
    let Some(opener) = window()
        .and_then(|win| win.opener().ok())
        .filter(|opener| !opener.is_null() && !opener.is_undefined())
        .and_then(|opener| opener.dyn_into::<Window>().ok())
    else {
        return;
    };

    let channel = match MessageChannel::new() {
        Ok(channel) => channel,
        Err(err) => {
            warn!("cannot open remote channel: {}", describe_js(&err));
            return;
        }
    };

    let port = channel.port1();
    let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
        let Some(raw) = message_text(&event.data()) else {
            return;
        };
        if let Err(err) = dispatch(&horn, &raw) {
            warn!("{err}");
        }
    }) as Box<dyn FnMut(_)>);
    port.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
    on_message.forget();
    port.start();

    let ready = serde_json::to_string(&RemoteAnnouncement::Ready)
        .ok()
        .and_then(|text| JSON::parse(&text).ok());
    let Some(ready) = ready else {
        return;
    };
    match opener.post_message_with_transfer(&ready, "*", &Array::of1(&channel.port2())) {
        Ok(()) => info!("remote control offered to opener"),
        Err(err) => warn!("opener refused remote channel: {}", describe_js(&err)),
    }
}
