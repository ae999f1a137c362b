use dioxus::prelude::*;

use crate::horn::page::HornPage;

/// "Add to home screen" control, shown once the browser offers install.
#[component]
pub fn InstallerView() -> Element {
    let page = use_context::<HornPage>();
    let mut available = use_signal(|| page.install().is_available());

    {
        let install = page.install().clone();
        use_future(move || {
            let waiting = install.can_prompt();
            async move {
                waiting.await;
                available.set(true);
            }
        });
    }

    let on_install = {
        let install = page.install().clone();
        move |evt: MouseEvent| {
            evt.prevent_default();
            let prompting = install.prompt();
            spawn(async move {
                // Either answer retires the control; errors leave it as is.
                if prompting.await.is_ok() {
                    available.set(false);
                }
            });
        }
    };

    rsx! {
        div {
            id: "installer",
            class: if available() { "installer available" } else { "installer" },
            button { class: "install-button", r#type: "button", onclick: on_install,
                "Add to home screen"
            }
            div { class: "tooltip", "Keep the horn one tap away" }
        }
    }
}
