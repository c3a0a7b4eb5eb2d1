use leptos::prelude::*;
use thaw::{MessageBar, MessageBarIntent};

#[component]
pub fn ErrorView(#[prop(into)] message: String) -> impl IntoView {
    view! {
        <MessageBar intent=MessageBarIntent::Error>
            {message}
        </MessageBar>
    }
}
