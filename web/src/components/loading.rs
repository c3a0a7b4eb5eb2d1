use leptos::prelude::*;
use thaw::{Spinner, SpinnerSize};

#[component]
pub fn LoadingView(#[prop(into)] message: String) -> impl IntoView {
    view! {
        <div class="loading-view">
            <Spinner size=SpinnerSize::Large />
            <p class="loading-view-message">{message}</p>
        </div>
    }
}
