use leptos::prelude::*;
use thaw::{Button, ButtonAppearance};

use crate::geo::ShopWithDistance;

#[component]
pub fn ShopCard(
    entry: ShopWithDistance,
    on_select: impl Fn() + Send + Sync + 'static,
) -> impl IntoView {
    view! {
        <div class="shop-card">
            <div class="shop-card-title">{entry.shop.name.clone()}</div>
            <div class="shop-card-address">{entry.shop.address.clone()}</div>
            <span class="shop-card-distance">{format!("{:.2} km", entry.distance_km)}</span>
            <Button
                appearance=ButtonAppearance::Primary
                on_click=move |_| on_select()
            >
                "Select Shop"
            </Button>
        </div>
    }
}
