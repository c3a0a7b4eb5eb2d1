use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use shared_types::{Selection, Shop, UserLocation};

use crate::{
    components::{ErrorView, LoadingView, ShopCard},
    geo::sort_by_distance,
    server::get_shops,
    storage,
    views::map::locator_map::LocatorMap,
};

#[component]
pub fn LocatorPage() -> impl IntoView {
    let shops = Resource::new(|| (), |_| async move { get_shops().await });
    let user = RwSignal::new(None::<UserLocation>);
    let status = RwSignal::new("Getting your position…".to_string());

    // Geolocation only exists in the browser; the server render shows the
    // waiting state until hydration kicks in.
    #[cfg(feature = "hydrate")]
    Effect::new(move |_| {
        request_geolocation(user, status);
    });

    view! {
        <div class="locator-page">
            <h1>"Find a free shop near you"</h1>
            <p class="location-status">
                {move || status.get()}
                {move || {
                    user.get()
                        .and_then(|u| u.address)
                        .map(|address| format!(" · {}", address))
                        .unwrap_or_default()
                }}
            </p>

            <Suspense fallback=move || view! {
                <LoadingView message="Loading shops…" />
            }>
                {move || match shops.get() {
                    Some(Ok(shop_list)) => view! {
                        <LocatedShops shops=shop_list user=user/>
                    }.into_any(),
                    Some(Err(err)) => {
                        leptos::logging::log!("Failed to load shop list: {}", err);
                        view! {
                            <ErrorView message="Failed to load the shop list." />
                        }.into_any()
                    }
                    None => view! {
                        <LoadingView message="Loading shops…" />
                    }.into_any(),
                }}
            </Suspense>
        </div>
    }
}

/// Map plus the distance-sorted shop list, once both the shop list and the
/// user's position are in. Selecting a shop snapshots the selection into
/// durable storage and moves on to the order page.
#[component]
fn LocatedShops(shops: Vec<Shop>, user: RwSignal<Option<UserLocation>>) -> impl IntoView {
    let navigate = use_navigate();

    view! {
        {move || match user.get() {
            Some(located) => {
                let entries = sort_by_distance(&shops, located.lat, located.lng);
                if entries.is_empty() {
                    view! {
                        <p class="shops-empty">"No shops available yet. Check back soon."</p>
                    }.into_any()
                } else {
                    let navigate = navigate.clone();
                    view! {
                        <div class="locator-results">
                            <LocatorMap user=located.clone() shops=shops.clone()/>
                            <div class="shop-list">
                                {entries.into_iter().map(|entry| {
                                    let navigate = navigate.clone();
                                    let selection = Selection {
                                        shop: entry.shop.clone(),
                                        user: located.clone(),
                                    };
                                    view! {
                                        <ShopCard entry=entry on_select=move || {
                                            storage::save_selection(&selection);
                                            navigate("/order", Default::default());
                                        }/>
                                    }
                                }).collect_view()}
                            </div>
                        </div>
                    }.into_any()
                }
            }
            None => view! {
                <LoadingView message="Waiting for your location…" />
            }.into_any(),
        }}
    }
}

#[cfg(feature = "hydrate")]
fn request_geolocation(user: RwSignal<Option<UserLocation>>, status: RwSignal<String>) {
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;

    let Some(window) = web_sys::window() else {
        return;
    };
    let geolocation = match window.navigator().geolocation() {
        Ok(geolocation) => geolocation,
        Err(_) => {
            status.set("Geolocation is not supported by this browser".to_string());
            return;
        }
    };

    let on_success = Closure::<dyn FnMut(web_sys::Position)>::new(move |position: web_sys::Position| {
        let coords = position.coords();
        let (lat, lng) = (coords.latitude(), coords.longitude());
        user.set(Some(UserLocation {
            lat,
            lng,
            address: None,
        }));
        status.set("Your location:".to_string());
        resolve_address(user, status, lat, lng);
    });
    let on_failure = Closure::<dyn FnMut(web_sys::PositionError)>::new(move |_: web_sys::PositionError| {
        status.set("Unable to get location".to_string());
    });

    let options = web_sys::PositionOptions::new();
    options.set_enable_high_accuracy(true);
    options.set_timeout(15_000);
    options.set_maximum_age(30_000);

    if geolocation
        .get_current_position_with_error_callback_and_options(
            on_success.as_ref().unchecked_ref(),
            Some(on_failure.as_ref().unchecked_ref()),
            &options,
        )
        .is_err()
    {
        status.set("Unable to get location".to_string());
    }

    on_success.forget();
    on_failure.forget();
}

/// Fills in the human-readable address for the located coordinates, going to
/// the network only on a session-cache miss. Geocoding failure is not fatal;
/// the status line just stays coordinate-only.
#[cfg(feature = "hydrate")]
fn resolve_address(
    user: RwSignal<Option<UserLocation>>,
    status: RwSignal<String>,
    lat: f64,
    lng: f64,
) {
    use leptos::task::spawn_local;

    use crate::server::reverse_geocode;

    if let Some(cached) = storage::cached_address(lat, lng) {
        user.update(|u| {
            if let Some(u) = u.as_mut() {
                u.address = Some(cached);
            }
        });
        return;
    }

    spawn_local(async move {
        match reverse_geocode(lat, lng).await {
            Ok(address) => {
                storage::cache_address(lat, lng, &address);
                user.update(|u| {
                    if let Some(u) = u.as_mut() {
                        u.address = Some(address);
                    }
                });
            }
            Err(err) => {
                leptos::logging::log!("Reverse geocoding failed: {}", err);
                status.set("Location detected".to_string());
            }
        }
    });
}
