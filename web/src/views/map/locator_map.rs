use leptos::prelude::*;
use leptos_leaflet::prelude::*;
use shared_types::{Shop, UserLocation};
use thaw::{Label, LabelSize};

/// Leaflet map centered on the user, with one marker for them and one per shop.
#[component]
pub fn LocatorMap(user: UserLocation, shops: Vec<Shop>) -> impl IntoView {
    view! {
        <MapContainer
            style="height: 45vh; width: 100%"
            center=Position::new(user.lat, user.lng)
            zoom=14.0
            set_view=true
        >
            <TileLayer
                url="https://tile.openstreetmap.org/{z}/{x}/{y}.png"
                attribution="&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
            />

            <Marker position=Position::new(user.lat, user.lng) draggable=false>
                <Popup>
                    <Label size=LabelSize::Large>"You are here"</Label>
                </Popup>
            </Marker>

            {shops.into_iter().map(|shop| {
                view! {
                    <Marker position=Position::new(shop.lat, shop.lng) draggable=false>
                        <Popup>
                            <Label size=LabelSize::Large>{shop.name.clone()}</Label>
                            <p>{format!("Address: {}", shop.address)}</p>
                        </Popup>
                    </Marker>
                }
            }).collect_view()}
        </MapContainer>
    }
}
