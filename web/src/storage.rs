//! Browser storage plumbing: the durable selection handoff between the two
//! pages (localStorage) and the session-scoped reverse-geocode cache
//! (sessionStorage). Everything degrades to a no-op outside the browser.

use shared_types::Selection;

/// localStorage key carrying the shop selection from the locator to the order page.
const SELECTION_KEY: &str = "freeshop.selected_shop";

/// Reverse-geocode results are cached per session under a rounded-coordinate
/// key, so tiny GPS jitter still hits the cache.
pub fn geocode_cache_key(lat: f64, lng: f64) -> String {
    format!("revgeo:{:.4},{:.4}", lat, lng)
}

#[cfg(feature = "hydrate")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

#[cfg(feature = "hydrate")]
fn session_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.session_storage().ok().flatten())
}

pub fn save_selection(selection: &Selection) {
    #[cfg(feature = "hydrate")]
    {
        if let (Some(store), Ok(raw)) = (local_storage(), serde_json::to_string(selection)) {
            if store.set_item(SELECTION_KEY, &raw).is_err() {
                leptos::logging::log!("Failed to persist shop selection");
            }
        }
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = selection;
    }
}

/// Reads back the persisted selection. A missing or unparsable payload is
/// treated as "no selection" and the order page redirects home.
pub fn load_selection() -> Option<Selection> {
    #[cfg(feature = "hydrate")]
    {
        let raw = local_storage()?.get_item(SELECTION_KEY).ok()??;
        return serde_json::from_str(&raw).ok();
    }
    #[cfg(not(feature = "hydrate"))]
    {
        None
    }
}

pub fn cached_address(lat: f64, lng: f64) -> Option<String> {
    #[cfg(feature = "hydrate")]
    {
        return session_storage()?
            .get_item(&geocode_cache_key(lat, lng))
            .ok()?;
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (lat, lng);
        None
    }
}

pub fn cache_address(lat: f64, lng: f64, address: &str) {
    #[cfg(feature = "hydrate")]
    {
        if let Some(store) = session_storage() {
            let _ = store.set_item(&geocode_cache_key(lat, lng), address);
        }
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (lat, lng, address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_rounds_to_four_decimals() {
        assert_eq!(
            geocode_cache_key(47.6578118, -117.4186315),
            "revgeo:47.6578,-117.4186"
        );
    }

    #[test]
    fn nearby_coordinates_share_a_cache_key() {
        let a = geocode_cache_key(37.98380001, 23.72749999);
        let b = geocode_cache_key(37.98380004, 23.72750002);
        assert_eq!(a, b);
    }

    #[test]
    fn distant_coordinates_get_distinct_keys() {
        assert_ne!(
            geocode_cache_key(37.9838, 23.7275),
            geocode_cache_key(37.9848, 23.7275)
        );
    }
}
