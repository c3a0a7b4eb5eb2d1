use shared_types::Shop;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinate pairs, in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShopWithDistance {
    pub shop: Shop,
    pub distance_km: f64,
}

/// Annotates each shop with its distance from (lat, lng), nearest first.
pub fn sort_by_distance(shops: &[Shop], lat: f64, lng: f64) -> Vec<ShopWithDistance> {
    let mut entries: Vec<ShopWithDistance> = shops
        .iter()
        .cloned()
        .map(|shop| {
            let distance_km = haversine_km(lat, lng, shop.lat, shop.lng);
            ShopWithDistance { shop, distance_km }
        })
        .collect();
    entries.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop_at(name: &str, lat: f64, lng: f64) -> Shop {
        Shop {
            name: name.to_string(),
            address: String::new(),
            email: String::new(),
            lat,
            lng,
        }
    }

    #[test]
    fn haversine_matches_a_known_distance() {
        // Berlin to Paris is roughly 878 km
        let d = haversine_km(52.5200, 13.4050, 48.8566, 2.3522);
        assert!((d - 878.0).abs() < 5.0, "got {}", d);
    }

    #[test]
    fn haversine_of_identical_points_is_zero() {
        let d = haversine_km(37.9838, 23.7275, 37.9838, 23.7275);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn sorted_distances_are_non_decreasing() {
        let shops = vec![
            shop_at("far", 40.0, 10.0),
            shop_at("near", 38.0, 23.8),
            shop_at("mid", 39.0, 22.0),
            shop_at("same", 37.9838, 23.7275),
        ];
        let entries = sort_by_distance(&shops, 37.9838, 23.7275);
        assert_eq!(entries.first().map(|e| e.shop.name.as_str()), Some("same"));
        for pair in entries.windows(2) {
            assert!(pair[0].distance_km <= pair[1].distance_km);
        }
    }

    #[test]
    fn empty_shop_list_sorts_to_empty() {
        assert!(sort_by_distance(&[], 0.0, 0.0).is_empty());
    }
}
