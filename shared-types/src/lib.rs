use serde::{Deserialize, Serialize};

/// Images up to this size are sent as a direct email attachment.
pub const ATTACHMENT_LIMIT_BYTES: u64 = 30_000;

/// Byte budget for images uploaded to the external image host. Larger
/// images are recompressed down to this before upload.
pub const MAX_UPLOAD_BYTES: u64 = 1_000_000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Shop {
    pub name: String,
    pub address: String,
    pub email: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserLocation {
    pub lat: f64,
    pub lng: f64,
    pub address: Option<String>,
}

/// The shop+user snapshot handed from the locator page to the order page
/// through durable browser storage.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Selection {
    pub shop: Shop,
    pub user: UserLocation,
}

/// An inline image attachment: original filename plus base64-encoded content.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_b64: String,
}

/// Everything the mailer needs for one order submission. Either `items`
/// carries the typed list, or the image rides along as `image_url` (hosted)
/// or `attachment` (inline).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderRequest {
    pub shop_name: String,
    pub shop_email: String,
    pub shop_address: String,
    pub user_address: String,
    pub user_lat: f64,
    pub user_lng: f64,
    pub items: Option<String>,
    pub image_url: Option<String>,
    pub attachment: Option<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_selection() -> Selection {
        Selection {
            shop: Shop {
                name: "Community Free Shop".to_string(),
                address: "12 Harbour Street".to_string(),
                email: "orders@freeshop.example".to_string(),
                lat: 37.9755,
                lng: 23.7348,
            },
            user: UserLocation {
                lat: 37.9838,
                lng: 23.7275,
                address: Some("Athens, Greece".to_string()),
            },
        }
    }

    #[test]
    fn selection_round_trips_through_json() {
        let selection = sample_selection();
        let raw = serde_json::to_string(&selection).unwrap();
        let restored: Selection = serde_json::from_str(&raw).unwrap();
        assert_eq!(restored, selection);
    }

    #[test]
    fn selection_without_resolved_address_round_trips() {
        let mut selection = sample_selection();
        selection.user.address = None;
        let raw = serde_json::to_string(&selection).unwrap();
        let restored: Selection = serde_json::from_str(&raw).unwrap();
        assert_eq!(restored, selection);
    }

    #[test]
    fn stored_payload_fields_match_the_snapshot() {
        let selection = sample_selection();
        let raw = serde_json::to_string(&selection).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["shop"]["name"], "Community Free Shop");
        assert_eq!(value["shop"]["email"], "orders@freeshop.example");
        assert_eq!(value["shop"]["lat"], 37.9755);
        assert_eq!(value["user"]["lng"], 23.7275);
        assert_eq!(value["user"]["address"], "Athens, Greece");
    }
}
