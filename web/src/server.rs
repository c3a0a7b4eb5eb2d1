use leptos::prelude::*;
use leptos::server;
use shared_types::{OrderRequest, Shop};

#[cfg(feature = "ssr")]
use shared_types::MAX_UPLOAD_BYTES;

#[cfg(feature = "ssr")]
#[derive(serde::Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    display_name: String,
}

#[cfg(feature = "ssr")]
#[derive(serde::Deserialize)]
struct ImgbbResponse {
    data: Option<ImgbbData>,
}

#[cfg(feature = "ssr")]
#[derive(serde::Deserialize)]
struct ImgbbData {
    display_url: Option<String>,
    url: Option<String>,
    url_viewer: Option<String>,
}

#[cfg(feature = "ssr")]
fn env_or_err(name: &str) -> Result<String, ServerFnError> {
    std::env::var(name).map_err(|_| ServerFnError::new(format!("{} is not configured", name)))
}

/// The static shop list. cargo-leptos syncs `web/public` into the site root,
/// so the file is read relative to wherever the server was started from.
#[server]
pub async fn get_shops() -> Result<Vec<Shop>, ServerFnError> {
    let raw = std::fs::read_to_string("public/shops.json")
        .or_else(|_| std::fs::read_to_string("web/public/shops.json"))
        .map_err(|e| ServerFnError::new(format!("Failed to read shop list: {}", e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| ServerFnError::new(format!("Failed to parse shop list: {}", e)))
}

/// Translates coordinates into a display address via Nominatim. The client
/// keeps a session cache keyed by rounded coordinates, so this is only hit
/// on a cache miss.
#[server]
pub async fn reverse_geocode(lat: f64, lng: f64) -> Result<String, ServerFnError> {
    let contact = std::env::var("NOMINATIM_CONTACT_EMAIL").unwrap_or_default();
    let url = format!(
        "https://nominatim.openstreetmap.org/reverse?format=jsonv2&lat={}&lon={}&email={}",
        lat, lng, contact
    );

    let client = reqwest::Client::new();
    let response = client
        .get(&url)
        .header("Accept-Language", "en")
        .header("User-Agent", "freeshop")
        .send()
        .await
        .map_err(|e| ServerFnError::new(format!("Reverse geocoding request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(ServerFnError::new(format!(
            "Reverse geocoding failed with status {}",
            response.status()
        )));
    }

    let parsed: NominatimReverse = response
        .json()
        .await
        .map_err(|e| ServerFnError::new(format!("Failed to parse geocoding response: {}", e)))?;
    Ok(parsed.display_name)
}

/// Hosts an oversized order image externally and returns the public URL.
/// Images over the upload budget are recompressed down to it first.
#[server]
pub async fn upload_order_image(
    filename: String,
    image_b64: String,
) -> Result<String, ServerFnError> {
    use base64::Engine;

    let engine = base64::engine::general_purpose::STANDARD;
    let bytes = engine
        .decode(image_b64.as_bytes())
        .map_err(|e| ServerFnError::new(format!("Invalid image payload: {}", e)))?;

    let to_upload = if bytes.len() as u64 > MAX_UPLOAD_BYTES {
        tracing::debug!(
            "recompressing {} ({} bytes) to fit the upload budget",
            filename,
            bytes.len()
        );
        crate::imaging::compress_to_target(&bytes, MAX_UPLOAD_BYTES as usize, 1600, 1600)
            .map_err(|e| ServerFnError::new(format!("Failed to compress image: {}", e)))?
    } else {
        bytes
    };

    let api_key = env_or_err("IMGBB_API_KEY")?;
    let params = [("key", api_key), ("image", engine.encode(&to_upload))];

    let client = reqwest::Client::new();
    let response = client
        .post("https://api.imgbb.com/1/upload")
        .form(&params)
        .send()
        .await
        .map_err(|e| ServerFnError::new(format!("Image upload request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ServerFnError::new(format!(
            "Image upload failed ({}): {}",
            status, body
        )));
    }

    let parsed: ImgbbResponse = response
        .json()
        .await
        .map_err(|e| ServerFnError::new(format!("Failed to parse upload response: {}", e)))?;
    parsed
        .data
        .and_then(|data| data.display_url.or(data.url).or(data.url_viewer))
        .ok_or_else(|| ServerFnError::new("Image host returned no URL".to_string()))
}

/// Dispatches one order through the transactional email API. A non-success
/// response surfaces the HTTP status in the error message, which the client
/// uses to classify size-related failures for its one-shot retry.
#[server]
pub async fn send_order(req: OrderRequest) -> Result<(), ServerFnError> {
    use base64::Engine;

    let service_id = env_or_err("EMAILJS_SERVICE_ID")?;
    let template_id = env_or_err("EMAILJS_TEMPLATE_ID")?;
    let public_key = env_or_err("EMAILJS_PUBLIC_KEY")?;

    let mut form = reqwest::multipart::Form::new()
        .text("service_id", service_id)
        .text("template_id", template_id)
        .text("user_id", public_key)
        .text("shop_name", req.shop_name)
        .text("shop_email", req.shop_email)
        .text("shop_address", req.shop_address)
        .text("user_address", req.user_address)
        .text("user_lat", req.user_lat.to_string())
        .text("user_lng", req.user_lng.to_string())
        .text("items", req.items.unwrap_or_default())
        .text("image_url", req.image_url.unwrap_or_default());

    if let Some(attachment) = req.attachment {
        let engine = base64::engine::general_purpose::STANDARD;
        let bytes = engine
            .decode(attachment.content_b64.as_bytes())
            .map_err(|e| ServerFnError::new(format!("Invalid attachment payload: {}", e)))?;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(attachment.filename);
        form = form.part("image", part);
    }

    let client = reqwest::Client::new();
    let response = client
        .post("https://api.emailjs.com/api/v1.0/email/send-form")
        .multipart(form)
        .send()
        .await
        .map_err(|e| ServerFnError::new(format!("Email send request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("email dispatch rejected with status {}", status);
        return Err(ServerFnError::new(format!(
            "Email send failed ({}): {}",
            status, body
        )));
    }
    Ok(())
}
