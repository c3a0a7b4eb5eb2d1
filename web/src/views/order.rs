use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;
use shared_types::{Attachment, OrderRequest, Selection, ATTACHMENT_LIMIT_BYTES};
use thaw::{Input, MessageBar, MessageBarIntent, Textarea};

use crate::{components::ErrorView, server::send_order, storage};

/// How the customer describes their list: typed items or an attached photo.
/// Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderMode {
    Text,
    Image,
}

/// An image the customer picked, read client-side and held until submit.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedImage {
    pub filename: String,
    pub content_b64: String,
    pub size_bytes: u64,
}

/// Content check before anything goes on the wire. Image mode passes with
/// either a staged file or an already-hosted URL; text mode needs items.
pub fn validate_content(
    mode: OrderMode,
    has_attachment: bool,
    has_image_url: bool,
    items: &str,
) -> Result<(), &'static str> {
    match mode {
        OrderMode::Image if !has_attachment && !has_image_url => {
            Err("Please attach an image of your list.")
        }
        OrderMode::Text if items.trim().is_empty() => Err("Please type your items."),
        _ => Ok(()),
    }
}

/// Whether a send failure looks like the payload was too large for the mailer.
pub fn is_size_failure(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    message.contains("413")
        || message.contains("422")
        || lowered.contains("content too large")
        || lowered.contains("unprocessable")
}

/// The one-shot fallback: resend without the image, but only on a size-class
/// failure, only when an attachment actually rode along, and only once.
pub fn should_retry_without_image(
    message: &str,
    has_attachment: bool,
    already_retried: bool,
) -> bool {
    !already_retried && has_attachment && is_size_failure(message)
}

/// Retry payload for the size-failure fallback: same order, image dropped.
pub fn strip_image(request: &OrderRequest) -> OrderRequest {
    OrderRequest {
        attachment: None,
        image_url: None,
        ..request.clone()
    }
}

#[component]
pub fn OrderPage() -> impl IntoView {
    let navigate = use_navigate();
    let selection = RwSignal::new(None::<Selection>);

    let mode = RwSignal::new(OrderMode::Text);
    let items = RwSignal::new(String::new());
    let user_address = RwSignal::new(String::new());
    let staged = RwSignal::new(None::<StagedImage>);
    let hosted_url = RwSignal::new(None::<String>);
    let status = RwSignal::new(None::<String>);
    let error = RwSignal::new(None::<String>);
    let confirmation = RwSignal::new(None::<String>);
    let is_sending = RwSignal::new(false);

    // The selection handoff is the only way in; anyone landing here without
    // one goes back to the locator.
    Effect::new(move |_| match storage::load_selection() {
        Some(found) => {
            user_address.set(found.user.address.clone().unwrap_or_default());
            selection.set(Some(found));
        }
        None => navigate("/", Default::default()),
    });

    // Switching to text mode discards any staged image, so the inactive
    // field never constrains the active one.
    let set_mode = move |next: OrderMode| {
        mode.set(next);
        if next == OrderMode::Text {
            staged.set(None);
        }
    };

    let on_file_change = move |ev: web_sys::Event| {
        #[cfg(feature = "hydrate")]
        stage_file(&ev, staged, error);
        #[cfg(not(feature = "hydrate"))]
        let _ = ev;
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if is_sending.get_untracked() {
            return;
        }
        let Some(current) = selection.get_untracked() else {
            return;
        };

        error.set(None);
        confirmation.set(None);
        is_sending.set(true);
        status.set(Some("Sending…".to_string()));

        let current_mode = mode.get_untracked();
        let items_text = items.get_untracked();
        let address = user_address.get_untracked();

        spawn_local(async move {
            let outcome = submit_order(
                current,
                current_mode,
                items_text,
                address,
                staged,
                hosted_url,
                status,
            )
            .await;
            is_sending.set(false);
            status.set(None);
            match outcome {
                Ok(retried_without_image) => {
                    confirmation.set(Some(if retried_without_image {
                        "Order submitted without the image (it was too large). The shop will contact you soon."
                            .to_string()
                    } else {
                        "Order submitted successfully! The shop will contact you soon.".to_string()
                    }));
                    items.set(String::new());
                    staged.set(None);
                    hosted_url.set(None);
                    mode.set(OrderMode::Text);
                }
                Err(message) => error.set(Some(message)),
            }
        });
    };

    view! {
        <div class="order-page">
            {move || match selection.get() {
                Some(chosen) => view! {
                    <div class="order-shop-header">
                        <h1>"Order from " {chosen.shop.name.clone()}</h1>
                        <p class="order-shop-address">{chosen.shop.address.clone()}</p>
                    </div>
                }.into_any(),
                None => view! {
                    <p class="order-redirect">"No shop selected. Taking you back…"</p>
                }.into_any(),
            }}

            <form class="order-form" on:submit=on_submit>
                <div class="form-group">
                    <label for="user-address">"Your address"</label>
                    <Input id="user-address" placeholder="Street, number, city" value=user_address/>
                </div>

                <div class="form-group mode-toggle">
                    <label class="mode-option">
                        <input
                            type="radio"
                            name="input-mode"
                            prop:checked=move || mode.get() == OrderMode::Text
                            on:change=move |_| set_mode(OrderMode::Text)
                        />
                        "Type my items"
                    </label>
                    <label class="mode-option">
                        <input
                            type="radio"
                            name="input-mode"
                            prop:checked=move || mode.get() == OrderMode::Image
                            on:change=move |_| set_mode(OrderMode::Image)
                        />
                        "Attach a photo of my list"
                    </label>
                </div>

                <div
                    class="form-group"
                    style:display=move || visible_when(mode.get() == OrderMode::Text)
                >
                    <label for="items">"Items"</label>
                    <Textarea id="items" placeholder="1 kg rice, 2 cans of beans…" value=items/>
                </div>

                <div
                    class="form-group"
                    style:display=move || visible_when(mode.get() == OrderMode::Image)
                >
                    <label for="image">"Photo of your list"</label>
                    <input id="image" type="file" accept="image/*" on:change=on_file_change/>
                    {move || staged.get().map(|image| view! {
                        <p class="staged-image-note">
                            {format!("{} ({} KB)", image.filename, image.size_bytes / 1024)}
                        </p>
                    })}
                </div>

                {move || status.get().map(|text| view! { <p class="form-status">{text}</p> })}
                {move || error.get().map(|message| view! { <ErrorView message=message/> })}
                {move || confirmation.get().map(|message| view! {
                    <MessageBar intent=MessageBarIntent::Success>{message}</MessageBar>
                })}

                <button class="submit-button" type="submit" disabled=move || is_sending.get()>
                    {move || if is_sending.get() { "Sending…" } else { "Submit order" }}
                </button>
            </form>
        </div>
    }
}

fn visible_when(show: bool) -> &'static str {
    if show {
        ""
    } else {
        "none"
    }
}

/// One submission attempt, start to finish: decide attachment vs hosted URL,
/// validate, send, and apply the single image-stripping retry on a
/// size-class failure. Returns whether the retry path was taken.
async fn submit_order(
    selection: Selection,
    mode: OrderMode,
    items: String,
    user_address: String,
    staged: RwSignal<Option<StagedImage>>,
    hosted_url: RwSignal<Option<String>>,
    status: RwSignal<Option<String>>,
) -> Result<bool, String> {
    use crate::server::upload_order_image;

    let mut attachment = None;

    if let Some(image) = staged.get_untracked() {
        if image.size_bytes > ATTACHMENT_LIMIT_BYTES {
            // Too big to attach: host it externally and send the URL instead.
            // The staged file is dropped so a resubmit reuses the hosted URL.
            status.set(Some("Uploading image…".to_string()));
            let url = upload_order_image(image.filename, image.content_b64)
                .await
                .map_err(|err| format!("Image upload failed: {}", err))?;
            hosted_url.set(Some(url));
            staged.set(None);
        } else {
            hosted_url.set(None);
            attachment = Some(Attachment {
                filename: image.filename,
                content_b64: image.content_b64,
            });
        }
    }

    let image_url = hosted_url.get_untracked();
    validate_content(mode, attachment.is_some(), image_url.is_some(), &items)
        .map_err(str::to_string)?;

    let request = OrderRequest {
        shop_name: selection.shop.name,
        shop_email: selection.shop.email,
        shop_address: selection.shop.address,
        user_address,
        user_lat: selection.user.lat,
        user_lng: selection.user.lng,
        items: (!items.trim().is_empty()).then(|| items.clone()),
        image_url,
        attachment,
    };

    status.set(Some("Sending…".to_string()));
    match send_order(request.clone()).await {
        Ok(()) => Ok(false),
        Err(err) => {
            let message = err.to_string();
            leptos::logging::log!("Email send failed: {}", message);
            if should_retry_without_image(&message, request.attachment.is_some(), false) {
                status.set(Some("Your image was too large; sending without it…".to_string()));
                send_order(strip_image(&request))
                    .await
                    .map_err(|err| format!("Failed to send order: {}", err))?;
                Ok(true)
            } else {
                Err(format!("Failed to send order: {}", message))
            }
        }
    }
}

#[cfg(feature = "hydrate")]
fn stage_file(
    ev: &web_sys::Event,
    staged: RwSignal<Option<StagedImage>>,
    error: RwSignal<Option<String>>,
) {
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;

    let Some(input) = ev
        .target()
        .and_then(|target| target.dyn_into::<web_sys::HtmlInputElement>().ok())
    else {
        return;
    };
    let Some(file) = input.files().and_then(|files| files.get(0)) else {
        staged.set(None);
        return;
    };

    let filename = file.name();
    let size_bytes = file.size() as u64;
    let reader = match web_sys::FileReader::new() {
        Ok(reader) => reader,
        Err(_) => {
            error.set(Some("Could not read the selected file.".to_string()));
            return;
        }
    };

    let reader_for_load = reader.clone();
    let on_load = Closure::<dyn FnMut(web_sys::ProgressEvent)>::new(move |_| {
        let Ok(result) = reader_for_load.result() else {
            return;
        };
        let Some(data_url) = result.as_string() else {
            return;
        };
        // data:<mime>;base64,<payload>
        let content_b64 = data_url
            .split_once(',')
            .map(|(_, payload)| payload.to_string())
            .unwrap_or(data_url);
        staged.set(Some(StagedImage {
            filename: filename.clone(),
            content_b64,
            size_bytes,
        }));
    });
    reader.set_onload(Some(on_load.as_ref().unchecked_ref()));
    on_load.forget();

    if reader.read_as_data_url(&file).is_err() {
        error.set(Some("Could not read the selected file.".to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_attachment() -> OrderRequest {
        OrderRequest {
            shop_name: "Community Free Shop".to_string(),
            shop_email: "orders@freeshop.example".to_string(),
            shop_address: "12 Harbour Street".to_string(),
            user_address: "34 Hill Road".to_string(),
            user_lat: 37.9838,
            user_lng: 23.7275,
            items: None,
            image_url: None,
            attachment: Some(Attachment {
                filename: "list.jpg".to_string(),
                content_b64: "aGVsbG8=".to_string(),
            }),
        }
    }

    #[test]
    fn text_mode_requires_items() {
        assert!(validate_content(OrderMode::Text, false, false, "").is_err());
        assert!(validate_content(OrderMode::Text, false, false, "   ").is_err());
        assert!(validate_content(OrderMode::Text, false, false, "rice").is_ok());
    }

    #[test]
    fn text_mode_ignores_missing_image() {
        // The inactive field carries no required constraint.
        assert!(validate_content(OrderMode::Text, false, false, "rice").is_ok());
    }

    #[test]
    fn image_mode_requires_some_image_but_not_items() {
        assert!(validate_content(OrderMode::Image, false, false, "").is_err());
        assert!(validate_content(OrderMode::Image, true, false, "").is_ok());
        assert!(validate_content(OrderMode::Image, false, true, "").is_ok());
    }

    #[test]
    fn size_failures_are_recognized() {
        assert!(is_size_failure("Email send failed (413 Payload Too Large): nope"));
        assert!(is_size_failure("Email send failed (422 Unprocessable Entity): nope"));
        assert!(is_size_failure("Content Too Large"));
        assert!(!is_size_failure("Email send failed (500 Internal Server Error): boom"));
        assert!(!is_size_failure("connection refused"));
    }

    #[test]
    fn retry_fires_once_and_only_with_an_attachment() {
        let message = "Email send failed (413 Payload Too Large): nope";
        assert!(should_retry_without_image(message, true, false));
        // no attachment rode along
        assert!(!should_retry_without_image(message, false, false));
        // already retried
        assert!(!should_retry_without_image(message, true, true));
        // not a size failure
        assert!(!should_retry_without_image("boom", true, false));
    }

    #[test]
    fn stripped_retry_payload_has_no_image_fields() {
        let request = request_with_attachment();
        let retry = strip_image(&request);
        assert!(retry.attachment.is_none());
        assert!(retry.image_url.is_none());
        assert_eq!(retry.shop_name, request.shop_name);
        assert_eq!(retry.user_address, request.user_address);
        assert_eq!(retry.items, request.items);
    }
}
