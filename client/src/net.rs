use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Headers, Request, RequestInit, Response, Window};

pub const SAVE_ENDPOINT: &str = "/save";
pub const CONVERT_ENDPOINT: &str = "/convert";
pub const ANALYZE_ENDPOINT: &str = "/analyze";
pub const CAPTURE_ENDPOINT: &str = "/capture";

pub fn load_endpoint(drawing_id: &str) -> String {
    format!("/load/{drawing_id}")
}

async fn send(window: &Window, request: &Request) -> Result<String, JsValue> {
    let response_value = JsFuture::from(window.fetch_with_request(request)).await?;
    let response: Response = response_value.dyn_into()?;
    let text_value = JsFuture::from(response.text()?).await?;
    let text = text_value.as_string().unwrap_or_default();
    if !response.ok() {
        let message = if text.trim().is_empty() {
            format!("Request failed with status {}", response.status())
        } else {
            text
        };
        return Err(JsValue::from_str(&message));
    }
    Ok(text)
}

pub async fn post_json<T: Serialize>(
    window: &Window,
    url: &str,
    body: &T,
) -> Result<String, JsValue> {
    let payload = serde_json::to_string(body)
        .map_err(|error| JsValue::from_str(&format!("Failed to encode request: {error}")))?;
    let headers = Headers::new()?;
    headers.append("Content-Type", "application/json")?;
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(headers.as_ref());
    init.set_body(&JsValue::from_str(&payload));
    let request = Request::new_with_str_and_init(url, &init)?;
    send(window, &request).await
}

pub async fn post_form(window: &Window, url: &str, form: &FormData) -> Result<String, JsValue> {
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(form.as_ref());
    let request = Request::new_with_str_and_init(url, &init)?;
    send(window, &request).await
}

pub async fn get_text(window: &Window, url: &str) -> Result<String, JsValue> {
    let init = RequestInit::new();
    init.set_method("GET");
    let request = Request::new_with_str_and_init(url, &init)?;
    send(window, &request).await
}

pub fn parse_response<R: DeserializeOwned>(text: &str) -> Result<R, JsValue> {
    serde_json::from_str(text)
        .map_err(|error| JsValue::from_str(&format!("Invalid server response: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_endpoint_embeds_the_id() {
        assert_eq!(
            load_endpoint("67e55044-10b1-426f-9247-bb680e5fe0c8"),
            "/load/67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
    }
}
