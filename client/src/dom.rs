use js_sys::{Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement, HtmlCanvasElement, PointerEvent, Window};

use crate::state::Tool;

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn alert(window: &Window, message: &str) {
    let _ = window.alert_with_message(message);
}

/// One console trace plus one blocking alert; every failed flow funnels here.
pub fn report_error(window: &Window, context: &str, error: JsValue) {
    web_sys::console::error_2(&format!("{context} error").into(), &error);
    let detail = error
        .as_string()
        .unwrap_or_else(|| "Request failed".to_string());
    alert(window, &format!("{context}: {detail}"));
}

pub fn set_tool_buttons(
    pen_button: &HtmlButtonElement,
    eraser_button: &HtmlButtonElement,
    tool: Tool,
) {
    let (pen_class, eraser_class) = match tool {
        Tool::Pen => ("btn active", "btn"),
        Tool::Eraser => ("btn", "btn active"),
    };
    pen_button.set_class_name(pen_class);
    eraser_button.set_class_name(eraser_class);
    let pen_pressed = if tool == Tool::Pen { "true" } else { "false" };
    let eraser_pressed = if tool == Tool::Eraser { "true" } else { "false" };
    let _ = pen_button.set_attribute("aria-pressed", pen_pressed);
    let _ = eraser_button.set_attribute("aria-pressed", eraser_pressed);
}

pub fn set_mode_buttons(
    draw_button: &HtmlButtonElement,
    write_button: &HtmlButtonElement,
    draw_active: bool,
) {
    draw_button.set_class_name(if draw_active { "btn active" } else { "btn" });
    write_button.set_class_name(if draw_active { "btn" } else { "btn active" });
}

pub fn set_busy(button: &HtmlButtonElement, busy: bool, busy_label: &str, idle_label: &str) {
    button.set_disabled(busy);
    button.set_text_content(Some(if busy { busy_label } else { idle_label }));
    let _ = button.set_attribute("aria-busy", if busy { "true" } else { "false" });
}

pub fn show(element: &Element) {
    let _ = element.remove_attribute("hidden");
}

pub fn hide(element: &Element) {
    let _ = element.set_attribute("hidden", "");
}

/// Canvas-relative coordinates for a pointer event, or None while the canvas
/// has no layout box.
pub fn event_to_point(canvas: &HtmlCanvasElement, event: &PointerEvent) -> Option<(f64, f64)> {
    let rect = canvas.get_bounding_client_rect();
    relative_point(
        event.client_x() as f64,
        event.client_y() as f64,
        rect.left(),
        rect.top(),
        rect.width(),
        rect.height(),
    )
}

pub fn relative_point(
    client_x: f64,
    client_y: f64,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
) -> Option<(f64, f64)> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some((client_x - left, client_y - top))
}

/// Asks MathJax to re-typeset one element. The page may not ship MathJax at
/// all; silence is the correct outcome then.
pub fn typeset_math(window: &Window, element: &Element) {
    let Ok(mathjax) = Reflect::get(window.as_ref(), &JsValue::from_str("MathJax")) else {
        return;
    };
    if mathjax.is_undefined() || mathjax.is_null() {
        return;
    }
    let Ok(typeset) = Reflect::get(&mathjax, &JsValue::from_str("typesetPromise")) else {
        return;
    };
    let Ok(typeset) = typeset.dyn_into::<Function>() else {
        return;
    };
    let targets = js_sys::Array::of1(element.as_ref());
    if let Err(error) = typeset.call1(&mathjax, &targets) {
        web_sys::console::error_2(&"MathJax typeset failed".into(), &error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_point_offsets_by_rect_origin() {
        assert_eq!(
            relative_point(110.0, 45.0, 100.0, 40.0, 640.0, 480.0),
            Some((10.0, 5.0))
        );
    }

    #[test]
    fn relative_point_rejects_zero_sized_rect() {
        assert_eq!(relative_point(10.0, 10.0, 0.0, 0.0, 0.0, 480.0), None);
        assert_eq!(relative_point(10.0, 10.0, 0.0, 0.0, 640.0, 0.0), None);
    }
}
