use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use crate::state::{stroke_paint, DragState, PadState, BACKGROUND_COLOR};

/// Canvas height follows its CSS width at a 4:3 aspect.
pub fn canvas_height_for_width(width: u32) -> u32 {
    width * 3 / 4
}

pub fn resize_canvas(state: &mut PadState) {
    let width = state.canvas.offset_width().max(0) as u32;
    state.canvas.set_width(width);
    state.canvas.set_height(canvas_height_for_width(width));
    state.ctx.set_line_cap("round");
    fill_background(state);
    // Resizing the backing store wipes the raster; the surface is blank again.
    state.dirty = false;
    state.epoch += 1;
}

pub fn fill_background(state: &PadState) {
    state.ctx.set_fill_style_str(BACKGROUND_COLOR);
    state.ctx.fill_rect(
        0.0,
        0.0,
        state.canvas.width() as f64,
        state.canvas.height() as f64,
    );
}

pub fn clear(state: &mut PadState) {
    state.ctx.clear_rect(
        0.0,
        0.0,
        state.canvas.width() as f64,
        state.canvas.height() as f64,
    );
    fill_background(state);
    state.drag = DragState::Idle;
    state.dirty = false;
    state.epoch += 1;
}

pub fn begin_stroke(state: &mut PadState, x: f64, y: f64) {
    state.drag = DragState::Drawing { last_x: x, last_y: y };
}

/// Rasterize the segment from the last sampled point to this one, so the
/// stroke path passes through every sampled point in order.
pub fn extend_stroke(state: &mut PadState, x: f64, y: f64) {
    let DragState::Drawing { last_x, last_y } = state.drag else {
        return;
    };
    let (color, width) = stroke_paint(state.tool, &state.color);
    state.ctx.begin_path();
    state.ctx.move_to(last_x, last_y);
    state.ctx.line_to(x, y);
    state.ctx.set_stroke_style_str(&color);
    state.ctx.set_line_width(width);
    state.ctx.stroke();
    state.drag = DragState::Drawing { last_x: x, last_y: y };
    state.dirty = true;
    state.epoch += 1;
}

pub fn end_stroke(state: &mut PadState) {
    state.drag = DragState::Idle;
}

/// Base64 PNG export of the whole surface.
pub fn snapshot(state: &PadState) -> Result<String, JsValue> {
    state.canvas.to_data_url_with_type("image/png")
}

/// Paint a previously exported data URL onto a cleared surface. Decoding is
/// asynchronous; the draw happens in the image's onload callback.
pub fn paint_data_url(state: &Rc<RefCell<PadState>>, image_src: &str) -> Result<(), JsValue> {
    let image = HtmlImageElement::new()?;
    let onload_state = state.clone();
    let onload_image = image.clone();
    let onload = Closure::once_into_js(move || {
        let mut state = onload_state.borrow_mut();
        clear(&mut state);
        if let Err(error) = state
            .ctx
            .draw_image_with_html_image_element(&onload_image, 0.0, 0.0)
        {
            web_sys::console::error_2(&"Failed to paint loaded drawing".into(), &error);
            return;
        }
        state.dirty = true;
        state.epoch += 1;
    });
    image.set_onload(Some(onload.unchecked_ref()));
    image.set_src(image_src);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_keeps_four_three_aspect() {
        assert_eq!(canvas_height_for_width(800), 600);
        assert_eq!(canvas_height_for_width(0), 0);
    }
}
