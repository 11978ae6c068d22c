use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Event, HtmlButtonElement, HtmlCanvasElement,
    HtmlElement, HtmlImageElement, HtmlInputElement, HtmlTextAreaElement, PointerEvent, Window,
};

use inkpad_shared::{
    AnalyzeRequest, AnalyzeResponse, ConvertRequest, ConvertResponse, InputMode, LoadResponse,
    SaveRequest, SaveResponse,
};

use crate::app::debug_enabled;
use crate::dom::{
    alert, event_to_point, get_element, hide, report_error, set_busy, set_mode_buttons,
    set_tool_buttons, show, typeset_math,
};
use crate::net::{
    get_text, load_endpoint, parse_response, post_json, ANALYZE_ENDPOINT, CONVERT_ENDPOINT,
    SAVE_ENDPOINT,
};
use crate::state::{DragState, PadState, PendingAnalysis, Tool, DEFAULT_COLOR};
use crate::surface::{
    begin_stroke, clear, end_stroke, extend_stroke, paint_data_url, resize_canvas, snapshot,
};

fn apply_mode(
    state: &mut PadState,
    pad_wrap: &HtmlElement,
    scratch_text: &HtmlTextAreaElement,
    draw_button: &HtmlButtonElement,
    write_button: &HtmlButtonElement,
    mode: InputMode,
) {
    state.mode = mode;
    match mode {
        InputMode::Draw => {
            show(pad_wrap);
            hide(scratch_text);
        }
        InputMode::Write => {
            hide(pad_wrap);
            show(scratch_text);
        }
    }
    set_mode_buttons(draw_button, write_button, mode == InputMode::Draw);
}

fn render_analysis(
    window: &Window,
    analysis_result: &Element,
    analysis_image: &HtmlImageElement,
    response: &AnalyzeResponse,
) {
    analysis_result.set_inner_html(&response.analysis);
    typeset_math(window, analysis_result);
    match response.image.as_deref() {
        Some(encoded) => {
            analysis_image.set_src(&format!("data:image/jpeg;base64,{encoded}"));
            show(analysis_image);
        }
        None => hide(analysis_image),
    }
}

async fn convert_flow(
    window: Window,
    state: Rc<RefCell<PadState>>,
    scratch_text: HtmlTextAreaElement,
    output: HtmlTextAreaElement,
) -> Result<(), JsValue> {
    let (data, mode) = {
        let state = state.borrow();
        match state.mode {
            InputMode::Draw => {
                if !state.dirty {
                    return Err(JsValue::from_str("Draw something first"));
                }
                (snapshot(&state)?, InputMode::Draw)
            }
            InputMode::Write => {
                let text = scratch_text.value();
                if text.trim().is_empty() {
                    return Err(JsValue::from_str("Type something first"));
                }
                (text, InputMode::Write)
            }
        }
    };
    let request = ConvertRequest { data, mode };
    let text = post_json(&window, CONVERT_ENDPOINT, &request).await?;
    let response: ConvertResponse = parse_response(&text)?;
    output.set_value(&response.converted_text);
    Ok(())
}

async fn save_flow(
    window: Window,
    state: Rc<RefCell<PadState>>,
    pending_id: Rc<RefCell<PendingAnalysis>>,
) -> Result<(), JsValue> {
    let (image, epoch) = {
        let state = state.borrow();
        if !state.dirty {
            return Err(JsValue::from_str("Draw something first"));
        }
        (snapshot(&state)?, state.epoch)
    };
    let text = post_json(&window, SAVE_ENDPOINT, &SaveRequest { image }).await?;
    let response: SaveResponse = parse_response(&text)?;
    alert(
        &window,
        &format!("Drawing saved successfully. ID: {}", response.id),
    );
    pending_id.borrow_mut().record(response.id, epoch);
    Ok(())
}

async fn load_flow(
    window: Window,
    state: Rc<RefCell<PadState>>,
    drawing_id: String,
) -> Result<(), JsValue> {
    let text = get_text(&window, &load_endpoint(&drawing_id)).await?;
    let response: LoadResponse = parse_response(&text)?;
    paint_data_url(&state, &response.image)
}

/// Two-step analysis: persist a snapshot, then submit the returned id. The
/// second request is only issued after the first resolves, and a persisted id
/// is spent on a single analysis request. An id saved before the surface
/// changed is stale and a fresh snapshot is persisted instead.
async fn analyze_flow(
    window: Window,
    state: Rc<RefCell<PadState>>,
    pending_id: Rc<RefCell<PendingAnalysis>>,
    analysis_result: Element,
    analysis_image: HtmlImageElement,
) -> Result<(), JsValue> {
    let epoch = state.borrow().epoch;
    let taken = pending_id.borrow_mut().take_if_current(epoch);
    let drawing_id = match taken {
        Some(id) => id,
        None => {
            let image = {
                let state = state.borrow();
                if !state.dirty {
                    return Err(JsValue::from_str("Draw something first"));
                }
                snapshot(&state)?
            };
            let text = post_json(&window, SAVE_ENDPOINT, &SaveRequest { image }).await?;
            let response: SaveResponse = parse_response(&text)?;
            response.id
        }
    };
    let request = AnalyzeRequest { drawing_id };
    let text = post_json(&window, ANALYZE_ENDPOINT, &request).await?;
    let response: AnalyzeResponse = parse_response(&text)?;
    if let Some(error) = &response.error {
        return Err(JsValue::from_str(error));
    }
    render_analysis(&window, &analysis_result, &analysis_image, &response);
    Ok(())
}

pub fn init(window: &Window, document: &Document) -> Result<(), JsValue> {
    let canvas: HtmlCanvasElement = get_element(document, "pad")?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    let pad_wrap: HtmlElement = get_element(document, "padWrap")?;
    let scratch_text: HtmlTextAreaElement = get_element(document, "scratchText")?;
    let converted_text: HtmlTextAreaElement = get_element(document, "convertedText")?;
    let color_picker: HtmlInputElement = get_element(document, "colorPicker")?;
    let load_id: HtmlInputElement = get_element(document, "loadId")?;
    let pen_button: HtmlButtonElement = get_element(document, "pen")?;
    let eraser_button: HtmlButtonElement = get_element(document, "eraser")?;
    let clear_button: HtmlButtonElement = get_element(document, "clear")?;
    let convert_button: HtmlButtonElement = get_element(document, "convert")?;
    let save_button: HtmlButtonElement = get_element(document, "save")?;
    let load_button: HtmlButtonElement = get_element(document, "load")?;
    let analyze_button: HtmlButtonElement = get_element(document, "analyze")?;
    let draw_mode_button: HtmlButtonElement = get_element(document, "drawMode")?;
    let write_mode_button: HtmlButtonElement = get_element(document, "writeMode")?;
    let analysis_result: Element = get_element(document, "analysisResult")?;
    let analysis_image: HtmlImageElement = get_element(document, "analysisImage")?;

    let state = Rc::new(RefCell::new(PadState {
        canvas: canvas.clone(),
        ctx,
        tool: Tool::Pen,
        color: DEFAULT_COLOR.to_string(),
        mode: InputMode::Draw,
        drag: DragState::Idle,
        dirty: false,
        epoch: 0,
    }));
    let pending_id = Rc::new(RefCell::new(PendingAnalysis::default()));

    {
        let mut state = state.borrow_mut();
        resize_canvas(&mut state);
        set_tool_buttons(&pen_button, &eraser_button, state.tool);
        apply_mode(
            &mut state,
            &pad_wrap,
            &scratch_text,
            &draw_mode_button,
            &write_mode_button,
            InputMode::Draw,
        );
        hide(&analysis_image);
    }

    if !color_picker.value().is_empty() {
        state.borrow_mut().color = color_picker.value();
    }

    {
        let resize_state = state.clone();
        let onresize = Closure::<dyn FnMut()>::new(move || {
            let mut state = resize_state.borrow_mut();
            resize_canvas(&mut state);
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    {
        let down_state = state.clone();
        let down_canvas = canvas.clone();
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            if event.button() != 0 {
                return;
            }
            event.prevent_default();
            let Some((x, y)) = event_to_point(&down_canvas, &event) else {
                return;
            };
            let _ = down_canvas.set_pointer_capture(event.pointer_id());
            begin_stroke(&mut down_state.borrow_mut(), x, y);
        });
        canvas.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let move_state = state.clone();
        let move_canvas = canvas.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let Some((x, y)) = event_to_point(&move_canvas, &event) else {
                return;
            };
            extend_stroke(&mut move_state.borrow_mut(), x, y);
        });
        canvas.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    for event_name in ["pointerup", "pointercancel"] {
        let up_state = state.clone();
        let onup = Closure::<dyn FnMut(PointerEvent)>::new(move |_event: PointerEvent| {
            end_stroke(&mut up_state.borrow_mut());
        });
        canvas.add_event_listener_with_callback(event_name, onup.as_ref().unchecked_ref())?;
        onup.forget();
    }

    {
        let tool_state = state.clone();
        let pen_button_cb = pen_button.clone();
        let eraser_button_cb = eraser_button.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let mut state = tool_state.borrow_mut();
            state.tool = Tool::Pen;
            set_tool_buttons(&pen_button_cb, &eraser_button_cb, state.tool);
        });
        pen_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let tool_state = state.clone();
        let pen_button_cb = pen_button.clone();
        let eraser_button_cb = eraser_button.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let mut state = tool_state.borrow_mut();
            state.tool = Tool::Eraser;
            set_tool_buttons(&pen_button_cb, &eraser_button_cb, state.tool);
        });
        eraser_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let color_state = state.clone();
        let color_picker_cb = color_picker.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            color_state.borrow_mut().color = color_picker_cb.value();
        });
        color_picker.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let mode_state = state.clone();
        let pad_wrap_cb = pad_wrap.clone();
        let scratch_text_cb = scratch_text.clone();
        let draw_button_cb = draw_mode_button.clone();
        let write_button_cb = write_mode_button.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            apply_mode(
                &mut mode_state.borrow_mut(),
                &pad_wrap_cb,
                &scratch_text_cb,
                &draw_button_cb,
                &write_button_cb,
                InputMode::Draw,
            );
        });
        draw_mode_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let mode_state = state.clone();
        let pad_wrap_cb = pad_wrap.clone();
        let scratch_text_cb = scratch_text.clone();
        let draw_button_cb = draw_mode_button.clone();
        let write_button_cb = write_mode_button.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            apply_mode(
                &mut mode_state.borrow_mut(),
                &pad_wrap_cb,
                &scratch_text_cb,
                &draw_button_cb,
                &write_button_cb,
                InputMode::Write,
            );
        });
        write_mode_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let clear_state = state.clone();
        let converted_text_cb = converted_text.clone();
        let scratch_text_cb = scratch_text.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            clear(&mut clear_state.borrow_mut());
            converted_text_cb.set_value("");
            scratch_text_cb.set_value("");
        });
        clear_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let convert_state = state.clone();
        let convert_window = window.clone();
        let convert_button_cb = convert_button.clone();
        let scratch_text_cb = scratch_text.clone();
        let converted_text_cb = converted_text.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            if convert_button_cb.disabled() {
                return;
            }
            set_busy(&convert_button_cb, true, "Converting...", "Convert to Text");
            let window = convert_window.clone();
            let state = convert_state.clone();
            let scratch_text = scratch_text_cb.clone();
            let output = converted_text_cb.clone();
            let button = convert_button_cb.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = convert_flow(window.clone(), state, scratch_text, output).await;
                set_busy(&button, false, "Converting...", "Convert to Text");
                if let Err(error) = result {
                    report_error(&window, "Error converting input", error);
                }
            });
        });
        convert_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let save_state = state.clone();
        let save_window = window.clone();
        let pending_id_cb = pending_id.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let window = save_window.clone();
            let state = save_state.clone();
            let pending_id = pending_id_cb.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(error) = save_flow(window.clone(), state, pending_id).await {
                    report_error(&window, "Error saving drawing", error);
                }
            });
        });
        save_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let load_state = state.clone();
        let load_window = window.clone();
        let load_id_cb = load_id.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let drawing_id = load_id_cb.value().trim().to_string();
            if drawing_id.is_empty() {
                alert(&load_window, "Please enter a drawing ID");
                return;
            }
            let window = load_window.clone();
            let state = load_state.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(error) = load_flow(window.clone(), state, drawing_id).await {
                    report_error(&window, "Error loading drawing", error);
                }
            });
        });
        load_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let analyze_state = state.clone();
        let analyze_window = window.clone();
        let analyze_button_cb = analyze_button.clone();
        let pending_id_cb = pending_id.clone();
        let analysis_result_cb = analysis_result.clone();
        let analysis_image_cb = analysis_image.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            if analyze_button_cb.disabled() {
                return;
            }
            set_busy(&analyze_button_cb, true, "Analyzing...", "Analyze");
            let window = analyze_window.clone();
            let state = analyze_state.clone();
            let pending_id = pending_id_cb.clone();
            let analysis_result = analysis_result_cb.clone();
            let analysis_image = analysis_image_cb.clone();
            let button = analyze_button_cb.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = analyze_flow(
                    window.clone(),
                    state,
                    pending_id,
                    analysis_result,
                    analysis_image,
                )
                .await;
                set_busy(&button, false, "Analyzing...", "Analyze");
                if let Err(error) = result {
                    report_error(&window, "Error analyzing drawing", error);
                }
            });
        });
        analyze_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    if debug_enabled(window) {
        web_sys::console::log_1(&"Sketch page wired".into());
    }
    Ok(())
}
