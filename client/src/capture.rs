use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobEvent, BlobPropertyBag, CanvasRenderingContext2d, Document, Element, Event,
    FormData, HtmlAudioElement, HtmlButtonElement, HtmlCanvasElement, HtmlImageElement,
    HtmlVideoElement, MediaRecorder, MediaStream, MediaStreamConstraints, Window,
};

use inkpad_shared::CaptureResponse;

use crate::dom::{alert, get_element, hide, report_error, set_busy, show, typeset_math};
use crate::net::{parse_response, post_form, CAPTURE_ENDPOINT};
use crate::state::RECORDING_MS;

async fn init_media(
    window: &Window,
    video: &HtmlVideoElement,
    chunks: &Rc<RefCell<Vec<Blob>>>,
) -> Result<MediaRecorder, JsValue> {
    let media_devices = window.navigator().media_devices()?;
    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&JsValue::TRUE);
    constraints.set_audio(&JsValue::TRUE);
    let promise = media_devices.get_user_media_with_constraints(&constraints)?;
    let stream: MediaStream = JsFuture::from(promise).await?.dyn_into()?;
    video.set_src_object(Some(&stream));

    let recorder = MediaRecorder::new_with_media_stream(&stream)?;
    let chunk_sink = chunks.clone();
    let ondata = Closure::<dyn FnMut(BlobEvent)>::new(move |event: BlobEvent| {
        if let Some(blob) = event.data() {
            if blob.size() > 0.0 {
                chunk_sink.borrow_mut().push(blob);
            }
        }
    });
    recorder.set_ondataavailable(Some(ondata.as_ref().unchecked_ref()));
    ondata.forget();
    Ok(recorder)
}

/// Grab one video frame and fold it together with the recorded audio into
/// the multipart payload. Runs synchronously at the moment recording stops.
fn assemble_capture(
    chunks: &Rc<RefCell<Vec<Blob>>>,
    video: &HtmlVideoElement,
    canvas: &HtmlCanvasElement,
    ctx: &CanvasRenderingContext2d,
    captured_image: &HtmlImageElement,
) -> Result<FormData, JsValue> {
    let audio_parts = js_sys::Array::new();
    for blob in chunks.borrow_mut().drain(..) {
        audio_parts.push(blob.as_ref());
    }
    let bag = BlobPropertyBag::new();
    bag.set_type("audio/mp3");
    let audio_blob = Blob::new_with_blob_sequence_and_options(audio_parts.as_ref(), &bag)?;

    let width = video.video_width();
    let height = video.video_height();
    canvas.set_width(width);
    canvas.set_height(height);
    ctx.draw_image_with_html_video_element_and_dw_and_dh(
        video,
        0.0,
        0.0,
        width as f64,
        height as f64,
    )?;
    let image = canvas.to_data_url_with_type("image/jpeg")?;
    captured_image.set_src(&image);
    show(captured_image);

    let form = FormData::new()?;
    form.append_with_str("image", &image)?;
    form.append_with_blob_and_filename("audio", &audio_blob, "audio.mp3")?;
    Ok(form)
}

async fn submit_capture(
    window: Window,
    form: FormData,
    analyzed_result: Element,
    analyzed_image: HtmlImageElement,
) -> Result<(), JsValue> {
    let text = post_form(&window, CAPTURE_ENDPOINT, &form).await?;
    let response: CaptureResponse = parse_response(&text)?;
    if let Some(error) = &response.error {
        return Err(JsValue::from_str(error));
    }
    analyzed_result.set_inner_html(&response.analysis);
    typeset_math(&window, &analyzed_result);
    match response.image.as_deref() {
        Some(encoded) => {
            analyzed_image.set_src(&format!("data:image/jpeg;base64,{encoded}"));
            show(&analyzed_image);
        }
        None => hide(&analyzed_image),
    }
    if let Some(url) = &response.speech_url {
        let audio = HtmlAudioElement::new_with_src(url)?;
        match audio.play() {
            Ok(promise) => {
                if let Err(error) = JsFuture::from(promise).await {
                    web_sys::console::error_2(&"Audio playback failed".into(), &error);
                }
            }
            Err(error) => {
                web_sys::console::error_2(&"Audio playback failed".into(), &error);
            }
        }
    }
    Ok(())
}

pub fn init(window: &Window, document: &Document) -> Result<(), JsValue> {
    let video: HtmlVideoElement = get_element(document, "webcam")?;
    let capture_button: HtmlButtonElement = get_element(document, "capture")?;
    let snapshot_canvas: HtmlCanvasElement = get_element(document, "snapshotCanvas")?;
    let ctx = snapshot_canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    let captured_image: HtmlImageElement = get_element(document, "capturedImage")?;
    let analyzed_result: Element = get_element(document, "analyzedResult")?;
    let analyzed_image: HtmlImageElement = get_element(document, "analyzedImage")?;
    hide(&captured_image);
    hide(&analyzed_image);

    let recorder: Rc<RefCell<Option<MediaRecorder>>> = Rc::new(RefCell::new(None));
    let chunks: Rc<RefCell<Vec<Blob>>> = Rc::new(RefCell::new(Vec::new()));

    {
        let media_window = window.clone();
        let media_video = video.clone();
        let media_chunks = chunks.clone();
        let recorder_slot = recorder.clone();
        let onstop_window = window.clone();
        let onstop_chunks = chunks.clone();
        let onstop_video = video.clone();
        let onstop_canvas = snapshot_canvas.clone();
        let onstop_ctx = ctx.clone();
        let onstop_captured = captured_image.clone();
        let onstop_result = analyzed_result.clone();
        let onstop_image = analyzed_image.clone();
        let onstop_button = capture_button.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let recorder = match init_media(&media_window, &media_video, &media_chunks).await {
                Ok(recorder) => recorder,
                Err(error) => {
                    // Denied permission: no recording and no submission ever
                    // happens because the recorder slot stays empty.
                    report_error(
                        &onstop_window,
                        "Webcam and microphone access are required",
                        error,
                    );
                    return;
                }
            };
            let onstop = Closure::<dyn FnMut(Event)>::new(move |_| {
                let form = match assemble_capture(
                    &onstop_chunks,
                    &onstop_video,
                    &onstop_canvas,
                    &onstop_ctx,
                    &onstop_captured,
                ) {
                    Ok(form) => form,
                    Err(error) => {
                        set_busy(&onstop_button, false, "Recording...", "Capture");
                        report_error(&onstop_window, "Error capturing image and audio", error);
                        return;
                    }
                };
                let window = onstop_window.clone();
                let analyzed_result = onstop_result.clone();
                let analyzed_image = onstop_image.clone();
                let button = onstop_button.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let result =
                        submit_capture(window.clone(), form, analyzed_result, analyzed_image)
                            .await;
                    set_busy(&button, false, "Recording...", "Capture");
                    if let Err(error) = result {
                        report_error(&window, "Error processing image and audio", error);
                    }
                });
            });
            recorder.set_onstop(Some(onstop.as_ref().unchecked_ref()));
            onstop.forget();
            *recorder_slot.borrow_mut() = Some(recorder);
        });
    }

    {
        let click_window = window.clone();
        let click_recorder = recorder.clone();
        let click_chunks = chunks.clone();
        let capture_button_cb = capture_button.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            if capture_button_cb.disabled() {
                return;
            }
            let recorder_ref = click_recorder.borrow();
            let Some(recorder) = recorder_ref.as_ref() else {
                alert(&click_window, "Webcam and microphone access are required.");
                return;
            };
            click_chunks.borrow_mut().clear();
            if let Err(error) = recorder.start() {
                report_error(&click_window, "Error starting audio recording", error);
                return;
            }
            set_busy(&capture_button_cb, true, "Recording...", "Capture");

            // Recording runs for a fixed window; the frame grab and the
            // upload happen in the recorder's onstop handler.
            let stop_recorder = recorder.clone();
            let stop_cb = Closure::once_into_js(move || {
                if let Err(error) = stop_recorder.stop() {
                    web_sys::console::error_2(&"Failed to stop recording".into(), &error);
                }
            });
            let _ = click_window.set_timeout_with_callback_and_timeout_and_arguments_0(
                stop_cb.unchecked_ref(),
                RECORDING_MS,
            );
        });
        capture_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    Ok(())
}
