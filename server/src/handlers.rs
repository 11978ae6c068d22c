use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use inkpad_shared::snapshot_format::SnapshotFileData;
use inkpad_shared::{
    is_image_data_url, AnalyzeRequest, AnalyzeResponse, ConvertRequest, InputMode, LoadResponse,
    SaveRequest, SaveResponse,
};

use crate::drawings::{new_drawing_id, normalize_drawing_id};
use crate::state::AppState;

pub async fn save_handler(
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> Response {
    if !is_image_data_url(&request.image) {
        return (StatusCode::BAD_REQUEST, "Expected an image data URL").into_response();
    }
    let drawing_id = new_drawing_id();
    let data = SnapshotFileData {
        image: request.image,
    };
    if let Err(error) = state.storage.save_snapshot(&drawing_id, &data).await {
        eprintln!("save failed id={drawing_id} error={error}");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save drawing").into_response();
    }
    eprintln!("saved drawing id={drawing_id} bytes={}", data.image.len());
    Json(SaveResponse {
        message: "Drawing saved successfully".to_string(),
        id: drawing_id,
    })
    .into_response()
}

pub async fn load_handler(
    Path(drawing_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let drawing_id = match normalize_drawing_id(&drawing_id) {
        Some(id) => id,
        None => return StatusCode::NOT_FOUND.into_response(),
    };
    match state.storage.load_snapshot(&drawing_id).await {
        Ok(data) => Json(LoadResponse { image: data.image }).into_response(),
        Err(error) => {
            eprintln!("load failed id={drawing_id} error={error}");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

pub async fn convert_handler(
    State(state): State<AppState>,
    Json(request): Json<ConvertRequest>,
) -> Response {
    match request.mode {
        InputMode::Draw => {
            if !is_image_data_url(&request.data) {
                return (StatusCode::BAD_REQUEST, "Expected an image data URL").into_response();
            }
        }
        InputMode::Write => {
            if request.data.trim().is_empty() {
                return (StatusCode::BAD_REQUEST, "Nothing to convert").into_response();
            }
        }
    }
    match state.analyzer.convert(&request).await {
        Ok(converted) => Json(converted).into_response(),
        Err(error) => {
            eprintln!("convert relay failed error={error}");
            (StatusCode::BAD_GATEWAY, error).into_response()
        }
    }
}

pub async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    let drawing_id = match normalize_drawing_id(&request.drawing_id) {
        Some(id) => id,
        None => {
            // Unknown id is a logical error, reported in-band like the
            // analysis service's own error field.
            return Json(AnalyzeResponse {
                error: Some(format!("Unknown drawing id: {}", request.drawing_id)),
                ..AnalyzeResponse::default()
            })
            .into_response();
        }
    };
    let snapshot = match state.storage.load_snapshot(&drawing_id).await {
        Ok(data) => data,
        Err(error) => {
            eprintln!("analyze load failed id={drawing_id} error={error}");
            return Json(AnalyzeResponse {
                error: Some(format!("Unknown drawing id: {drawing_id}")),
                ..AnalyzeResponse::default()
            })
            .into_response();
        }
    };
    match state.analyzer.analyze(&snapshot.image).await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(error) => {
            eprintln!("analyze relay failed id={drawing_id} error={error}");
            (StatusCode::BAD_GATEWAY, error).into_response()
        }
    }
}

pub async fn capture_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut image: Option<String> = None;
    let mut audio: Option<(Vec<u8>, String)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => {
                eprintln!("capture multipart error={error}");
                return (StatusCode::BAD_REQUEST, "Malformed form data").into_response();
            }
        };
        let name = field.name().map(|name| name.to_string());
        match name.as_deref() {
            Some("image") => match field.text().await {
                Ok(text) => image = Some(text),
                Err(error) => {
                    eprintln!("capture image field error={error}");
                    return (StatusCode::BAD_REQUEST, "Malformed image field").into_response();
                }
            },
            Some("audio") => {
                let filename = field
                    .file_name()
                    .unwrap_or("audio.mp3")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => audio = Some((bytes.to_vec(), filename)),
                    Err(error) => {
                        eprintln!("capture audio field error={error}");
                        return (StatusCode::BAD_REQUEST, "Malformed audio field").into_response();
                    }
                }
            }
            _ => {}
        }
    }

    let Some(image) = image else {
        return (StatusCode::BAD_REQUEST, "Missing image field").into_response();
    };
    if !is_image_data_url(&image) {
        return (StatusCode::BAD_REQUEST, "Expected an image data URL").into_response();
    }
    let Some((audio, audio_filename)) = audio else {
        return (StatusCode::BAD_REQUEST, "Missing audio field").into_response();
    };

    eprintln!(
        "capture received image_bytes={} audio_bytes={} file={audio_filename}",
        image.len(),
        audio.len()
    );
    match state.analyzer.capture(image, audio, audio_filename).await {
        Ok(result) => Json(result).into_response(),
        Err(error) => {
            eprintln!("capture relay failed error={error}");
            (StatusCode::BAD_GATEWAY, error).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::to_bytes;

    use crate::analyzer::Analyzer;
    use crate::storage::Storage;

    use super::*;

    #[derive(Default)]
    struct MemoryStorage {
        snapshots: Mutex<HashMap<String, SnapshotFileData>>,
    }

    #[async_trait]
    impl Storage for MemoryStorage {
        async fn load_snapshot(&self, drawing_id: &str) -> Result<SnapshotFileData, String> {
            self.snapshots
                .lock()
                .unwrap()
                .get(drawing_id)
                .cloned()
                .ok_or_else(|| format!("Snapshot {drawing_id} not found"))
        }

        async fn save_snapshot(
            &self,
            drawing_id: &str,
            data: &SnapshotFileData,
        ) -> Result<(), String> {
            self.snapshots
                .lock()
                .unwrap()
                .insert(drawing_id.to_string(), data.clone());
            Ok(())
        }
    }

    fn test_state() -> AppState {
        AppState {
            storage: Arc::new(MemoryStorage::default()),
            analyzer: Arc::new(Analyzer::new(None)),
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn save_rejects_non_image_payloads() {
        let response = save_handler(
            State(test_state()),
            Json(SaveRequest {
                image: "http://example.com/cat.png".to_string(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn save_persists_and_load_returns_the_image() {
        let state = test_state();
        let image = "data:image/png;base64,iVBORw0KGgo=".to_string();
        let response = save_handler(
            State(state.clone()),
            Json(SaveRequest {
                image: image.clone(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let saved: SaveResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(saved.message, "Drawing saved successfully");
        assert!(normalize_drawing_id(&saved.id).is_some());

        let response = load_handler(Path(saved.id), State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let loaded: LoadResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(loaded.image, image);
    }

    #[tokio::test]
    async fn load_rejects_malformed_and_unknown_ids() {
        let state = test_state();
        let response = load_handler(Path("../etc/passwd".to_string()), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = load_handler(Path(new_drawing_id()), State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn convert_rejects_empty_write_input() {
        let response = convert_handler(
            State(test_state()),
            Json(ConvertRequest {
                data: "   ".to_string(),
                mode: InputMode::Write,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn convert_rejects_non_image_draw_input() {
        let response = convert_handler(
            State(test_state()),
            Json(ConvertRequest {
                data: "just text".to_string(),
                mode: InputMode::Draw,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analyze_reports_unknown_ids_in_band() {
        let state = test_state();
        for drawing_id in ["not-a-uuid".to_string(), new_drawing_id()] {
            let response = analyze_handler(
                State(state.clone()),
                Json(AnalyzeRequest { drawing_id }),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            let parsed: AnalyzeResponse = serde_json::from_str(&body_text(response).await).unwrap();
            let error = parsed.error.expect("expected an in-band error");
            assert!(error.contains("Unknown drawing id"));
        }
    }
}
