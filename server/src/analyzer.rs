use inkpad_shared::{AnalyzeResponse, CaptureResponse, ConvertRequest, ConvertResponse};

/// Relay client for the external analysis service. The service itself is an
/// opaque collaborator: it receives images (and audio) and returns
/// text/LaTeX/image/speech references.
pub struct Analyzer {
    base_url: Option<String>,
    http: reqwest::Client,
}

pub fn join_endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

impl Analyzer {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<String, String> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| "Analysis service is not configured".to_string())?;
        Ok(join_endpoint(base_url, path))
    }

    pub async fn convert(&self, request: &ConvertRequest) -> Result<ConvertResponse, String> {
        let url = self.endpoint("convert")?;
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| format!("Analysis service unreachable: {e}"))?;
        if !response.status().is_success() {
            return Err(format!(
                "Analysis service returned {} for convert",
                response.status()
            ));
        }
        response
            .json::<ConvertResponse>()
            .await
            .map_err(|e| format!("Invalid convert response: {e}"))
    }

    pub async fn analyze(&self, image: &str) -> Result<AnalyzeResponse, String> {
        let url = self.endpoint("analyze")?;
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "image": image }))
            .send()
            .await
            .map_err(|e| format!("Analysis service unreachable: {e}"))?;
        if !response.status().is_success() {
            return Err(format!(
                "Analysis service returned {} for analyze",
                response.status()
            ));
        }
        response
            .json::<AnalyzeResponse>()
            .await
            .map_err(|e| format!("Invalid analyze response: {e}"))
    }

    pub async fn capture(
        &self,
        image: String,
        audio: Vec<u8>,
        audio_filename: String,
    ) -> Result<CaptureResponse, String> {
        let url = self.endpoint("capture")?;
        let audio_part = reqwest::multipart::Part::bytes(audio)
            .file_name(audio_filename)
            .mime_str("audio/mp3")
            .map_err(|e| format!("Invalid audio part: {e}"))?;
        let form = reqwest::multipart::Form::new()
            .text("image", image)
            .part("audio", audio_part);
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Analysis service unreachable: {e}"))?;
        if !response.status().is_success() {
            return Err(format!(
                "Analysis service returned {} for capture",
                response.status()
            ));
        }
        response
            .json::<CaptureResponse>()
            .await
            .map_err(|e| format!("Invalid capture response: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_doubled_slashes() {
        assert_eq!(
            join_endpoint("http://ocr.internal/", "/convert"),
            "http://ocr.internal/convert"
        );
        assert_eq!(
            join_endpoint("http://ocr.internal", "analyze"),
            "http://ocr.internal/analyze"
        );
    }

    #[test]
    fn unconfigured_analyzer_reports_it() {
        let analyzer = Analyzer::new(None);
        assert!(!analyzer.is_configured());
        assert!(analyzer.endpoint("convert").is_err());
    }

    #[test]
    fn blank_url_counts_as_unconfigured() {
        let analyzer = Analyzer::new(Some(String::new()));
        assert!(!analyzer.is_configured());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let analyzer = Analyzer::new(Some("http://ocr.internal/".to_string()));
        assert_eq!(
            analyzer.endpoint("convert").as_deref(),
            Ok("http://ocr.internal/convert")
        );
    }
}
