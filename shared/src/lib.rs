use serde::{Deserialize, Serialize};

pub mod snapshot_format;

/// Which input widget supplied the content sent to `/convert`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Draw,
    Write,
}

impl InputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InputMode::Draw => "draw",
            InputMode::Write => "write",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draw" => Some(InputMode::Draw),
            "write" => Some(InputMode::Write),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SaveRequest {
    pub image: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SaveResponse {
    pub message: String,
    pub id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoadResponse {
    pub image: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConvertRequest {
    pub data: String,
    pub mode: InputMode,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConvertResponse {
    pub converted_text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalyzeRequest {
    pub drawing_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CaptureResponse {
    #[serde(default)]
    pub analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Canvas exports arrive as base64 data URLs; anything else is rejected
/// before it reaches storage.
pub fn is_image_data_url(value: &str) -> bool {
    let Some(rest) = value.strip_prefix("data:image/") else {
        return false;
    };
    let Some(semi) = rest.find(';') else {
        return false;
    };
    let subtype = &rest[..semi];
    let subtype_ok = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '.' || c == '-');
    if !subtype_ok {
        return false;
    }
    rest[semi..].starts_with(";base64,")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_mode_round_trips_through_json() {
        let json = serde_json::to_string(&InputMode::Write).unwrap();
        assert_eq!(json, "\"write\"");
        let parsed: InputMode = serde_json::from_str("\"draw\"").unwrap();
        assert_eq!(parsed, InputMode::Draw);
    }

    #[test]
    fn input_mode_parse_rejects_unknown() {
        assert_eq!(InputMode::parse("draw"), Some(InputMode::Draw));
        assert_eq!(InputMode::parse("erase"), None);
    }

    #[test]
    fn convert_request_uses_wire_field_names() {
        let request = ConvertRequest {
            data: "data:image/png;base64,AAAA".into(),
            mode: InputMode::Draw,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"data":"data:image/png;base64,AAAA","mode":"draw"}"#);
    }

    #[test]
    fn analyze_response_tolerates_missing_optionals() {
        let parsed: AnalyzeResponse = serde_json::from_str(r#"{"analysis":"x = 2"}"#).unwrap();
        assert_eq!(parsed.analysis, "x = 2");
        assert!(parsed.image.is_none());
        assert!(parsed.error.is_none());
    }

    #[test]
    fn analyze_response_omits_absent_error() {
        let response = AnalyzeResponse {
            analysis: "ok".into(),
            image: None,
            error: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"analysis":"ok"}"#);
    }

    #[test]
    fn capture_response_carries_speech_url() {
        let parsed: CaptureResponse = serde_json::from_str(
            r#"{"analysis":"a cat","image":"QUJD","speech_url":"/media/speech-1.mp3"}"#,
        )
        .unwrap();
        assert_eq!(parsed.speech_url.as_deref(), Some("/media/speech-1.mp3"));
    }

    #[test]
    fn image_data_url_validation() {
        assert!(is_image_data_url("data:image/png;base64,iVBORw0KGgo="));
        assert!(is_image_data_url("data:image/jpeg;base64,/9j/4AAQ"));
        assert!(!is_image_data_url("data:image/;base64,AAAA"));
        assert!(!is_image_data_url("data:text/plain;base64,AAAA"));
        assert!(!is_image_data_url("data:image/png,notbase64"));
        assert!(!is_image_data_url("http://example.com/cat.png"));
        assert!(!is_image_data_url(""));
    }
}
