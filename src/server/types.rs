use serde::{Deserialize, Serialize};

/// Payload returned for unknown or missing texture names.
pub const UNKNOWN_TEXTURE: &str = "Unknown texture";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    pub fn unknown_texture() -> Self {
        Self::new(UNKNOWN_TEXTURE)
    }
}

/// `GET /tex/{name}` response: a bare JSON string holding the base64 PNG, or
/// an [`ErrorBody`].
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TextureResponse {
    Texture(String),
    Error(ErrorBody),
}

/// Body of `POST /mix`. Every field is optional so that missing names are
/// reported in the response payload instead of as a rejected request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MixRequest {
    #[serde(default)]
    pub texture1: Option<String>,
    #[serde(default)]
    pub texture2: Option<String>,
    #[serde(default)]
    pub ratio: Option<f32>,
    #[serde(default)]
    pub result_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MixResult {
    pub texture: String,
    pub texture1: String,
    pub texture2: String,
    pub ratio: f32,
    pub result_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MixResponse {
    Mixed(MixResult),
    Error(ErrorBody),
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub classes: usize,
}
