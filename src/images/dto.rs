use serde::{Deserialize, Serialize};

/// Request body for image generation.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub message: String,
    pub credit_balance: i32,
    /// `data:image/png;base64,…` URL, ready for an <img> tag.
    pub result_image: String,
}
