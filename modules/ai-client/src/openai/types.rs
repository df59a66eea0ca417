use serde::{Deserialize, Serialize};

/// Request body for `POST /embeddings` (§4.3/§6: an OpenAI-compatible
/// embedding endpoint — the canonical response shape is `{data: [[...]]}`
/// per §9's resolved Open Question).
#[derive(Debug, Clone, Serialize)]
pub(crate) struct EmbeddingRequest {
    pub model: String,
    pub input: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EmbeddingData {
    pub embedding: Vec<f32>,
}
