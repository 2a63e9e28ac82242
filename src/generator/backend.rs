use serde::{Deserialize, Serialize};

use crate::form::error::FormError;

/// Plain prompt-in, text-out model access.
pub trait TextInference {
    fn infer_text(&self, prompt: &str) -> Result<String, FormError>;
}

// ============================================================================
// Ollama Backend
// ============================================================================

pub struct OllamaBackend {
    pub endpoint: String,
    pub model: String,
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "qwen2.5:1.5b".to_string(),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        }
    }
}

impl TextInference for OllamaBackend {
    fn infer_text(&self, prompt: &str) -> Result<String, FormError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let client = reqwest::blocking::Client::new();
        let response = client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| FormError::Http {
                context: format!("ollama request to {}", self.endpoint),
                source: e,
            })?;

        let body: OllamaResponse = response.json().map_err(|e| FormError::Http {
            context: "ollama response body".into(),
            source: e,
        })?;
        Ok(body.response)
    }
}

// ============================================================================
// Gemini Backend
// ============================================================================

pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";

/// Google generative-language `generateContent` endpoint.
pub struct GeminiBackend {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiReplyContent,
}

#[derive(Deserialize)]
struct GeminiReplyContent {
    #[serde(default)]
    parts: Vec<GeminiReplyPart>,
}

#[derive(Deserialize)]
struct GeminiReplyPart {
    #[serde(default)]
    text: String,
}

impl GeminiBackend {
    pub fn new(api_key: &str) -> Self {
        Self {
            endpoint: GEMINI_ENDPOINT.to_string(),
            model: GEMINI_DEFAULT_MODEL.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model)
    }
}

impl TextInference for GeminiBackend {
    fn infer_text(&self, prompt: &str) -> Result<String, FormError> {
        if self.api_key.is_empty() {
            return Err(FormError::Generator("no Gemini API key configured".into()));
        }

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let client = reqwest::blocking::Client::new();
        let response = client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| FormError::Http {
                context: format!("gemini request for model {}", self.model),
                source: e,
            })?;

        let body: GeminiResponse = response.json().map_err(|e| FormError::Http {
            context: "gemini response body".into(),
            source: e,
        })?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(FormError::Generator("gemini returned no candidates".into()));
        }
        Ok(text)
    }
}

// ============================================================================
// Mock Backend (for testing without a model)
// ============================================================================

/// Returns the same canned text for every prompt.
pub struct MockTextInference {
    pub response: String,
}

impl MockTextInference {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl TextInference for MockTextInference {
    fn infer_text(&self, _prompt: &str) -> Result<String, FormError> {
        Ok(self.response.clone())
    }
}
