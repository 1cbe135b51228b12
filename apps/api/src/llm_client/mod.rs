//! LLM client — the single point of entry for structured CV extraction.
//!
//! Two text-completion backends exist (a hosted Gemini model reachable via an
//! API key and a locally hosted Ollama model reachable over HTTP). Both sit
//! behind [`TextCompletionBackend`] so the ingestion pipeline is written once
//! and the backend is selected per route.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::candidate::CandidateData;

pub mod prompts;

const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent";
const OLLAMA_MODEL: &str = "llama3.2";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// A text-in, text-out completion backend. The pipeline treats it as an
/// opaque oracle: prompt in, raw text out, no retries.
#[async_trait]
pub trait TextCompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;

    /// Short backend name used in logs.
    fn name(&self) -> &'static str;
}

/// Sends the raw CV text to the given backend and parses the response into a
/// structured, normalized candidate record.
pub async fn extract_candidate(
    raw_text: &str,
    backend: &dyn TextCompletionBackend,
) -> Result<CandidateData, AppError> {
    let prompt = prompts::build_extraction_prompt(raw_text);
    let response = backend.complete(&prompt).await?;
    debug!(backend = backend.name(), "LLM responded with {} bytes", response.len());
    parse_candidate_response(&response)
}

/// Parses a backend response into [`CandidateData`].
///
/// Three response shapes occur in practice: bare JSON, JSON wrapped in a
/// fenced code block, and text that is not JSON at all. The first two parse;
/// the third fails with the raw response preserved for diagnostics.
pub fn parse_candidate_response(response: &str) -> Result<CandidateData, AppError> {
    let text = strip_json_fences(response);
    let value: Value =
        serde_json::from_str(text).map_err(|_| AppError::StructuredExtractionFailed {
            raw_response: response.to_string(),
        })?;
    let value = normalize_candidate_value(value);
    serde_json::from_value(value).map_err(|_| AppError::StructuredExtractionFailed {
        raw_response: response.to_string(),
    })
}

/// Normalizes field shapes the backends are inconsistent about, so nothing
/// downstream has to care:
/// - `education` returned as an object is serialized to a JSON string;
/// - `skills` must end up a list of strings; a string that itself parses as
///   a JSON array is accepted, anything else degrades to an empty list.
fn normalize_candidate_value(mut value: Value) -> Value {
    let Some(obj) = value.as_object_mut() else {
        return value;
    };

    if let Some(education) = obj.get("education") {
        match education {
            Value::String(_) | Value::Null => {}
            other => {
                let serialized = other.to_string();
                obj.insert("education".to_string(), Value::String(serialized));
            }
        }
    }

    let skills = match obj.get("skills") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        Some(Value::String(s)) => match serde_json::from_str::<Vec<String>>(s) {
            Ok(list) => list,
            Err(_) => {
                warn!("Backend returned skills as a plain string, dropping: {s}");
                Vec::new()
            }
        },
        Some(other) => {
            warn!("Backend returned skills with unexpected shape: {other}");
            Vec::new()
        }
    };
    obj.insert(
        "skills".to_string(),
        Value::Array(skills.into_iter().map(Value::String).collect()),
    );

    value
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

// ---------------------------------------------------------------------------
// Gemini (hosted) backend
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: String,
}

/// Hosted generative backend reachable via an API key.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            client: http_client(),
            api_key,
        }
    }
}

#[async_trait]
impl TextCompletionBackend for GeminiBackend {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(GEMINI_API_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::BackendUnavailable {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::BackendUnavailable {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: GeminiResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::BackendUnavailable {
                    status: status.as_u16(),
                    message: format!("unreadable response body: {e}"),
                })?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::BackendUnavailable {
                status: status.as_u16(),
                message: "response contained no text candidates".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ---------------------------------------------------------------------------
// Ollama (local) backend
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

/// Locally hosted model reachable over plain HTTP.
#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    base_url: String,
}

impl OllamaBackend {
    pub fn new(base_url: String) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TextCompletionBackend for OllamaBackend {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let request = OllamaRequest {
            model: OLLAMA_MODEL,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::BackendUnavailable {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.as_u16() == 405 {
            return Err(AppError::BackendUnsupported(
                "Ollama endpoint /api/generate not supported. Check the server version or try /api/chat.".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::BackendUnavailable {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: OllamaResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::BackendUnavailable {
                    status: status.as_u16(),
                    message: format!("unreadable response body: {e}"),
                })?;

        Ok(parsed.response)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

fn http_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE_JSON: &str = r#"{
        "name": "Jane Doe",
        "email": "jane@example.com",
        "phone": "+1 555 0100",
        "education": "BSc Computer Science",
        "skills": ["Python", "Django"],
        "work_experience": [
            {
                "company": "Acme",
                "position": "Backend Engineer",
                "start_date": "2020-01",
                "end_date": "present",
                "description": "Built REST services in Python"
            }
        ]
    }"#;

    #[test]
    fn test_parse_bare_json_response() {
        let data = parse_candidate_response(BARE_JSON).unwrap();
        assert_eq!(data.name, "Jane Doe");
        assert_eq!(data.skills, vec!["Python", "Django"]);
        assert_eq!(data.work_experience.len(), 1);
        assert_eq!(data.work_experience[0].company.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_parse_fenced_json_response() {
        let fenced = format!("```json\n{BARE_JSON}\n```");
        let data = parse_candidate_response(&fenced).unwrap();
        assert_eq!(data.name, "Jane Doe");
    }

    #[test]
    fn test_parse_bare_fenced_response() {
        let fenced = format!("```\n{BARE_JSON}\n```");
        let data = parse_candidate_response(&fenced).unwrap();
        assert_eq!(data.name, "Jane Doe");
    }

    #[test]
    fn test_parse_non_json_fails_with_raw_response() {
        let raw = "I could not find a resume in the provided text.";
        let err = parse_candidate_response(raw).unwrap_err();
        match err {
            AppError::StructuredExtractionFailed { raw_response } => {
                assert_eq!(raw_response, raw);
            }
            other => panic!("expected StructuredExtractionFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_education_object_is_serialized_to_string() {
        let response = r#"{
            "name": "Jane",
            "education": {"school": "MIT", "degree": "BSc"},
            "skills": []
        }"#;
        let data = parse_candidate_response(response).unwrap();
        let education = data.education.unwrap();
        let round_trip: Value = serde_json::from_str(&education).unwrap();
        assert_eq!(round_trip["school"], "MIT");
    }

    #[test]
    fn test_skills_as_json_string_is_accepted() {
        let response = r#"{"name": "Jane", "skills": "[\"Java\",\"SQL\"]"}"#;
        let data = parse_candidate_response(response).unwrap();
        assert_eq!(data.skills, vec!["Java", "SQL"]);
    }

    #[test]
    fn test_skills_as_plain_string_degrades_to_empty() {
        let response = r#"{"name": "Jane", "skills": "Java, SQL"}"#;
        let data = parse_candidate_response(response).unwrap();
        assert!(data.skills.is_empty());
    }

    #[test]
    fn test_missing_skills_defaults_to_empty() {
        let data = parse_candidate_response(r#"{"name": "Jane"}"#).unwrap();
        assert!(data.skills.is_empty());
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }
}
