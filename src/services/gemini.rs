use crate::core::{
    extract::{parse_ranking, ExtractError, RankedItem},
    prompt::ranking_prompt,
    ExternalRanker, RankerError,
};
use crate::models::domain::MAX_MATCHES;
use crate::models::{AlumniCandidate, StudentProfile};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Public Generative Language API base
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Model reported by the config endpoint when none is set
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Gemini `generateContent` client used as the external ranker
///
/// A single attempt per request: any failure is returned to the caller,
/// which falls back to the heuristic.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: Option<String>,
    temperature: f32,
    max_output_tokens: u32,
    max_candidates: usize,
    max_matches: usize,
}

/// Tunables for [`GeminiClient`]
#[derive(Debug, Clone)]
pub struct GeminiOptions {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub max_candidates: usize,
    pub max_matches: usize,
}

impl Default for GeminiOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: None,
            timeout: Duration::from_secs(10),
            temperature: 0.0,
            max_output_tokens: 3000,
            max_candidates: 20,
            max_matches: 10,
        }
    }
}

impl GeminiClient {
    pub fn new(options: GeminiOptions) -> Result<Self, RankerError> {
        let client = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            client,
            endpoint: options.endpoint,
            api_key: options.api_key.filter(|k| !k.trim().is_empty()),
            model: options.model.filter(|m| !m.trim().is_empty()),
            temperature: options.temperature,
            max_output_tokens: options.max_output_tokens,
            max_candidates: options.max_candidates,
            max_matches: options.max_matches.min(MAX_MATCHES),
        })
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Configured model, or the display default
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Send one prompt and return the model's text output
    async fn generate(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, RankerError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(model),
            urlencoding::encode(api_key)
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RankerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json: Value = response.json().await?;
        output_text(&json).ok_or(RankerError::Output(ExtractError::Empty))
    }
}

#[async_trait]
impl ExternalRanker for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.model.is_some()
    }

    async fn rank(
        &self,
        student: &StudentProfile,
        candidates: &[AlumniCandidate],
    ) -> Result<Vec<RankedItem>, RankerError> {
        let (Some(api_key), Some(model)) = (self.api_key.as_deref(), self.model.as_deref()) else {
            return Err(RankerError::NotConfigured);
        };

        let prompt = ranking_prompt(student, candidates, self.max_candidates)?;

        tracing::debug!(
            "Requesting ranking of {} candidates for {} from {}",
            candidates.len().min(self.max_candidates),
            student.id,
            model
        );

        let text = self.generate(api_key, model, &prompt).await?;
        let items = parse_ranking(&text, self.max_matches)?;

        tracing::debug!("Ranker returned {} valid entries for {}", items.len(), student.id);

        Ok(items)
    }
}

/// Pull the generated text out of the response shapes the API has used
///
/// Prefers the concatenated `parts` of the first candidate, then the
/// candidate's `output` or `text`, then a top-level `text`.
fn output_text(json: &Value) -> Option<String> {
    let candidate = json
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first());

    let from_candidate = candidate.and_then(|candidate| {
        let from_parts = candidate
            .pointer("/content/parts")
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .map(|part| match part.get("text").and_then(Value::as_str) {
                        Some(text) => text.to_string(),
                        None => part
                            .get("content")
                            .and_then(Value::as_array)
                            .map(|chunks| chunks.iter().filter_map(Value::as_str).collect())
                            .unwrap_or_default(),
                    })
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty());

        from_parts
            .or_else(|| non_empty_str(candidate.get("output")))
            .or_else(|| non_empty_str(candidate.get("text")))
    });

    from_candidate.or_else(|| non_empty_str(json.get("text")))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
