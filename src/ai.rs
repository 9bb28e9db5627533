use rand::Rng;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, warn};

use crate::errors::AiError;

pub const RESUME_FALLBACK: &str = "Could not analyze resume at this time.";
pub const TIPS_FALLBACK: &str = "Tips are unavailable right now. Focus on core fundamentals!";
pub const MATCH_FALLBACK_REASON: &str = "Standard matching applied.";

/// Characters of resume and job text sent for match scoring.
const MATCH_INPUT_LIMIT: usize = 1000;

pub const DEFAULT_MODEL: &str = "gemini-flash";

// --- Provider trait ---

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// Ask for a bare JSON response where the provider supports it.
    pub json: bool,
}

pub trait AIProvider: Send + Sync {
    fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, AiError>;
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Anthropic,
    OpenAI,
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model_id: String,
    pub short_name: String,
}

impl ModelSpec {
    fn new(provider: ProviderKind, model_id: &str, short_name: &str) -> Self {
        Self {
            provider,
            model_id: model_id.to_string(),
            short_name: short_name.to_string(),
        }
    }
}

pub fn resolve_model(name: &str) -> anyhow::Result<ModelSpec> {
    match name {
        // Google Gemini (requires GEMINI_API_KEY or API_KEY)
        "gemini-flash" | "gemini" | "flash" => Ok(ModelSpec::new(
            ProviderKind::Gemini,
            "gemini-3-flash-preview",
            "gemini-flash",
        )),
        "gemini-pro" => Ok(ModelSpec::new(ProviderKind::Gemini, "gemini-2.5-pro", "gemini-pro")),
        // Direct Anthropic API (requires ANTHROPIC_API_KEY)
        "api-sonnet" | "sonnet" => Ok(ModelSpec::new(
            ProviderKind::Anthropic,
            "claude-sonnet-4-5-20250929",
            "api-sonnet",
        )),
        "api-haiku" | "haiku" => Ok(ModelSpec::new(
            ProviderKind::Anthropic,
            "claude-haiku-4-5-20251001",
            "api-haiku",
        )),
        // OpenAI (requires OPENAI_API_KEY)
        "gpt-4o" => Ok(ModelSpec::new(ProviderKind::OpenAI, "gpt-4o", "gpt-4o")),
        "gpt-4o-mini" => Ok(ModelSpec::new(ProviderKind::OpenAI, "gpt-4o-mini", "gpt-4o-mini")),
        _ => Err(anyhow::anyhow!(
            "Unknown model '{}'. Available: gemini-flash (default), gemini-pro, api-sonnet, \
             api-haiku, gpt-4o, gpt-4o-mini",
            name
        )),
    }
}

pub fn create_provider(spec: &ModelSpec) -> Result<Box<dyn AIProvider>, AiError> {
    match spec.provider {
        ProviderKind::Gemini => Ok(Box::new(GeminiProvider::new(spec.model_id.clone())?)),
        ProviderKind::Anthropic => Ok(Box::new(AnthropicProvider::new(spec.model_id.clone())?)),
        ProviderKind::OpenAI => Ok(Box::new(OpenAIProvider::new(spec.model_id.clone())?)),
    }
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, AiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().unwrap_or_default();
    Err(AiError::Api { status, message })
}

// --- Gemini provider ---

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug)]
pub struct GeminiProvider {
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl GeminiProvider {
    pub fn new(model_id: String) -> Result<Self, AiError> {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .map_err(|_| AiError::MissingApiKey("GEMINI_API_KEY"))?;
        let client = reqwest::blocking::Client::new();
        Ok(Self { api_key, model_id, client })
    }
}

impl AIProvider for GeminiProvider {
    fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, AiError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt.to_string() }],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: options.max_tokens,
                temperature: options.temperature,
                response_mime_type: options.json.then_some("application/json"),
            },
        };

        let url = format!("{}/{}:generateContent", GEMINI_API_URL, self.model_id);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()?;

        let api_response: GeminiResponse = check_status(response)?.json()?;

        api_response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(AiError::EmptyContent)
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

// --- Anthropic provider ---

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug)]
pub struct AnthropicProvider {
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl AnthropicProvider {
    pub fn new(model_id: String) -> Result<Self, AiError> {
        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| AiError::MissingApiKey("ANTHROPIC_API_KEY"))?;
        let client = reqwest::blocking::Client::new();
        Ok(Self { api_key, model_id, client })
    }
}

impl AIProvider for AnthropicProvider {
    fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, AiError> {
        let request = AnthropicRequest {
            model: self.model_id.clone(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()?;

        let api_response: AnthropicResponse = check_status(response)?.json()?;

        api_response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or(AiError::EmptyContent)
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

// --- OpenAI provider ---

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug)]
pub struct OpenAIProvider {
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl OpenAIProvider {
    pub fn new(model_id: String) -> Result<Self, AiError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| AiError::MissingApiKey("OPENAI_API_KEY"))?;
        let client = reqwest::blocking::Client::new();
        Ok(Self { api_key, model_id, client })
    }
}

impl AIProvider for OpenAIProvider {
    fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, AiError> {
        let request = OpenAIRequest {
            model: self.model_id.clone(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            response_format: options.json.then_some(OpenAIResponseFormat { format_type: "json_object" }),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()?;

        let api_response: OpenAIResponse = check_status(response)?.json()?;

        api_response
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or(AiError::EmptyContent)
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

// --- Assistant operations ---

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub score: u8,
    pub match_reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatch {
    score: f64,
    match_reason: String,
}

/// Never fails: any provider error resolves to a fixed fallback.
pub struct Assistant {
    provider: Option<Box<dyn AIProvider>>,
}

impl Assistant {
    pub fn new(provider: Option<Box<dyn AIProvider>>) -> Self {
        Self { provider }
    }

    // A missing key or unknown model leaves the assistant in fallback-only mode.
    pub fn from_model(model: &str) -> Self {
        let provider = match resolve_model(model) {
            Ok(spec) => match create_provider(&spec) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    warn!("AI provider unavailable ({}): {}", spec.short_name, e);
                    None
                }
            },
            Err(e) => {
                warn!("{e}");
                None
            }
        };
        Self::new(provider)
    }

    pub fn model_name(&self) -> Option<&str> {
        self.provider.as_deref().map(|p| p.model_name())
    }

    fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, AiError> {
        let provider = self.provider.as_deref().ok_or(AiError::NoProvider)?;
        debug!(model = provider.model_name(), prompt_len = prompt.len(), "completion request");
        provider.complete(prompt, options)
    }

    pub fn analyze_resume(&self, resume_text: &str, target_role: &str) -> String {
        let prompt = format!(
            "Analyze this resume for a {} position. Provide 3 specific bullet points to improve the resume for ATS matching.\n\
             Resume: {}",
            target_role, resume_text
        );
        let options = CompletionOptions {
            max_tokens: 2048,
            temperature: Some(0.7),
            json: false,
        };
        self.complete(&prompt, &options).unwrap_or_else(|e| {
            warn!("Error analyzing resume: {e}");
            RESUME_FALLBACK.to_string()
        })
    }

    pub fn interview_tips(&self, company: &str, role: &str, interview_type: &str) -> String {
        let prompt = format!(
            "Provide 5 expert interview tips for a {} interview for the position of {} at {}.\n\
             Include 3 common technical or behavioral questions.",
            interview_type, role, company
        );
        let options = CompletionOptions {
            max_tokens: 2048,
            temperature: Some(0.8),
            json: false,
        };
        self.complete(&prompt, &options).unwrap_or_else(|e| {
            warn!("Error generating tips: {e}");
            TIPS_FALLBACK.to_string()
        })
    }

    pub fn match_job(&self, resume_text: &str, job_description: &str) -> MatchResult {
        self.match_job_with_rng(resume_text, job_description, &mut rand::thread_rng())
    }

    fn match_job_with_rng<R: Rng + ?Sized>(&self, resume_text: &str, job_description: &str, rng: &mut R) -> MatchResult {
        let prompt = format!(
            "Compare this resume with the job description. Return ONLY a JSON object with a 'score' from 0-100 and a 'matchReason' string.\n\
             Resume: {}\n\
             Job: {}",
            truncate_chars(resume_text, MATCH_INPUT_LIMIT),
            truncate_chars(job_description, MATCH_INPUT_LIMIT)
        );
        let options = CompletionOptions {
            max_tokens: 1024,
            temperature: None,
            json: true,
        };

        match self.complete(&prompt, &options).and_then(|text| parse_match(&text)) {
            Ok(result) => result,
            Err(e) => {
                warn!("Error matching job: {e}");
                MatchResult {
                    score: rng.gen_range(60..=99),
                    match_reason: MATCH_FALLBACK_REASON.to_string(),
                }
            }
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Strips a surrounding markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop an info string such as "json"
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_match(text: &str) -> Result<MatchResult, AiError> {
    let raw: RawMatch = serde_json::from_str(strip_code_fence(text))?;
    if !(0.0..=100.0).contains(&raw.score) {
        return Err(AiError::ScoreOutOfRange(raw.score));
    }
    Ok(MatchResult {
        score: raw.score.round() as u8,
        match_reason: raw.match_reason,
    })
}
