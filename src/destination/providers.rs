//! External providers: Nominatim geocoding and an OpenAI-compatible LLM.
//!
//! Both clients are blocking `ureq` calls moved onto the blocking pool; the
//! caller's cancel token races the join handle so an abandoned request
//! never holds up the pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::cancel::CancelToken;
use super::types::{Coordinates, QueryContext, ResolveError, Result};
use crate::config::{GeocodingConfig, LlmConfig};

/// Optional hints passed to the geocoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoBias {
    /// ISO 3166-1 alpha-2 country code
    pub country: Option<String>,
    pub near: Option<Coordinates>,
}

impl GeoBias {
    pub fn from_context(context: &QueryContext) -> Self {
        Self {
            country: context
                .departure_country
                .as_ref()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| c.len() == 2),
            near: context.bias_point(),
        }
    }
}

#[async_trait]
pub trait GeocodingClient: Send + Sync {
    /// `Ok(None)` means the provider found nothing.
    async fn geocode(&self, text: &str, bias: &GeoBias, cancel: &CancelToken) -> Result<Option<Coordinates>>;
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, context: &QueryContext, cancel: &CancelToken) -> Result<String>;
}

/// Run a blocking provider call, giving up when the token fires.
async fn run_blocking<T, F>(cancel: &CancelToken, call: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(call);
    match cancel.run_until_cancelled(handle).await {
        Some(Ok(result)) => result,
        Some(Err(e)) => Err(ResolveError::Network(format!("provider task failed: {}", e))),
        None => Err(ResolveError::Cancelled),
    }
}

// ─── Nominatim provider ─────────────────────────────────────────

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Deserialize, Debug, Clone)]
pub struct NominatimResult {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    #[serde(default)]
    pub importance: Option<f64>,
}

/// Half-width in degrees of the viewbox built around a bias point.
const VIEWBOX_HALF_DEG: f64 = 1.0;

pub struct NominatimGeocoder {
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn search(
        endpoint: &str,
        user_agent: &str,
        timeout: Duration,
        text: &str,
        bias: &GeoBias,
    ) -> Result<Option<Coordinates>> {
        let mut request = ureq::get(endpoint)
            .set("User-Agent", user_agent)
            .timeout(timeout)
            .query("q", text)
            .query("format", "json")
            .query("limit", "5")
            .query("addressdetails", "0");
        if let Some(cc) = &bias.country {
            request = request.query("countrycodes", cc);
        }
        if let Some(p) = &bias.near {
            let viewbox = format!(
                "{},{},{},{}",
                p.lon - VIEWBOX_HALF_DEG,
                p.lat + VIEWBOX_HALF_DEG,
                p.lon + VIEWBOX_HALF_DEG,
                p.lat - VIEWBOX_HALF_DEG,
            );
            request = request.query("viewbox", &viewbox).query("bounded", "0");
        }

        let response = request
            .call()
            .map_err(|e| ResolveError::Network(e.to_string()))?;
        let results: Vec<NominatimResult> = response
            .into_json()
            .map_err(|e| ResolveError::InvalidResponse(e.to_string()))?;

        pick_best(&results)
    }
}

/// Highest-importance result with parseable coordinates.
fn pick_best(results: &[NominatimResult]) -> Result<Option<Coordinates>> {
    let best = results.iter().max_by(|a, b| {
        a.importance
            .unwrap_or(0.0)
            .partial_cmp(&b.importance.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let Some(best) = best else {
        return Ok(None);
    };
    let lat: f64 = best
        .lat
        .parse()
        .map_err(|_| ResolveError::InvalidResponse(format!("bad latitude '{}'", best.lat)))?;
    let lon: f64 = best
        .lon
        .parse()
        .map_err(|_| ResolveError::InvalidResponse(format!("bad longitude '{}'", best.lon)))?;
    let point = Coordinates::new(lat, lon);
    if !point.is_valid() {
        return Err(ResolveError::InvalidResponse(format!(
            "coordinates out of range for '{}'",
            best.display_name
        )));
    }
    Ok(Some(point))
}

#[async_trait]
impl GeocodingClient for NominatimGeocoder {
    async fn geocode(&self, text: &str, bias: &GeoBias, cancel: &CancelToken) -> Result<Option<Coordinates>> {
        let endpoint = self.endpoint.clone();
        let user_agent = self.user_agent.clone();
        let timeout = self.timeout;
        let text = text.to_string();
        let bias = bias.clone();
        run_blocking(cancel, move || {
            Self::search(&endpoint, &user_agent, timeout, &text, &bias)
        })
        .await
    }
}

// ─── Chat-completion provider ───────────────────────────────────

const SYSTEM_PROMPT: &str = "You map travel destination requests to IATA airport or city codes. \
Reply with a single JSON object and nothing else.";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any `/v1/chat/completions`-style endpoint.
pub struct ChatCompletionClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ChatCompletionClient {
    /// Reads the API key from the environment variable named in config.
    pub fn new(config: &LlmConfig) -> Self {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.is_empty());
        Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn context_message(context: &QueryContext) -> Option<String> {
        if *context == QueryContext::default() {
            return None;
        }
        serde_json::to_string(context)
            .ok()
            .map(|json| format!("Traveller context: {}", json))
    }

    fn send(
        endpoint: &str,
        api_key: Option<&str>,
        timeout: Duration,
        body: serde_json::Value,
    ) -> Result<String> {
        let mut request = ureq::post(endpoint).timeout(timeout);
        if let Some(key) = api_key {
            request = request.set("Authorization", &format!("Bearer {}", key));
        }
        let response = request
            .send_json(body)
            .map_err(|e| ResolveError::Network(e.to_string()))?;
        let parsed: ChatResponse = response
            .into_json()
            .map_err(|e| ResolveError::InvalidResponse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ResolveError::InvalidResponse("no completion content".into()))
    }
}

#[async_trait]
impl LlmClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str, context: &QueryContext, cancel: &CancelToken) -> Result<String> {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT.to_string(),
        }];
        if let Some(ctx) = Self::context_message(context) {
            messages.push(ChatMessage { role: "system", content: ctx });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });
        let body = serde_json::to_value(ChatRequest {
            model: &self.model,
            messages,
            temperature: 0.0,
        })?;

        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();
        let timeout = self.timeout;
        run_blocking(cancel, move || {
            Self::send(&endpoint, api_key.as_deref(), timeout, body)
        })
        .await
    }
}
