//! The five resolution layers, in ascending cost order.
//!
//! Layers 1-3 are pure functions of the gazetteer. Layers 4 and 5 call out
//! to collaborators and swallow every failure as "no candidate".

use serde::Deserialize;
use std::cmp::Ordering;
use std::sync::Arc;

use super::cancel::CancelToken;
use super::gazetteer::Gazetteer;
use super::normalize::looks_like_code;
use super::providers::{GeoBias, GeocodingClient, LlmClient};
use super::types::{DestinationKind, LayerKind, ResolutionCandidate, ResolutionQuery};

pub const EXACT_AIRPORT_CONFIDENCE: f64 = 0.95;
/// A city code is one step removed from a bookable endpoint.
pub const EXACT_CITY_CONFIDENCE: f64 = 0.93;
pub const FUZZY_MIN_CONFIDENCE: f64 = 0.80;
pub const FUZZY_MAX_CONFIDENCE: f64 = 0.94;
pub const REGION_CONFIDENCE: f64 = 0.85;
pub const GEOCODE_CONFIDENCE: f64 = 0.75;
pub const LLM_CONFIDENCE: f64 = 0.70;

// ─── Fuzzy matching helpers ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct NameMatch<'a> {
    score: f64,
    alias: &'a str,
    substring: bool,
}

/// Best-first: score, then exact substring, then shorter alias, then lexical.
fn compare_matches(a: &NameMatch<'_>, b: &NameMatch<'_>) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then(b.substring.cmp(&a.substring))
        .then(a.alias.chars().count().cmp(&b.alias.chars().count()))
        .then(a.alias.cmp(b.alias))
}

fn best_name_match<'a>(query: &str, names: &'a [String], floor: f64) -> Option<NameMatch<'a>> {
    names
        .iter()
        .filter_map(|name| {
            let score = strsim::normalized_levenshtein(query, name);
            (score >= floor).then(|| NameMatch {
                score,
                alias: name.as_str(),
                substring: name.contains(query) || query.contains(name.as_str()),
            })
        })
        .min_by(compare_matches)
}

/// Map a similarity score onto the layer-2 confidence band.
pub fn fuzzy_confidence(score: f64, floor: f64) -> f64 {
    let span = FUZZY_MAX_CONFIDENCE - FUZZY_MIN_CONFIDENCE;
    (FUZZY_MIN_CONFIDENCE + span * (score - floor) / (1.0 - floor))
        .clamp(FUZZY_MIN_CONFIDENCE, FUZZY_MAX_CONFIDENCE)
}

// ─── Layer 1 ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ExactCodeMatcher;

impl ExactCodeMatcher {
    pub fn run(&self, query: &ResolutionQuery, gazetteer: &Gazetteer) -> Vec<ResolutionCandidate> {
        let text = &query.normalized_text;
        if !looks_like_code(text) {
            return Vec::new();
        }
        let mut found = Vec::new();
        if let Some(d) = gazetteer.lookup(text, DestinationKind::Airport) {
            found.push(ResolutionCandidate::new(&d.code, EXACT_AIRPORT_CONFIDENCE, LayerKind::Exact));
        }
        if let Some(d) = gazetteer.lookup(text, DestinationKind::City) {
            found.push(ResolutionCandidate::new(&d.code, EXACT_CITY_CONFIDENCE, LayerKind::Exact));
        }
        found
    }
}

// ─── Layer 2 ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FuzzyNameMatcher {
    pub floor: f64,
    pub top_n: usize,
    pub accept_threshold: f64,
}

impl Default for FuzzyNameMatcher {
    fn default() -> Self {
        Self {
            floor: 0.80,
            top_n: 5,
            accept_threshold: 0.90,
        }
    }
}

impl FuzzyNameMatcher {
    pub fn run(&self, query: &ResolutionQuery, gazetteer: &Gazetteer) -> Vec<ResolutionCandidate> {
        let text = query.normalized_text.as_str();
        let mut matches: Vec<(usize, NameMatch<'_>)> = (0..gazetteer.len())
            .filter_map(|i| best_name_match(text, gazetteer.names_of(i), self.floor).map(|m| (i, m)))
            .collect();
        matches.sort_by(|a, b| compare_matches(&a.1, &b.1).then(a.0.cmp(&b.0)));

        let destinations = gazetteer.destinations();
        let mut found: Vec<ResolutionCandidate> = Vec::with_capacity(self.top_n);
        for (i, m) in matches {
            let code = &destinations[i].code;
            if found.iter().any(|c| &c.destination_code == code) {
                continue;
            }
            found.push(
                ResolutionCandidate::new(code, fuzzy_confidence(m.score, self.floor), LayerKind::Fuzzy)
                    .with_alias(m.alias),
            );
            if found.len() == self.top_n {
                break;
            }
        }
        found
    }
}

// ─── Layer 3 ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RegionalExpander {
    pub floor: f64,
}

impl Default for RegionalExpander {
    fn default() -> Self {
        Self { floor: 0.80 }
    }
}

impl RegionalExpander {
    /// Expand the best-matching region into its members, curated order.
    pub fn run(&self, query: &ResolutionQuery, gazetteer: &Gazetteer) -> Vec<ResolutionCandidate> {
        let text = query.normalized_text.as_str();
        let best = gazetteer
            .regions()
            .iter()
            .enumerate()
            .filter_map(|(i, r)| best_name_match(text, &r.names, self.floor).map(|m| (i, m)))
            .min_by(|a, b| compare_matches(&a.1, &b.1).then(a.0.cmp(&b.0)));

        let Some((i, m)) = best else {
            return Vec::new();
        };
        let region = &gazetteer.regions()[i].mapping;
        tracing::debug!(region = %region.region_name, score = m.score, "region matched");
        region
            .member_codes
            .iter()
            .map(|code| ResolutionCandidate::new(code, REGION_CONFIDENCE, LayerKind::Region).with_alias(m.alias))
            .collect()
    }
}

// ─── Layer 4 ────────────────────────────────────────────────────

pub struct GeocodingResolver {
    client: Arc<dyn GeocodingClient>,
    radius_km: f64,
}

impl GeocodingResolver {
    pub fn new(client: Arc<dyn GeocodingClient>, radius_km: f64) -> Self {
        Self { client, radius_km }
    }

    pub async fn run(
        &self,
        query: &ResolutionQuery,
        gazetteer: &Gazetteer,
        cancel: &CancelToken,
    ) -> Vec<ResolutionCandidate> {
        let bias = GeoBias::from_context(&query.context);
        let point = match self.client.geocode(query.raw_text.trim(), &bias, cancel).await {
            Ok(Some(point)) => point,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "geocoding failed, no candidate");
                return Vec::new();
            }
        };
        match gazetteer.nearest_airport(&point, self.radius_km) {
            Some((d, dist)) => {
                tracing::debug!(code = %d.code, distance_km = dist, "nearest airport to geocoded point");
                vec![ResolutionCandidate::new(&d.code, GEOCODE_CONFIDENCE, LayerKind::Geocode)]
            }
            None => {
                tracing::debug!(lat = point.lat, lon = point.lon, "no airport within radius");
                Vec::new()
            }
        }
    }
}

// ─── Layer 5 ────────────────────────────────────────────────────

pub struct LlmInterpreter {
    client: Arc<dyn LlmClient>,
}

#[derive(Deserialize)]
struct LlmGuess {
    code: Option<String>,
}

impl LlmInterpreter {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn build_prompt(query: &ResolutionQuery) -> String {
        format!(
            "Traveller request: \"{}\"\n\
             Identify the single most likely destination airport or city. \
             Respond with exactly one JSON object of the form {{\"code\": \"XXX\"}} \
             using a 3-letter IATA code, or {{\"code\": null}} if you cannot tell.",
            query.raw_text.trim().replace('"', "'")
        )
    }

    /// Extract the guessed code from a completion. Accepts the JSON object
    /// (possibly wrapped in prose or fences) or a bare 3-letter code.
    pub fn parse_guess(text: &str) -> Option<String> {
        let trimmed = text.trim();
        if looks_like_code(&trimmed.to_lowercase()) {
            return Some(trimmed.to_uppercase());
        }
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        if end <= start {
            return None;
        }
        let guess: LlmGuess = serde_json::from_str(&trimmed[start..=end]).ok()?;
        guess
            .code
            .map(|c| c.trim().to_uppercase())
            .filter(|c| looks_like_code(&c.to_lowercase()))
    }

    pub async fn run(
        &self,
        query: &ResolutionQuery,
        gazetteer: &Gazetteer,
        cancel: &CancelToken,
    ) -> Vec<ResolutionCandidate> {
        let prompt = Self::build_prompt(query);
        let text = match self.client.complete(&prompt, &query.context, cancel).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "LLM completion failed, no candidate");
                return Vec::new();
            }
        };
        let Some(code) = Self::parse_guess(&text) else {
            tracing::debug!("LLM reply had no usable guess");
            return Vec::new();
        };
        if !gazetteer.contains_code(&code) {
            tracing::warn!(code = %code, "LLM guessed a code outside the gazetteer");
            return Vec::new();
        }
        vec![ResolutionCandidate::new(code, LLM_CONFIDENCE, LayerKind::Llm)]
    }
}

// ─── Dispatch ───────────────────────────────────────────────────

/// One configured step of the pipeline.
pub enum ResolutionLayer {
    ExactMatch(ExactCodeMatcher),
    FuzzyMatch(FuzzyNameMatcher),
    RegionExpand(RegionalExpander),
    Geocode(GeocodingResolver),
    LlmInterpret(LlmInterpreter),
}

impl ResolutionLayer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::ExactMatch(_) => LayerKind::Exact,
            Self::FuzzyMatch(_) => LayerKind::Fuzzy,
            Self::RegionExpand(_) => LayerKind::Region,
            Self::Geocode(_) => LayerKind::Geocode,
            Self::LlmInterpret(_) => LayerKind::Llm,
        }
    }

    /// Layers that call out over the network.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::Geocode(_) | Self::LlmInterpret(_))
    }

    /// A candidate at or above this confidence stops the pipeline.
    pub fn accept_threshold(&self) -> f64 {
        match self {
            Self::ExactMatch(_) => EXACT_CITY_CONFIDENCE,
            Self::FuzzyMatch(m) => m.accept_threshold,
            Self::RegionExpand(_) => REGION_CONFIDENCE,
            Self::Geocode(_) => GEOCODE_CONFIDENCE,
            Self::LlmInterpret(_) => LLM_CONFIDENCE,
        }
    }

    pub async fn run(
        &self,
        query: &ResolutionQuery,
        gazetteer: &Gazetteer,
        cancel: &CancelToken,
    ) -> Vec<ResolutionCandidate> {
        match self {
            Self::ExactMatch(m) => m.run(query, gazetteer),
            Self::FuzzyMatch(m) => m.run(query, gazetteer),
            Self::RegionExpand(m) => m.run(query, gazetteer),
            Self::Geocode(m) => m.run(query, gazetteer, cancel).await,
            Self::LlmInterpret(m) => m.run(query, gazetteer, cancel).await,
        }
    }
}
