//! Core types for the destination subsystem.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use super::normalize::normalize_text;

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Whether a code names a bookable airport or a metropolitan city area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    Airport,
    City,
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Airport => write!(f, "airport"),
            Self::City => write!(f, "city"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle (haversine) distance in kilometres.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// A known destination. Identity is `(code, kind)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub code: String,
    pub kind: DestinationKind,
    pub display_name: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    /// IANA timezone of the destination (e.g. "Europe/Paris")
    #[serde(default)]
    pub timezone: Option<String>,
    /// Static suggestion rank; higher sorts first.
    #[serde(default)]
    pub priority: u32,
}

impl Destination {
    pub fn summary(&self) -> DestinationSummary {
        DestinationSummary {
            code: self.code.clone(),
            kind: self.kind,
            display_name: self.display_name.clone(),
            country: self.country.clone(),
        }
    }
}

/// A curated region ("french riviera") and its ordered member codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMapping {
    pub region_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub member_codes: Vec<String>,
}

/// Lightweight destination view returned by autocomplete and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationSummary {
    pub code: String,
    pub kind: DestinationKind,
    pub display_name: String,
    pub country: String,
}

/// Caller-supplied context that may change the outcome of a resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    #[serde(default)]
    pub departure_country: Option<String>,
    #[serde(default)]
    pub bias_lat: Option<f64>,
    #[serde(default)]
    pub bias_lon: Option<f64>,
}

impl QueryContext {
    pub fn with_departure_country(country: impl Into<String>) -> Self {
        Self {
            departure_country: Some(country.into()),
            ..Self::default()
        }
    }

    /// The bias point, only when both coordinates are present and in range.
    pub fn bias_point(&self) -> Option<Coordinates> {
        match (self.bias_lat, self.bias_lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)).filter(Coordinates::is_valid),
            _ => None,
        }
    }
}

/// A query after input normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionQuery {
    pub raw_text: String,
    pub normalized_text: String,
    pub context: QueryContext,
}

impl ResolutionQuery {
    pub fn new(raw_text: &str, context: QueryContext) -> Self {
        Self {
            raw_text: raw_text.to_string(),
            normalized_text: normalize_text(raw_text),
            context,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized_text.is_empty()
    }
}

/// The five resolution strategies, numbered in ascending cost order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum LayerKind {
    Exact = 1,
    Fuzzy = 2,
    Region = 3,
    Geocode = 4,
    Llm = 5,
}

impl LayerKind {
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Name used in configuration files.
    pub fn config_name(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Region => "region",
            Self::Geocode => "geocode",
            Self::Llm => "llm",
        }
    }

    pub fn from_config_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "exact" => Some(Self::Exact),
            "fuzzy" => Some(Self::Fuzzy),
            "region" => Some(Self::Region),
            "geocode" => Some(Self::Geocode),
            "llm" => Some(Self::Llm),
            _ => None,
        }
    }
}

impl From<LayerKind> for u8 {
    fn from(kind: LayerKind) -> u8 {
        kind.number()
    }
}

impl TryFrom<u8> for LayerKind {
    type Error = String;

    fn try_from(n: u8) -> std::result::Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::Exact),
            2 => Ok(Self::Fuzzy),
            3 => Ok(Self::Region),
            4 => Ok(Self::Geocode),
            5 => Ok(Self::Llm),
            other => Err(format!("unknown resolution layer {}", other)),
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{} ({})", self.number(), self.config_name())
    }
}

/// One candidate destination produced by a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionCandidate {
    pub destination_code: String,
    pub confidence: f64,
    pub source_layer: LayerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_alias: Option<String>,
}

impl ResolutionCandidate {
    pub fn new(code: impl Into<String>, confidence: f64, source_layer: LayerKind) -> Self {
        Self {
            destination_code: code.into(),
            confidence,
            source_layer,
            matched_alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.matched_alias = Some(alias.into());
        self
    }
}

/// Callers should confirm with the user below this confidence.
pub const AUTO_PROCEED_CONFIDENCE: f64 = 0.85;

/// Final outcome of a resolution call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub resolved: bool,
    pub primary: Option<ResolutionCandidate>,
    pub alternatives: Vec<ResolutionCandidate>,
    pub resolution_layer: Option<LayerKind>,
    #[serde(default)]
    pub degraded: bool,
}

impl ResolutionResult {
    pub fn unresolved() -> Self {
        Self {
            resolved: false,
            primary: None,
            alternatives: Vec::new(),
            resolution_layer: None,
            degraded: false,
        }
    }

    pub fn into_degraded(mut self) -> Self {
        self.degraded = true;
        self
    }

    /// Merge everything the layers produced into a ranked result.
    ///
    /// Duplicate codes keep their highest confidence (the earliest, i.e.
    /// cheapest, layer wins a tie). Ordering is confidence desc, then layer
    /// asc, then emission order, so curated region order survives.
    pub fn from_candidates(
        candidates: Vec<ResolutionCandidate>,
        max_alternatives: usize,
        degraded: bool,
    ) -> Self {
        let mut merged: Vec<ResolutionCandidate> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match merged
                .iter_mut()
                .find(|c| c.destination_code == candidate.destination_code)
            {
                Some(existing) => {
                    if candidate.confidence > existing.confidence {
                        *existing = candidate;
                    }
                }
                None => merged.push(candidate),
            }
        }

        merged.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.source_layer.cmp(&b.source_layer))
        });
        merged.truncate(max_alternatives);

        let primary = merged.first().cloned();
        Self {
            resolved: primary.is_some(),
            resolution_layer: primary.as_ref().map(|c| c.source_layer),
            primary,
            alternatives: merged,
            degraded,
        }
    }

    pub fn primary_code(&self) -> Option<&str> {
        self.primary.as_ref().map(|c| c.destination_code.as_str())
    }

    /// True when the caller should offer `alternatives` before proceeding.
    pub fn needs_confirmation(&self) -> bool {
        match &self.primary {
            Some(p) => p.confidence < AUTO_PROCEED_CONFIDENCE,
            None => false,
        }
    }
}

/// Errors raised inside the destination subsystem.
///
/// Collaborator failures are absorbed by the layers; only loading and
/// configuration errors reach callers.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Gazetteer error: {0}")]
    Gazetteer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Cache backend error: {0}")]
    Cache(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cand(code: &str, confidence: f64, layer: LayerKind) -> ResolutionCandidate {
        ResolutionCandidate::new(code, confidence, layer)
    }

    #[test]
    fn test_merge_keeps_highest_confidence_per_code() {
        let result = ResolutionResult::from_candidates(
            vec![
                cand("NCE", 0.87, LayerKind::Fuzzy),
                cand("NCE", 0.85, LayerKind::Region),
                cand("CEQ", 0.85, LayerKind::Region),
            ],
            5,
            false,
        );
        assert_eq!(result.alternatives.len(), 2);
        assert_eq!(result.alternatives[0].destination_code, "NCE");
        assert_eq!(result.alternatives[0].source_layer, LayerKind::Fuzzy);
        assert_eq!(result.primary.as_ref(), result.alternatives.first());
        assert_eq!(result.resolution_layer, Some(LayerKind::Fuzzy));
    }

    #[test]
    fn test_merge_orders_by_layer_on_equal_confidence() {
        let result = ResolutionResult::from_candidates(
            vec![cand("AAA", 0.85, LayerKind::Region), cand("BBB", 0.85, LayerKind::Fuzzy)],
            5,
            false,
        );
        assert_eq!(result.primary_code(), Some("BBB"));
    }

    #[test]
    fn test_merge_preserves_emission_order_within_layer() {
        let result = ResolutionResult::from_candidates(
            vec![
                cand("NCE", 0.85, LayerKind::Region),
                cand("CEQ", 0.85, LayerKind::Region),
                cand("MCM", 0.85, LayerKind::Region),
            ],
            2,
            false,
        );
        let codes: Vec<_> = result.alternatives.iter().map(|c| c.destination_code.as_str()).collect();
        assert_eq!(codes, vec!["NCE", "CEQ"]);
    }

    #[test]
    fn test_empty_candidates_unresolved() {
        let result = ResolutionResult::from_candidates(vec![], 5, true);
        assert!(!result.resolved);
        assert!(result.primary.is_none());
        assert!(result.degraded);
        assert!(!result.needs_confirmation());
    }

    #[test]
    fn test_needs_confirmation_below_threshold() {
        let result = ResolutionResult::from_candidates(vec![cand("NCE", 0.75, LayerKind::Geocode)], 5, false);
        assert!(result.needs_confirmation());
        let sure = ResolutionResult::from_candidates(vec![cand("JFK", 0.95, LayerKind::Exact)], 5, false);
        assert!(!sure.needs_confirmation());
    }

    #[test]
    fn test_layer_kind_serializes_as_number() {
        let json = serde_json::to_string(&cand("JFK", 0.95, LayerKind::Exact)).unwrap();
        assert!(json.contains("\"source_layer\":1"));
        let back: ResolutionCandidate = serde_json::from_str(&json).unwrap();
        assert_eq!(back.source_layer, LayerKind::Exact);
        assert!(serde_json::from_str::<LayerKind>("9").is_err());
    }

    #[test]
    fn test_layer_kind_from_number() {
        for n in 1..=5u8 {
            assert_eq!(LayerKind::try_from(n).map(LayerKind::number), Ok(n));
        }
        assert_eq!(LayerKind::try_from(0), Err("unknown resolution layer 0".to_string()));
    }

    #[test]
    fn test_distance_km() {
        // JFK to LHR is roughly 5540 km
        let jfk = Coordinates::new(40.6413, -73.7781);
        let lhr = Coordinates::new(51.4700, -0.4543);
        assert_relative_eq!(jfk.distance_km(&lhr), 5540.0, epsilon = 25.0);
        assert_relative_eq!(jfk.distance_km(&jfk), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bias_point_requires_both_coordinates() {
        let ctx = QueryContext { bias_lat: Some(43.7), ..QueryContext::default() };
        assert!(ctx.bias_point().is_none());
        let ctx = QueryContext { bias_lat: Some(43.7), bias_lon: Some(7.2), ..QueryContext::default() };
        assert!(ctx.bias_point().is_some());
        let ctx = QueryContext { bias_lat: Some(123.0), bias_lon: Some(7.2), ..QueryContext::default() };
        assert!(ctx.bias_point().is_none());
    }

    #[test]
    fn test_query_normalizes() {
        let q = ResolutionQuery::new("  Côte d'Azur ", QueryContext::default());
        assert_eq!(q.normalized_text, "cote dazur");
        assert!(!q.is_empty());
        assert!(ResolutionQuery::new(" ?! ", QueryContext::default()).is_empty());
    }
}
