//! Destination resolver: orchestrates the layered pipeline.
//!
//! Flow:  normalize → cache → (single flight) → L1 exact → L2 fuzzy →
//!        L3 region → L4 geocode → L5 LLM → merge → cache → result
//!
//! Each layer runs only if the previous ones produced nothing at or above
//! their acceptance threshold. The whole call is bounded by a wall-clock
//! budget; hitting it returns what was found so far, tagged `degraded`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::cache::{
    CacheLookup, CachePolicy, FileKvStore, Flight, InMemoryKvStore, KeyValueCache, ResolutionCache,
};
use super::cancel::CancelToken;
use super::gazetteer::{Gazetteer, JsonGazetteerLoader};
use super::layers::{
    ExactCodeMatcher, FuzzyNameMatcher, GeocodingResolver, LlmInterpreter, RegionalExpander,
    ResolutionLayer,
};
use super::providers::{ChatCompletionClient, GeocodingClient, LlmClient, NominatimGeocoder};
use super::suggest::SuggestionIndex;
use super::types::{
    DestinationSummary, LayerKind, QueryContext, ResolutionCandidate, ResolutionQuery,
    ResolutionResult, Result,
};
use crate::config::{CacheBackend, ResolverConfig};

/// The destination resolver. Cheap to share behind an `Arc`.
pub struct DestinationResolver {
    gazetteer: Arc<Gazetteer>,
    layers: Vec<ResolutionLayer>,
    cache: ResolutionCache,
    suggestions: SuggestionIndex,
    budget: Duration,
    max_alternatives: usize,
    min_usable_confidence: f64,
}

/// Assembles a resolver from configuration plus optional injected
/// collaborators. Injected pieces win over what the config would build.
pub struct ResolverBuilder {
    config: ResolverConfig,
    gazetteer: Option<Gazetteer>,
    store: Option<Arc<dyn KeyValueCache>>,
    geocoder: Option<Arc<dyn GeocodingClient>>,
    llm: Option<Arc<dyn LlmClient>>,
}

impl ResolverBuilder {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            gazetteer: None,
            store: None,
            geocoder: None,
            llm: None,
        }
    }

    pub fn gazetteer(mut self, gazetteer: Gazetteer) -> Self {
        self.gazetteer = Some(gazetteer);
        self
    }

    pub fn cache_store(mut self, store: Arc<dyn KeyValueCache>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn geocoder(mut self, client: Arc<dyn GeocodingClient>) -> Self {
        self.geocoder = Some(client);
        self
    }

    pub fn llm(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(client);
        self
    }

    pub fn build(self) -> Result<DestinationResolver> {
        let config = self.config;
        config.validate()?;

        let gazetteer = match self.gazetteer {
            Some(g) => g,
            None => match &config.gazetteer.path {
                Some(path) => Gazetteer::from_loader(&JsonGazetteerLoader::new(path))?,
                None => Gazetteer::builtin()?,
            },
        };

        let store: Arc<dyn KeyValueCache> = match self.store {
            Some(store) => store,
            None => match config.cache.backend {
                CacheBackend::Memory => Arc::new(InMemoryKvStore::new()),
                CacheBackend::File => match &config.cache.path {
                    Some(path) => Arc::new(FileKvStore::load_from(path.clone())),
                    None => Arc::new(FileKvStore::load()),
                },
            },
        };
        let policy = CachePolicy {
            positive_ttl: Duration::from_secs(config.cache.positive_ttl_secs),
            negative_ttl: Duration::from_secs(config.cache.negative_ttl_secs),
            in_flight_ttl: config.pipeline.budget(),
        };

        let geocoder = self.geocoder.or_else(|| {
            config
                .geocoding
                .enabled
                .then(|| Arc::new(NominatimGeocoder::new(&config.geocoding)) as Arc<dyn GeocodingClient>)
        });
        let llm = self.llm.or_else(|| {
            config
                .llm
                .enabled
                .then(|| Arc::new(ChatCompletionClient::new(&config.llm)) as Arc<dyn LlmClient>)
        });

        let mut layers = Vec::new();
        for kind in config.pipeline.layer_kinds()? {
            let layer = match kind {
                LayerKind::Exact => ResolutionLayer::ExactMatch(ExactCodeMatcher),
                LayerKind::Fuzzy => ResolutionLayer::FuzzyMatch(FuzzyNameMatcher {
                    floor: config.fuzzy.floor,
                    top_n: config.fuzzy.top_n,
                    accept_threshold: config.fuzzy.accept_threshold,
                }),
                LayerKind::Region => ResolutionLayer::RegionExpand(RegionalExpander {
                    floor: config.fuzzy.floor,
                }),
                LayerKind::Geocode => match &geocoder {
                    Some(client) => ResolutionLayer::Geocode(GeocodingResolver::new(
                        client.clone(),
                        config.geocoding.radius_km,
                    )),
                    None => {
                        tracing::debug!("geocoding disabled, layer skipped");
                        continue;
                    }
                },
                LayerKind::Llm => match &llm {
                    Some(client) => ResolutionLayer::LlmInterpret(LlmInterpreter::new(client.clone())),
                    None => {
                        tracing::debug!("LLM disabled, layer skipped");
                        continue;
                    }
                },
            };
            layers.push(layer);
        }

        let suggestions = SuggestionIndex::build(&gazetteer);
        tracing::info!(
            destinations = gazetteer.len(),
            regions = gazetteer.regions().len(),
            layers = ?layers.iter().map(|l| l.kind().config_name()).collect::<Vec<_>>(),
            "destination resolver ready"
        );

        Ok(DestinationResolver {
            gazetteer: Arc::new(gazetteer),
            layers,
            cache: ResolutionCache::new(store, policy),
            suggestions,
            budget: config.pipeline.budget(),
            max_alternatives: config.pipeline.max_alternatives,
            min_usable_confidence: config.pipeline.min_usable_confidence,
        })
    }
}

impl DestinationResolver {
    pub fn builder(config: ResolverConfig) -> ResolverBuilder {
        ResolverBuilder::new(config)
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        ResolverBuilder::new(config.clone()).build()
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    pub fn layer_kinds(&self) -> Vec<LayerKind> {
        self.layers.iter().map(ResolutionLayer::kind).collect()
    }

    /// Resolve with only the configured budget as deadline.
    pub async fn resolve(&self, raw: &str, context: QueryContext) -> ResolutionResult {
        self.resolve_with_cancel(raw, context, &CancelToken::never()).await
    }

    /// Resolve under the caller's token, capped by the configured budget.
    pub async fn resolve_with_cancel(
        &self,
        raw: &str,
        context: QueryContext,
        cancel: &CancelToken,
    ) -> ResolutionResult {
        let started = Instant::now();
        let query = ResolutionQuery::new(raw, context);
        if query.is_empty() {
            tracing::debug!("empty query after normalization");
            return ResolutionResult::unresolved();
        }

        let cancel = cancel.with_timeout(self.budget);
        let result = self.resolve_coalesced(&query, &cancel).await;

        tracing::info!(
            query = %query.normalized_text,
            resolved = result.resolved,
            primary = result.primary_code().unwrap_or("-"),
            layer = ?result.resolution_layer.map(LayerKind::number),
            degraded = result.degraded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "resolve"
        );
        result
    }

    async fn resolve_coalesced(&self, query: &ResolutionQuery, cancel: &CancelToken) -> ResolutionResult {
        let key = ResolutionCache::key_for(query);
        loop {
            if let Some(cached) = self.cached(&key).await {
                return cached;
            }

            match self.cache.acquire(&key) {
                Flight::Leader(guard) => {
                    // A previous leader may have stored between our lookup and acquire.
                    if let Some(cached) = self.cached(&key).await {
                        guard.publish(&cached);
                        return cached;
                    }

                    let mut marked = self.cache.mark_in_flight(&key).await;
                    if !marked {
                        tracing::debug!("in-flight marker held elsewhere, waiting on the store");
                        match cancel.run_until_cancelled(self.cache.wait_for_remote(&key)).await {
                            Some(Some(result)) => {
                                guard.publish(&result);
                                return result;
                            }
                            Some(None) => marked = self.cache.mark_in_flight(&key).await,
                            None => {
                                drop(guard);
                                return self.local_fallback(query).await;
                            }
                        }
                    }

                    let result = self.run_pipeline(query, cancel, true).await;
                    if result.degraded {
                        // Degraded results are neither cached nor shared with waiters.
                        if marked {
                            self.cache.clear_in_flight(&key).await;
                        }
                        drop(guard);
                    } else {
                        self.cache.store(&key, &result).await;
                        guard.publish(&result);
                    }
                    return result;
                }
                Flight::Follower(rx) => {
                    tracing::debug!("joining in-flight resolution");
                    match cancel.run_until_cancelled(ResolutionCache::wait(rx)).await {
                        Some(Some(result)) => return result,
                        Some(None) => continue,
                        None => return self.local_fallback(query).await,
                    }
                }
            }
        }
    }

    /// Best effort from the in-memory layers after the deadline passed while
    /// waiting on another resolution. Always degraded.
    async fn local_fallback(&self, query: &ResolutionQuery) -> ResolutionResult {
        tracing::warn!("deadline reached while waiting, using local layers only");
        self.run_pipeline(query, &CancelToken::never(), false)
            .await
            .into_degraded()
    }

    async fn cached(&self, key: &str) -> Option<ResolutionResult> {
        match self.cache.lookup(key).await {
            CacheLookup::Hit(result) => {
                tracing::debug!("cache hit");
                Some(result)
            }
            CacheLookup::NegativeHit => {
                tracing::debug!("negative cache hit");
                Some(ResolutionResult::unresolved())
            }
            CacheLookup::InFlight | CacheLookup::Miss => None,
        }
    }

    /// Run the layers in order, stopping at the first one that clears its
    /// acceptance threshold or when the token fires. With `include_external`
    /// unset only the in-memory layers run.
    async fn run_pipeline(
        &self,
        query: &ResolutionQuery,
        cancel: &CancelToken,
        include_external: bool,
    ) -> ResolutionResult {
        let mut seen: Vec<ResolutionCandidate> = Vec::new();
        let mut degraded = false;

        for layer in &self.layers {
            if layer.is_external() && !include_external {
                continue;
            }
            let kind = layer.kind();
            if kind == LayerKind::Llm && seen.iter().any(|c| c.confidence >= self.min_usable_confidence) {
                tracing::debug!("usable candidate found, LLM skipped");
                continue;
            }
            if cancel.is_cancelled() {
                degraded = true;
                break;
            }

            let found = cancel
                .run_until_cancelled(layer.run(query, &self.gazetteer, cancel))
                .await;
            let Some(found) = found.filter(|_| !cancel.is_cancelled()) else {
                tracing::warn!(layer = %kind, "deadline reached, returning partial result");
                degraded = true;
                break;
            };

            let threshold = layer.accept_threshold();
            let accepted = found.iter().any(|c| c.confidence >= threshold);
            tracing::debug!(layer = %kind, candidates = found.len(), accepted, "layer finished");
            seen.extend(found);
            if accepted {
                break;
            }
        }

        ResolutionResult::from_candidates(seen, self.max_alternatives, degraded)
    }

    /// Autocomplete; never touches the cache or the network.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<DestinationSummary> {
        self.suggestions.get_suggestions(prefix, limit)
    }

    pub fn destinations(&self) -> Vec<DestinationSummary> {
        self.gazetteer.summaries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> DestinationResolver {
        DestinationResolver::from_config(&ResolverConfig::default().offline()).unwrap()
    }

    #[tokio::test]
    async fn test_offline_has_three_layers() {
        let resolver = offline();
        assert_eq!(
            resolver.layer_kinds(),
            vec![LayerKind::Exact, LayerKind::Fuzzy, LayerKind::Region]
        );
    }

    #[tokio::test]
    async fn test_exact_code() {
        let result = offline().resolve("LHR", QueryContext::default()).await;
        assert!(result.resolved);
        assert_eq!(result.primary_code(), Some("LHR"));
        assert_eq!(result.resolution_layer, Some(LayerKind::Exact));
        assert!(!result.degraded);
    }

    #[tokio::test]
    async fn test_fuzzy_typo() {
        let result = offline().resolve("stokholm", QueryContext::default()).await;
        assert!(result.resolved);
        assert_eq!(result.resolution_layer, Some(LayerKind::Fuzzy));
        assert_eq!(result.primary_code(), Some("STO"));
    }

    #[tokio::test]
    async fn test_blank_query_unresolved() {
        let result = offline().resolve("  ?! ", QueryContext::default()).await;
        assert_eq!(result, ResolutionResult::unresolved());
    }

    #[tokio::test]
    async fn test_layer_order_follows_config() {
        let mut config = ResolverConfig::default().offline();
        config.pipeline.layers = vec!["region".into(), "exact".into()];
        let resolver = DestinationResolver::from_config(&config).unwrap();
        assert_eq!(resolver.layer_kinds(), vec![LayerKind::Region, LayerKind::Exact]);

        // Fuzzy is disabled, so a typo no longer resolves.
        let result = resolver.resolve("barcelonna", QueryContext::default()).await;
        assert!(!result.resolved);
    }

    #[tokio::test]
    async fn test_cancelled_token_degrades() {
        let source = crate::destination::cancel::CancelSource::new();
        let token = source.token();
        source.cancel();
        let result = offline()
            .resolve_with_cancel("Barcelona", QueryContext::default(), &token)
            .await;
        assert!(result.degraded);
        assert!(!result.resolved);
    }

    #[test]
    fn test_suggest_and_listing() {
        let resolver = offline();
        assert_eq!(resolver.suggest("lis", 3)[0].code, "LIS");
        assert_eq!(resolver.destinations().len(), resolver.gazetteer().len());
    }
}
