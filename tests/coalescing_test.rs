mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{resolver_with, CountingGeocoder, CountingLlm, NICE_CENTRE};
use waypoint_resolver::config::ResolverConfig;
use waypoint_resolver::destination::cache::{CacheLookup, CachePolicy};
use waypoint_resolver::destination::types::ResolutionQuery;
use waypoint_resolver::destination::{
    CancelSource, CancelToken, DestinationResolver, InMemoryKvStore, KeyValueCache, LayerKind,
    QueryContext, ResolutionCache,
};

fn shared_resolver(
    store: Arc<dyn KeyValueCache>,
    config: ResolverConfig,
    geo: Arc<CountingGeocoder>,
) -> DestinationResolver {
    DestinationResolver::builder(config)
        .cache_store(store)
        .geocoder(geo)
        .llm(CountingLlm::new("{\"code\": null}"))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_concurrent_identical_queries_share_one_run() {
    let geo = CountingGeocoder::slow(Some(NICE_CENTRE), Duration::from_millis(200));
    let llm = CountingLlm::new("{\"code\": null}");
    let resolver = Arc::new(resolver_with(ResolverConfig::default(), geo.clone(), llm.clone()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let resolver = resolver.clone();
        handles.push(tokio::spawn(async move {
            resolver.resolve("old town of nice by the sea", QueryContext::default()).await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(geo.calls(), 1);
    assert_eq!(llm.calls(), 0);
    for result in &results {
        assert_eq!(result, &results[0]);
        assert_eq!(result.primary_code(), Some("NCE"));
        assert_eq!(result.resolution_layer, Some(LayerKind::Geocode));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_multi_thread() {
    let geo = CountingGeocoder::slow(None, Duration::from_millis(150));
    let llm = CountingLlm::new("{\"code\": \"NCE\"}");
    let resolver = Arc::new(resolver_with(ResolverConfig::default(), geo.clone(), llm.clone()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve("the bay of angels", QueryContext::default()).await })
        })
        .collect();
    for handle in handles {
        let result = handle.await.unwrap();
        assert_eq!(result.primary_code(), Some("NCE"));
        assert_eq!(result.resolution_layer, Some(LayerKind::Llm));
    }
    assert_eq!(geo.calls(), 1);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_unrelated_queries_do_not_coalesce() {
    let geo = CountingGeocoder::slow(None, Duration::from_millis(50));
    let llm = CountingLlm::new("{\"code\": null}");
    let resolver = Arc::new(resolver_with(ResolverConfig::default(), geo.clone(), llm.clone()));

    let a = {
        let resolver = resolver.clone();
        tokio::spawn(async move { resolver.resolve("qwxz first place", QueryContext::default()).await })
    };
    let b = {
        let resolver = resolver.clone();
        tokio::spawn(async move { resolver.resolve("qwxz second place", QueryContext::default()).await })
    };
    assert!(!a.await.unwrap().resolved);
    assert!(!b.await.unwrap().resolved);
    assert_eq!(geo.calls(), 2);
}

#[tokio::test]
async fn test_follower_retries_after_leader_cancelled() {
    let geo = CountingGeocoder::slow(Some(NICE_CENTRE), Duration::from_millis(300));
    let llm = CountingLlm::new("{\"code\": null}");
    let resolver = Arc::new(resolver_with(ResolverConfig::default(), geo.clone(), llm.clone()));

    let source = CancelSource::new();
    let leader = {
        let resolver = resolver.clone();
        let token = source.token();
        tokio::spawn(async move {
            resolver
                .resolve_with_cancel("harbour near nice old town", QueryContext::default(), &token)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let follower = {
        let resolver = resolver.clone();
        tokio::spawn(async move { resolver.resolve("harbour near nice old town", QueryContext::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    source.cancel();

    let cancelled = leader.await.unwrap();
    assert!(cancelled.degraded);

    // The follower takes over and finishes the run itself.
    let finished = follower.await.unwrap();
    assert!(!finished.degraded);
    assert_eq!(finished.primary_code(), Some("NCE"));
    assert_eq!(geo.calls(), 2);
}

#[tokio::test]
async fn test_waiter_past_deadline_gets_local_candidate() {
    let geo = CountingGeocoder::slow(Some(NICE_CENTRE), Duration::from_secs(3));
    let llm = CountingLlm::new("{\"code\": null}");
    let resolver = Arc::new(resolver_with(ResolverConfig::default(), geo.clone(), llm.clone()));

    let leader = {
        let resolver = resolver.clone();
        tokio::spawn(async move { resolver.resolve("stokholm", QueryContext::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let token = CancelToken::never().with_timeout(Duration::from_millis(100));
    let result = resolver
        .resolve_with_cancel("stokholm", QueryContext::default(), &token)
        .await;
    assert!(result.degraded);
    assert!(result.resolved);
    assert_eq!(result.primary_code(), Some("STO"));
    assert_eq!(result.resolution_layer, Some(LayerKind::Fuzzy));
    // Only the leader reached the geocoder.
    assert_eq!(geo.calls(), 1);
    leader.abort();
}

#[tokio::test]
async fn test_resolvers_sharing_a_store_coalesce() {
    let store: Arc<dyn KeyValueCache> = Arc::new(InMemoryKvStore::new());
    let geo_a = CountingGeocoder::slow(None, Duration::from_millis(200));
    let geo_b = CountingGeocoder::slow(None, Duration::from_millis(200));
    let a = Arc::new(shared_resolver(store.clone(), ResolverConfig::default(), geo_a.clone()));
    let b = shared_resolver(store, ResolverConfig::default(), geo_b.clone());

    let first = {
        let a = a.clone();
        tokio::spawn(async move { a.resolve("glorbnik", QueryContext::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = b.resolve("glorbnik", QueryContext::default()).await;
    assert!(!second.resolved);
    assert!(!second.degraded);
    assert!(!first.await.unwrap().resolved);
    assert_eq!(geo_a.calls() + geo_b.calls(), 1);
}

#[tokio::test]
async fn test_degraded_run_keeps_foreign_marker() {
    let store: Arc<dyn KeyValueCache> = Arc::new(InMemoryKvStore::new());
    let other = ResolutionCache::new(
        store.clone(),
        CachePolicy {
            in_flight_ttl: Duration::from_secs(5),
            ..CachePolicy::default()
        },
    );
    let key = ResolutionCache::key_for(&ResolutionQuery::new("stokholm", QueryContext::default()));
    assert!(other.mark_in_flight(&key).await);

    let mut config = ResolverConfig::default();
    config.pipeline.budget_ms = 150;
    let geo = CountingGeocoder::new(Some(NICE_CENTRE));
    let resolver = shared_resolver(store, config, geo.clone());

    let result = resolver.resolve("stokholm", QueryContext::default()).await;
    assert!(result.degraded);
    assert_eq!(result.primary_code(), Some("STO"));
    assert_eq!(geo.calls(), 0);

    // The other process still owns the key.
    assert_eq!(other.lookup(&key).await, CacheLookup::InFlight);
    assert!(!other.mark_in_flight(&key).await);
}
