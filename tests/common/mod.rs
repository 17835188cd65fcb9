#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use waypoint_resolver::config::ResolverConfig;
use waypoint_resolver::destination::types::Result;
use waypoint_resolver::destination::{
    CancelToken, Coordinates, Destination, DestinationKind, DestinationResolver, GeoBias,
    Gazetteer, GeocodingClient, LlmClient, QueryContext, RegionMapping,
};

/// Central Nice; the nearest airport is NCE.
pub const NICE_CENTRE: Coordinates = Coordinates { lat: 43.6966, lon: 7.2760 };

/// Geocoder that counts calls and answers after an optional delay.
pub struct CountingGeocoder {
    pub calls: AtomicUsize,
    pub saw_deadline: AtomicBool,
    answer: Option<Coordinates>,
    delay: Duration,
}

impl CountingGeocoder {
    pub fn new(answer: Option<Coordinates>) -> Arc<Self> {
        Self::slow(answer, Duration::ZERO)
    }

    pub fn slow(answer: Option<Coordinates>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            saw_deadline: AtomicBool::new(false),
            answer,
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodingClient for CountingGeocoder {
    async fn geocode(&self, _text: &str, _bias: &GeoBias, cancel: &CancelToken) -> Result<Option<Coordinates>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if cancel.deadline().is_some() {
            self.saw_deadline.store(true, Ordering::SeqCst);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.answer)
    }
}

/// LLM that counts calls and always replies with the same text.
pub struct CountingLlm {
    pub calls: AtomicUsize,
    reply: String,
}

impl CountingLlm {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reply: reply.to_string(),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for CountingLlm {
    async fn complete(&self, _prompt: &str, _context: &QueryContext, _cancel: &CancelToken) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Builtin gazetteer with both network layers backed by the given mocks.
pub fn resolver_with(
    config: ResolverConfig,
    geocoder: Arc<CountingGeocoder>,
    llm: Arc<CountingLlm>,
) -> DestinationResolver {
    DestinationResolver::builder(config)
        .geocoder(geocoder)
        .llm(llm)
        .build()
        .unwrap()
}

fn dest(code: &str, name: &str, aliases: &[&str], lat: f64, lon: f64) -> Destination {
    Destination {
        code: code.into(),
        kind: DestinationKind::Airport,
        display_name: name.into(),
        country: "FR".into(),
        coordinates: Coordinates::new(lat, lon),
        aliases: aliases.iter().map(|a| a.to_string()).collect::<BTreeSet<_>>(),
        timezone: Some("Europe/Paris".into()),
        priority: 50,
    }
}

/// Small gazetteer where "riviera" hits both a destination alias (weakly)
/// and a region.
pub fn riviera_fixture() -> Gazetteer {
    Gazetteer::new(
        vec![
            dest("NCE", "Nice Airport", &["nice", "rivieras"], 43.6584, 7.2159),
            dest("CEQ", "Cannes Mandelieu Airport", &["cannes"], 43.5420, 6.9534),
            dest("TLN", "Toulon Hyeres Airport", &["toulon"], 43.0973, 6.1460),
        ],
        vec![RegionMapping {
            region_name: "Riviera".into(),
            aliases: vec!["azur coast".into()],
            member_codes: vec!["CEQ".into(), "NCE".into()],
        }],
    )
    .unwrap()
}
