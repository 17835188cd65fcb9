//! Destination resolution subsystem for Waypoint.
//!
//! Turns free-form travel text into airport/city codes through five
//! layers (exact code, fuzzy name, curated region, geocoding, LLM), with
//! a result cache, single-flight coalescing and a prefix suggestion index.

pub mod builtin;
pub mod cache;
pub mod cancel;
pub mod gazetteer;
pub mod layers;
pub mod normalize;
pub mod providers;
pub mod resolver;
pub mod suggest;
pub mod types;

pub use cache::{FileKvStore, InMemoryKvStore, KeyValueCache, ResolutionCache};
pub use cancel::{CancelSource, CancelToken};
pub use gazetteer::{Gazetteer, GazetteerLoader, JsonGazetteerLoader};
pub use providers::{GeoBias, GeocodingClient, LlmClient};
pub use resolver::{DestinationResolver, ResolverBuilder};
pub use types::{
    Coordinates, Destination, DestinationKind, DestinationSummary, LayerKind, QueryContext,
    RegionMapping, ResolutionCandidate, ResolutionResult, ResolveError,
};
