//! Waypoint destination resolver: free-form travel text to IATA codes.

pub mod config;
pub mod destination;
pub mod logging;
pub mod server;

pub use config::ResolverConfig;
pub use destination::{DestinationResolver, QueryContext, ResolutionResult, ResolveError};
