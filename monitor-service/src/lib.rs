//! Concrete adapters wiring `monitor-core`'s ports to real collaborators.

pub mod http_adapters;
pub mod metadata;
pub mod registry;
pub mod telemetry;

pub use http_adapters::{HttpRepository, HttpSourceFetcher, HttpVerificationService};
pub use metadata::CborTrailerDecoder;
pub use registry::EnvChainRegistry;
pub use telemetry::TracingEventBus;
