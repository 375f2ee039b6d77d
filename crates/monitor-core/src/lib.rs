//! Per-chain contract-creation monitoring engine.
//!
//! Watches one or more chains for newly-deployed contracts, retrieves their
//! bytecode, extracts a CBOR metadata pointer, and hands the pointer to a
//! source fetcher whose assembled contract is routed to a verification and
//! repository pipeline.
//!
//! # Modules
//!
//! - [`monitor`] — [`ChainMonitor`], one instance per chain
//! - [`supervisor`] — [`MonitorSupervisor`], lifecycle fan-out
//! - [`ports`] — trait boundaries for every external collaborator
//! - [`config`] — environment-driven tunables
//! - [`events`] — the structured event taxonomy
//! - [`types`] — core data model
//!
//! # Quick start
//!
//! ```ignore
//! use monitor_core::{MonitorSupervisor, MonitorTunables};
//!
//! let tunables = MonitorTunables::load()?;
//! let supervisor = MonitorSupervisor::new(
//!     vec![], &registry, connector, fetcher, verification, repository,
//!     decoder, address_factory, events, tunables,
//! );
//! supervisor.start().await;
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod monitor;
pub mod ports;
pub mod supervisor;
pub mod types;

pub use config::MonitorTunables;
pub use error::{MonitorError, Result};
pub use events::MonitorEvent;
pub use monitor::ChainMonitor;
pub use ports::{
    ChainRegistry, EventBus, MetadataDecoder, RepositoryService, SourceAddressFactory,
    SourceFetcher, VerificationService,
};
pub use supervisor::MonitorSupervisor;
pub use types::{
    BytecodeTask, CborMetadata, ChainDescriptor, CheckedContract, MonitorState, PaceDirection,
    SourceAddress, VerificationOutcome,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}
