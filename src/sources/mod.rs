//! Source registry
//!
//! The pipeline never reads the feed list directly. It asks a
//! [`SourceRegistry`] for the enabled sources at the start of each run and
//! treats the answer as immutable for that run.

mod registry;

pub use registry::{ConfigRegistry, RegistryError, SourceDescriptor, SourceRegistry};
