//! Groundwork core: type metadata and diagnostics seams.
//!
//! This crate defines the two collaborators the execution engine consumes
//! from the outside — a type metadata provider and a diagnostic monitor —
//! together with the portable descriptors they exchange.

#![warn(missing_docs)]

mod descriptor;
mod key;
mod monitor;
mod provider;

pub use descriptor::{IntrinsicRole, MethodDesc, MethodFlags, ParamDesc, TypeDesc, TypeShape};
pub use key::TypeKey;
pub use monitor::{BufferMonitor, Monitor, MonitorEntry, MonitorLevel, TracingMonitor};
pub use provider::{MetadataProvider, MetadataRegistry};
