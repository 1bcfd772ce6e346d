//! redis_facade library - Namespaced command facade for Redis-family stores
//!
//! Provides connection-descriptor parsing, namespace prefix configuration,
//! and generic fault-containing command dispatch over an injected store
//! client.

pub mod client;
pub mod descriptor;
pub mod facade;
pub mod logger;
pub mod memory;
pub mod prefix;

// Re-export the public surface
pub use client::{
    ClientError, ClientOptions, ConnectTarget, Connector, StoreClient, TopologyConfig, Value,
};
pub use descriptor::{
    parse, ConnectionParams, Credentials, DescriptorError, DEFAULT_HOST, DEFAULT_PORT,
};
pub use facade::{
    CommandOutcome, ContainedFault, Facade, FacadeConfig, FacadeError, ServerSpec,
};
pub use logger::{CapturingLogger, FaultLogger, TracingLogger};
pub use prefix::{default_prefix, set_default_prefix, NAMESPACE_SEPARATOR};
