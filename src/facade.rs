//! Namespaced command facade.
//!
//! A [`Facade`] owns one underlying store client, the resolved namespace
//! prefix for that client, and an optional fault logger. Construction
//! resolves flexible connection input (descriptor string, pre-built
//! parameters, or a multi-node topology) into a [`ConnectTarget`], builds
//! the client through an injected [`Connector`], and selects a database when
//! one was chosen. Dispatch forwards arbitrary commands and contains
//! client-layer faults instead of propagating them.
//!
//! # Type Decisions
//!
//! **Why does `invoke` return [`CommandOutcome`] instead of a bare value?**
//! The source contract collapses failures into a `false` sentinel, which
//! makes "command failed" indistinguishable from "command legitimately
//! returned false". The outcome type keeps the two apart and carries the
//! fault detail; [`CommandOutcome::into_value`] still produces the uniform
//! `Bool(false)` sentinel for callers that want the collapsed form.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::{
    ClientError, ClientOptions, ConnectTarget, Connector, StoreClient, TopologyConfig, Value,
};
use crate::descriptor::{self, ConnectionParams, DescriptorError};
use crate::logger::FaultLogger;
use crate::prefix;

/// Construction error types.
///
/// These fail loudly: a bad descriptor or an unreachable store is a
/// configuration problem to fix before any command can be issued, unlike
/// the contained faults of [`Facade::invoke`].
#[derive(Error, Debug)]
pub enum FacadeError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("failed to connect to store: {source}")]
    Connect { source: ClientError },

    #[error("failed to select database {database}: {source}")]
    Select { database: i64, source: ClientError },
}

/// Connection input accepted by [`Facade::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerSpec {
    /// Descriptor string, resolved through [`descriptor::parse`].
    Descriptor(String),
    /// Pre-built parameters for a single node.
    Params(ConnectionParams),
    /// Multi-node configuration, passed through to the connector unchanged.
    Topology(TopologyConfig),
}

impl From<&str> for ServerSpec {
    fn from(descriptor: &str) -> Self {
        ServerSpec::Descriptor(descriptor.to_string())
    }
}

impl From<String> for ServerSpec {
    fn from(descriptor: String) -> Self {
        ServerSpec::Descriptor(descriptor)
    }
}

impl From<ConnectionParams> for ServerSpec {
    fn from(params: ConnectionParams) -> Self {
        ServerSpec::Params(params)
    }
}

impl From<TopologyConfig> for ServerSpec {
    fn from(topology: TopologyConfig) -> Self {
        ServerSpec::Topology(topology)
    }
}

/// Construction-time facade configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacadeConfig {
    /// Namespace prefix. `None` reads the process-wide default at
    /// construction time; the resolved value is normalized to end with the
    /// namespace separator.
    pub prefix: Option<String>,
    /// Transport options forwarded opaquely to the connector.
    pub client_options: std::collections::BTreeMap<String, String>,
}

/// A command fault that was caught at the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainedFault {
    /// Name of the command that faulted.
    pub command: String,
    /// Diagnostic detail from the underlying client.
    pub detail: String,
}

/// Result of one dispatched command: the client's raw reply, or a contained
/// fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success(Value),
    Contained(ContainedFault),
}

impl CommandOutcome {
    /// True when the command faulted and the fault was contained.
    pub fn is_contained(&self) -> bool {
        matches!(self, CommandOutcome::Contained(_))
    }

    /// The successful reply, when there is one.
    pub fn success(&self) -> Option<&Value> {
        match self {
            CommandOutcome::Success(value) => Some(value),
            CommandOutcome::Contained(_) => None,
        }
    }

    /// Collapse to the uniform sentinel: the raw reply on success,
    /// `Value::Bool(false)` on a contained fault.
    ///
    /// Callers of this form cannot distinguish a failure from a command
    /// that legitimately replied `false`; keep the outcome when that
    /// distinction matters.
    pub fn into_value(self) -> Value {
        match self {
            CommandOutcome::Success(value) => value,
            CommandOutcome::Contained(_) => Value::Bool(false),
        }
    }
}

/// Client-facing object combining prefix bookkeeping and generic command
/// dispatch over an underlying store client.
pub struct Facade {
    client: Box<dyn StoreClient>,
    prefix: String,
    logger: Option<Arc<dyn FaultLogger>>,
}

impl std::fmt::Debug for Facade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Facade")
            .field("prefix", &self.prefix)
            .field("logger", &self.logger.as_ref().map(|_| "<logger>"))
            .finish_non_exhaustive()
    }
}

impl Facade {
    /// Construct a facade over a freshly connected store client.
    ///
    /// `server` is resolved first: descriptor strings go through the
    /// descriptor parser, and a database index embedded in the descriptor
    /// (or in pre-built parameters) overrides the `database` argument.
    /// Topologies pass through unchanged, so only the `database` argument
    /// applies there. When a database index resolves, a `select` is issued
    /// against the new client before the facade is returned.
    ///
    /// # Errors
    ///
    /// - [`FacadeError::Descriptor`] when the descriptor is invalid
    /// - [`FacadeError::Connect`] when the connector fails
    /// - [`FacadeError::Select`] when the post-connect database selection
    ///   fails
    pub fn create(
        connector: &dyn Connector,
        server: impl Into<ServerSpec>,
        config: FacadeConfig,
        database: Option<i64>,
    ) -> Result<Self, FacadeError> {
        let (target, resolved_db) = match server.into() {
            ServerSpec::Descriptor(raw) => {
                let params = descriptor::parse(&raw)?;
                let db = params.database.or(database);
                (ConnectTarget::Single(params), db)
            }
            ServerSpec::Params(params) => {
                let db = params.database.or(database);
                (ConnectTarget::Single(params), db)
            }
            ServerSpec::Topology(topology) => (ConnectTarget::Topology(topology), database),
        };

        let prefix = prefix::normalize(
            &config.prefix.unwrap_or_else(prefix::default_prefix),
        );
        let options = ClientOptions {
            prefix: prefix.clone(),
            extra: config.client_options,
        };

        tracing::debug!(
            target: "redis_facade",
            prefix = %prefix,
            database = ?resolved_db,
            "connecting store client"
        );
        let client = connector
            .connect(&target, &options)
            .map_err(|source| FacadeError::Connect { source })?;

        if let Some(db) = resolved_db {
            client
                .call("select", &[Value::Int(db)])
                .map_err(|source| FacadeError::Select {
                    database: db,
                    source,
                })?;
        }

        Ok(Self {
            client,
            prefix,
            logger: None,
        })
    }

    /// Attach or replace the fault logger.
    ///
    /// Without a logger, contained faults are silent: `invoke` still
    /// returns a contained outcome but nothing is reported anywhere.
    pub fn set_logger(&mut self, logger: Arc<dyn FaultLogger>) {
        self.logger = Some(logger);
    }

    /// The resolved, normalized namespace prefix for this instance.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Dispatch a named command to the underlying client.
    ///
    /// On success the client's raw reply comes back unmodified. Any
    /// client-layer fault is contained: logged once at critical severity
    /// with the command name and fault detail (when a logger is attached),
    /// then returned as [`CommandOutcome::Contained`]. Faults never
    /// propagate out of this method.
    pub fn invoke(&self, command: &str, args: &[Value]) -> CommandOutcome {
        match self.client.call(command, args) {
            Ok(value) => CommandOutcome::Success(value),
            Err(fault) => {
                let detail = fault.to_string();
                if let Some(logger) = &self.logger {
                    logger.critical(&format!("store command '{command}' failed: {detail}"));
                }
                CommandOutcome::Contained(ContainedFault {
                    command: command.to_string(),
                    detail,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::CapturingLogger;
    use crate::memory::MemoryConnector;

    fn facade_with_prefix(connector: &MemoryConnector, prefix: &str) -> Facade {
        Facade::create(
            connector,
            "redis://localhost",
            FacadeConfig {
                prefix: Some(prefix.to_string()),
                ..FacadeConfig::default()
            },
            None,
        )
        .expect("facade should construct")
    }

    #[test]
    fn test_invoke_success_returns_raw_reply() {
        let connector = MemoryConnector::new();
        let facade = facade_with_prefix(&connector, "app");

        let set = facade.invoke("set", &["k".into(), "v".into()]);
        assert_eq!(set.success(), Some(&Value::Str("OK".to_string())));

        let get = facade.invoke("get", &["k".into()]);
        assert_eq!(get.into_value(), Value::Str("v".to_string()));
    }

    #[test]
    fn test_invoke_contains_fault_and_logs_once() {
        let connector = MemoryConnector::new();
        let mut facade = facade_with_prefix(&connector, "app");
        let logger = CapturingLogger::new();
        facade.set_logger(Arc::new(logger.clone()));

        let outcome = facade.invoke("definitely_not_a_command", &[]);
        assert!(outcome.is_contained());
        assert_eq!(outcome.into_value(), Value::Bool(false));

        let messages = logger.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("definitely_not_a_command"));
    }

    #[test]
    fn test_invoke_without_logger_is_silent_but_contained() {
        let connector = MemoryConnector::new();
        let facade = facade_with_prefix(&connector, "app");

        let outcome = facade.invoke("definitely_not_a_command", &[]);
        assert!(outcome.is_contained());
        assert_eq!(outcome.into_value(), Value::Bool(false));
    }

    #[test]
    fn test_contained_fault_carries_command_and_detail() {
        let connector = MemoryConnector::new();
        let facade = facade_with_prefix(&connector, "app");

        match facade.invoke("nope", &[]) {
            CommandOutcome::Contained(fault) => {
                assert_eq!(fault.command, "nope");
                assert!(fault.detail.contains("nope"));
            }
            CommandOutcome::Success(value) => panic!("expected contained fault, got {value:?}"),
        }
    }

    #[test]
    fn test_descriptor_database_overrides_argument() {
        let connector = MemoryConnector::new();
        let _facade = Facade::create(
            &connector,
            "redis://localhost/5",
            FacadeConfig::default(),
            Some(2),
        )
        .expect("facade should construct");

        assert_eq!(connector.current_database(), 5);
    }

    #[test]
    fn test_database_argument_applies_when_descriptor_has_none() {
        let connector = MemoryConnector::new();
        let _facade = Facade::create(
            &connector,
            "redis://localhost",
            FacadeConfig::default(),
            Some(2),
        )
        .expect("facade should construct");

        assert_eq!(connector.current_database(), 2);
    }

    #[test]
    fn test_no_database_means_no_select() {
        let connector = MemoryConnector::new();
        let _facade = Facade::create(
            &connector,
            "redis://localhost",
            FacadeConfig::default(),
            None,
        )
        .expect("facade should construct");

        // The store starts on database 0 and nothing selected away from it.
        assert_eq!(connector.current_database(), 0);
        assert!(!connector.select_was_issued());
    }

    #[test]
    fn test_explicit_prefix_is_normalized() {
        let connector = MemoryConnector::new();
        let facade = facade_with_prefix(&connector, "myapp");
        assert_eq!(facade.prefix(), "myapp:");
    }

    #[test]
    fn test_prefix_accessor_is_idempotent() {
        let connector = MemoryConnector::new();
        let facade = facade_with_prefix(&connector, "myapp");
        assert_eq!(facade.prefix(), facade.prefix());
        assert_eq!(facade.prefix(), "myapp:");
    }

    #[test]
    #[serial_test::serial]
    fn test_prefix_defaults_to_process_wide_value() {
        crate::prefix::set_default_prefix("myapp");
        let connector = MemoryConnector::new();
        let facade = Facade::create(
            &connector,
            "redis://localhost",
            FacadeConfig::default(),
            None,
        )
        .expect("facade should construct");
        assert_eq!(facade.prefix(), "myapp:");
        crate::prefix::set_default_prefix("");
    }

    #[test]
    #[serial_test::serial]
    fn test_default_prefix_change_leaves_existing_instances_alone() {
        crate::prefix::set_default_prefix("before");
        let connector = MemoryConnector::new();
        let facade = Facade::create(
            &connector,
            "redis://localhost",
            FacadeConfig::default(),
            None,
        )
        .expect("facade should construct");

        crate::prefix::set_default_prefix("after");
        assert_eq!(facade.prefix(), "before:");
        crate::prefix::set_default_prefix("");
    }

    #[test]
    fn test_invalid_descriptor_propagates() {
        let connector = MemoryConnector::new();
        let err = Facade::create(&connector, "ftp://h", FacadeConfig::default(), None)
            .expect_err("construction should fail");
        assert!(matches!(err, FacadeError::Descriptor(_)));
    }
}
