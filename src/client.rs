//! Store-client contracts.
//!
//! The facade talks to its store through two narrow seams:
//!
//! - [`StoreClient`] handles command dispatch through a single `call`
//!   method. Every store command goes through it verbatim, so the facade
//!   needs no knowledge of individual command shapes and swapping the
//!   client implementation is a one-point change.
//! - [`Connector`] turns resolved connection input into a live client at
//!   facade construction time.
//!
//! Implementations own their transport and any interior mutability they
//! need; both traits take `&self`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::ConnectionParams;

/// Client error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("connection to '{address}' failed: {message}")]
    ConnectionFailed { address: String, message: String },

    #[error("command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },
}

/// Command argument and reply values.
///
/// Covers the reply shapes a Redis-family store produces: nothing, an
/// integer, a string, a status/boolean, or an array of further values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Nil,
    Int(i64),
    Str(String),
    Bool(bool),
    Array(Vec<Value>),
}

impl Value {
    /// Extract the value as a string slice, when it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract the value as an integer, when it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract the value as a boolean, when it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Options handed to a [`Connector`] alongside the connection target.
///
/// The `prefix` is the facade-resolved namespace; key rewriting is the
/// client's job, the facade only guarantees the value arriving here is
/// normalized. `extra` carries transport options the facade does not
/// interpret (replication settings, timeouts, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    pub prefix: String,
    pub extra: BTreeMap<String, String>,
}

/// Multi-node configuration, passed through to the connector unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub nodes: Vec<ConnectionParams>,
    pub options: BTreeMap<String, String>,
}

/// Resolved connection input for a [`Connector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// One node, described by normalized parameters.
    Single(ConnectionParams),
    /// A replicated or sharded deployment the connector models itself.
    Topology(TopologyConfig),
}

/// A live connection to a store, dispatching commands by name.
pub trait StoreClient: Send + Sync {
    /// Execute a named command with positional arguments.
    ///
    /// Arguments are forwarded verbatim; the return value is whatever the
    /// store replied with, unmodified.
    fn call(&self, command: &str, args: &[Value]) -> Result<Value, ClientError>;
}

/// Builds [`StoreClient`] instances from resolved connection input.
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        target: &ConnectTarget,
        options: &ClientOptions,
    ) -> Result<Box<dyn StoreClient>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Str("x".to_string()).as_str(), Some("x"));
        assert_eq!(Value::Int(7).as_i64(), Some(7));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Nil.as_str(), None);
        assert_eq!(Value::Str("x".to_string()).as_i64(), None);
    }

    #[test]
    fn test_value_from_conversions() {
        assert_eq!(Value::from("k"), Value::Str("k".to_string()));
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from(false), Value::Bool(false));
    }

    #[test]
    fn test_client_error_messages_name_the_command() {
        let err = ClientError::CommandFailed {
            command: "get".to_string(),
            message: "socket closed".to_string(),
        };
        assert!(err.to_string().contains("get"));
        assert!(err.to_string().contains("socket closed"));
    }

    #[test]
    fn test_traits_are_object_safe() {
        fn accepts_client(_client: &dyn StoreClient) {}
        fn accepts_connector(_connector: &dyn Connector) {}
        let _ = accepts_client;
        let _ = accepts_connector;
    }
}
