//! In-memory store client.
//!
//! A small, process-local [`StoreClient`] with no server behind it. It
//! exists so facades can be exercised without network I/O: unit tests,
//! integration tests, and embedded use all construct through
//! [`MemoryConnector`] and observe the store directly through its
//! inspection hooks.
//!
//! The command surface is the handful of operations the store contract is
//! usually exercised with (`get`, `set`, `del`, `exists`, `select`, `ping`,
//! `flushdb`); anything else fails with
//! [`ClientError::UnknownCommand`], which doubles as a convenient fault
//! source in dispatch tests. Key commands apply the construction-time
//! namespace prefix, matching the contract that key rewriting belongs to
//! the client.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::client::{
    ClientError, ClientOptions, ConnectTarget, Connector, StoreClient, Value,
};

#[derive(Debug, Default)]
struct MemoryState {
    /// Database index -> key -> value.
    databases: HashMap<i64, BTreeMap<String, String>>,
    /// Currently selected database index.
    current: i64,
    /// Whether any `select` command was ever issued.
    select_issued: bool,
}

/// In-memory [`StoreClient`] over shared state.
///
/// Clones (and clients handed out by the same [`MemoryConnector`]) share
/// one store.
#[derive(Clone)]
pub struct MemoryClient {
    state: Arc<Mutex<MemoryState>>,
    prefix: String,
}

impl MemoryClient {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            prefix: prefix.into(),
        }
    }

    /// Raw keys stored in the given database, prefix included. Inspection
    /// hook for tests.
    pub fn raw_keys(&self, database: i64) -> Vec<String> {
        self.lock()
            .databases
            .get(&database)
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl StoreClient for MemoryClient {
    fn call(&self, command: &str, args: &[Value]) -> Result<Value, ClientError> {
        let mut state = self.lock();
        match command.to_ascii_lowercase().as_str() {
            "ping" => Ok(Value::Str("PONG".to_string())),
            "select" => {
                let database = int_arg(command, args, 0)?;
                state.current = database;
                state.select_issued = true;
                Ok(Value::Str("OK".to_string()))
            }
            "set" => {
                let key = self.prefixed(key_arg(command, args, 0)?);
                let value = string_arg(command, args, 1)?;
                let current = state.current;
                state.databases.entry(current).or_default().insert(key, value);
                Ok(Value::Str("OK".to_string()))
            }
            "get" => {
                let key = self.prefixed(key_arg(command, args, 0)?);
                let current = state.current;
                Ok(state
                    .databases
                    .get(&current)
                    .and_then(|keys| keys.get(&key))
                    .map(|value| Value::Str(value.clone()))
                    .unwrap_or(Value::Nil))
            }
            "del" => {
                let current = state.current;
                let mut removed = 0;
                for key in key_args(command, args)? {
                    let key = self.prefixed(&key);
                    if let Some(keys) = state.databases.get_mut(&current) {
                        if keys.remove(&key).is_some() {
                            removed += 1;
                        }
                    }
                }
                Ok(Value::Int(removed))
            }
            "exists" => {
                let current = state.current;
                let mut present = 0;
                for key in key_args(command, args)? {
                    let key = self.prefixed(&key);
                    if state
                        .databases
                        .get(&current)
                        .is_some_and(|keys| keys.contains_key(&key))
                    {
                        present += 1;
                    }
                }
                Ok(Value::Int(present))
            }
            "flushdb" => {
                let current = state.current;
                state.databases.remove(&current);
                Ok(Value::Str("OK".to_string()))
            }
            other => Err(ClientError::UnknownCommand {
                command: other.to_string(),
            }),
        }
    }
}

/// [`Connector`] handing out [`MemoryClient`] instances over one shared
/// store, recording the connection input it received.
#[derive(Default)]
pub struct MemoryConnector {
    state: Arc<Mutex<MemoryState>>,
    last_target: Mutex<Option<ConnectTarget>>,
    last_options: Mutex<Option<ClientOptions>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Database index the shared store currently has selected.
    pub fn current_database(&self) -> i64 {
        self.lock().current
    }

    /// Whether any client of this store ever issued a `select`.
    pub fn select_was_issued(&self) -> bool {
        self.lock().select_issued
    }

    /// Raw keys stored in the given database, prefix included.
    pub fn keys_in(&self, database: i64) -> Vec<String> {
        self.lock()
            .databases
            .get(&database)
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The [`ConnectTarget`] received by the most recent `connect` call.
    pub fn last_target(&self) -> Option<ConnectTarget> {
        self.last_target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The [`ClientOptions`] received by the most recent `connect` call.
    pub fn last_options(&self) -> Option<ClientOptions> {
        self.last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Connector for MemoryConnector {
    fn connect(
        &self,
        target: &ConnectTarget,
        options: &ClientOptions,
    ) -> Result<Box<dyn StoreClient>, ClientError> {
        *self
            .last_target
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(target.clone());
        *self
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(options.clone());

        Ok(Box::new(MemoryClient {
            state: self.state.clone(),
            prefix: options.prefix.clone(),
        }))
    }
}

fn key_arg<'a>(command: &str, args: &'a [Value], index: usize) -> Result<&'a str, ClientError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::CommandFailed {
            command: command.to_string(),
            message: format!("missing key argument at position {index}"),
        })
}

/// Every argument interpreted as a key, for variadic key commands.
fn key_args(command: &str, args: &[Value]) -> Result<Vec<String>, ClientError> {
    args.iter()
        .map(|arg| {
            arg.as_str()
                .map(str::to_string)
                .ok_or_else(|| ClientError::CommandFailed {
                    command: command.to_string(),
                    message: "expected key argument".to_string(),
                })
        })
        .collect()
}

fn string_arg(command: &str, args: &[Value], index: usize) -> Result<String, ClientError> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(Value::Int(n)) => Ok(n.to_string()),
        _ => Err(ClientError::CommandFailed {
            command: command.to_string(),
            message: format!("missing value argument at position {index}"),
        }),
    }
}

fn int_arg(command: &str, args: &[Value], index: usize) -> Result<i64, ClientError> {
    let parsed = match args.get(index) {
        Some(Value::Int(n)) => Some(*n),
        Some(Value::Str(s)) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ClientError::CommandFailed {
        command: command.to_string(),
        message: format!("missing integer argument at position {index}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_applies_prefix_to_stored_keys() {
        let client = MemoryClient::new("app:");
        client
            .call("set", &["k".into(), "v".into()])
            .expect("set should succeed");
        assert_eq!(client.raw_keys(0), vec!["app:k".to_string()]);
    }

    #[test]
    fn test_get_round_trips_through_prefix() {
        let client = MemoryClient::new("app:");
        client
            .call("set", &["k".into(), "v".into()])
            .expect("set should succeed");
        let reply = client.call("get", &["k".into()]).expect("get should succeed");
        assert_eq!(reply, Value::Str("v".to_string()));
    }

    #[test]
    fn test_get_missing_key_is_nil() {
        let client = MemoryClient::new("");
        let reply = client
            .call("get", &["missing".into()])
            .expect("get should succeed");
        assert_eq!(reply, Value::Nil);
    }

    #[test]
    fn test_select_switches_database() {
        let client = MemoryClient::new("");
        client
            .call("set", &["k".into(), "zero".into()])
            .expect("set should succeed");
        client
            .call("select", &[Value::Int(3)])
            .expect("select should succeed");
        assert_eq!(
            client.call("get", &["k".into()]).expect("get should succeed"),
            Value::Nil
        );
        client
            .call("set", &["k".into(), "three".into()])
            .expect("set should succeed");
        assert_eq!(client.raw_keys(3), vec!["k".to_string()]);
    }

    #[test]
    fn test_del_and_exists_count_keys() {
        let client = MemoryClient::new("");
        client
            .call("set", &["a".into(), "1".into()])
            .expect("set should succeed");
        client
            .call("set", &["b".into(), "2".into()])
            .expect("set should succeed");

        let present = client
            .call("exists", &["a".into(), "b".into(), "c".into()])
            .expect("exists should succeed");
        assert_eq!(present, Value::Int(2));

        let removed = client
            .call("del", &["a".into(), "c".into()])
            .expect("del should succeed");
        assert_eq!(removed, Value::Int(1));
        assert_eq!(
            client.call("exists", &["a".into()]).expect("exists should succeed"),
            Value::Int(0)
        );
    }

    #[test]
    fn test_flushdb_clears_only_current_database() {
        let client = MemoryClient::new("");
        client
            .call("set", &["k".into(), "v".into()])
            .expect("set should succeed");
        client
            .call("select", &[Value::Int(1)])
            .expect("select should succeed");
        client
            .call("set", &["other".into(), "v".into()])
            .expect("set should succeed");
        client.call("flushdb", &[]).expect("flushdb should succeed");

        assert!(client.raw_keys(1).is_empty());
        assert_eq!(client.raw_keys(0), vec!["k".to_string()]);
    }

    #[test]
    fn test_commands_are_case_insensitive() {
        let client = MemoryClient::new("");
        let reply = client.call("PING", &[]).expect("ping should succeed");
        assert_eq!(reply, Value::Str("PONG".to_string()));
    }

    #[test]
    fn test_unknown_command_fails() {
        let client = MemoryClient::new("");
        let err = client
            .call("subscribe", &[])
            .expect_err("unknown command should fail");
        assert_eq!(
            err,
            ClientError::UnknownCommand {
                command: "subscribe".to_string()
            }
        );
    }

    #[test]
    fn test_connector_clients_share_the_store() {
        let connector = MemoryConnector::new();
        let options = ClientOptions {
            prefix: "app:".to_string(),
            extra: BTreeMap::new(),
        };
        let target = ConnectTarget::Single(crate::descriptor::ConnectionParams::default());

        let first = connector
            .connect(&target, &options)
            .expect("connect should succeed");
        first
            .call("set", &["k".into(), "v".into()])
            .expect("set should succeed");

        assert_eq!(connector.keys_in(0), vec!["app:k".to_string()]);
    }
}
