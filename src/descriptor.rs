//! Connection descriptor parsing.
//!
//! A descriptor is a short textual connection specification. Three forms are
//! accepted:
//!
//! - `""`, standing in for the canonical default `redis://localhost`
//! - `scheme://[user[:pass]@]host[:port][/path][?k=v&...]` with scheme
//!   `redis` or `tcp`
//! - bare `host` or `host:port` with no scheme
//!
//! Parsing is pure and total over the accepted grammar: the result is always
//! a fully populated [`ConnectionParams`] or a [`DescriptorError`], never a
//! partially filled structure with silently wrong defaults.
//!
//! # Type Decisions
//!
//! **Why `Option<i64>` for the database index instead of defaulting to 0?**
//! A descriptor with no path means "no database chosen" and the caller must
//! not issue a SELECT at all. Index 0 is a real database; conflating the two
//! would silently re-home keys.
//!
//! **Why are credentials parsed but never consumed?**
//! The grammar carries `user[:pass]@` for compatibility with descriptors
//! produced elsewhere. Authentication is the transport client's concern;
//! the fields are surfaced on [`ConnectionParams`] and deliberately go no
//! further.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Host substituted when a descriptor names no host.
pub const DEFAULT_HOST: &str = "localhost";

/// Port substituted when a descriptor names no port, or an unparsable one.
pub const DEFAULT_PORT: u16 = 6379;

/// Descriptor parsing error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("invalid descriptor: unsupported scheme '{scheme}' (expected 'redis' or 'tcp')")]
    UnsupportedScheme { scheme: String },
}

/// Credentials carried by a descriptor's authority component.
///
/// Extracted for grammar compatibility; nothing in this crate consumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub pass: Option<String>,
}

/// Normalized connection parameters for a single store node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Target host; never empty.
    pub host: String,
    /// Target port; [`DEFAULT_PORT`] when the descriptor named none.
    pub port: u16,
    /// Database index, or `None` when the descriptor chose no database.
    pub database: Option<i64>,
    /// Credentials from the descriptor, if any. See [`Credentials`].
    pub credentials: Option<Credentials>,
    /// Query-string options, forwarded opaquely to the transport client.
    pub options: BTreeMap<String, String>,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: None,
            credentials: None,
            options: BTreeMap::new(),
        }
    }
}

/// Parse a connection descriptor into [`ConnectionParams`].
///
/// # Errors
///
/// Returns [`DescriptorError::UnsupportedScheme`] when the descriptor
/// carries a scheme other than `redis` or `tcp`.
pub fn parse(descriptor: &str) -> Result<ConnectionParams, DescriptorError> {
    let descriptor = if descriptor.is_empty() {
        "redis://localhost"
    } else {
        descriptor
    };

    // Split off the scheme when present; bare host[:port] forms carry none.
    let rest = match descriptor.split_once("://") {
        Some((scheme, rest)) => {
            if scheme != "redis" && scheme != "tcp" {
                return Err(DescriptorError::UnsupportedScheme {
                    scheme: scheme.to_string(),
                });
            }
            rest
        }
        None => descriptor,
    };

    let (rest, query) = match rest.split_once('?') {
        Some((rest, query)) => (rest, Some(query)),
        None => (rest, None),
    };

    let (authority, mut path) = match rest.split_once('/') {
        Some((authority, path)) => (authority, Some(path)),
        None => (rest, None),
    };

    let (credentials, host_port) = match authority.rsplit_once('@') {
        Some((raw, host_port)) => (Some(parse_credentials(raw)), host_port),
        None => (None, authority),
    };

    let (mut host, port) = split_host_port(host_port);

    // A descriptor like `redis:///name` puts the bare hostname in the path
    // component; reinterpret it as the host.
    if host.is_empty() {
        if let Some(candidate) = path.take_if(|p| !p.is_empty()) {
            host = candidate;
        }
    }
    if host.is_empty() {
        host = DEFAULT_HOST;
    }

    Ok(ConnectionParams {
        host: host.to_string(),
        port,
        database: path.and_then(parse_database),
        credentials,
        options: query.map(parse_query).unwrap_or_default(),
    })
}

/// Split `host[:port]`, falling back to [`DEFAULT_PORT`] when the port
/// component is absent or unparsable.
fn split_host_port(host_port: &str) -> (&str, u16) {
    match host_port.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host, port),
            Err(_) => (host, DEFAULT_PORT),
        },
        None => (host_port, DEFAULT_PORT),
    }
}

fn parse_credentials(raw: &str) -> Credentials {
    match raw.split_once(':') {
        Some((user, pass)) => Credentials {
            user: user.to_string(),
            pass: Some(pass.to_string()),
        },
        None => Credentials {
            user: raw.to_string(),
            pass: None,
        },
    }
}

/// Derive the database index from a path component: strip every non-digit
/// character and parse the remainder. No digits left means no database.
fn parse_database(path: &str) -> Option<i64> {
    let digits: String = path.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
