//! Process-wide default namespace prefix.
//!
//! Facade constructions that pass no explicit prefix read this value once,
//! at construction time; already-constructed instances never see later
//! updates. Access is synchronized so constructions racing a configuration
//! call stay well-defined (one or the other value wins, never a torn read).

use std::sync::{OnceLock, PoisonError, RwLock};

/// Separator terminating every non-empty namespace prefix.
pub const NAMESPACE_SEPARATOR: char = ':';

fn default_cell() -> &'static RwLock<String> {
    static DEFAULT_PREFIX: OnceLock<RwLock<String>> = OnceLock::new();
    DEFAULT_PREFIX.get_or_init(|| RwLock::new(String::new()))
}

/// Normalize a namespace to end with [`NAMESPACE_SEPARATOR`].
///
/// An empty namespace stays empty: no prefix means no namespacing, not a
/// bare separator.
pub fn normalize(namespace: &str) -> String {
    if namespace.is_empty() || namespace.ends_with(NAMESPACE_SEPARATOR) {
        namespace.to_string()
    } else {
        format!("{namespace}{NAMESPACE_SEPARATOR}")
    }
}

/// Set the process-wide default prefix used by future facade constructions.
///
/// The value is normalized before storing. Instances constructed earlier
/// are unaffected.
pub fn set_default_prefix(namespace: &str) {
    let normalized = normalize(namespace);
    *default_cell()
        .write()
        .unwrap_or_else(PoisonError::into_inner) = normalized;
}

/// Current process-wide default prefix. Empty until configured.
pub fn default_prefix() -> String {
    default_cell()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
