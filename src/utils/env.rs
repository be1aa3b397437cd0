//! Environment variable utilities
//!
//! Provides helpers for reading environment variables used as configuration
//! overrides.

/// Get environment variable as Option
///
/// Returns `Some(value)` if set, `None` if not set.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Whether an environment variable is set at all
pub fn env_is_set(key: &str) -> bool {
    std::env::var_os(key).is_some()
}

/// Split a comma-separated value into trimmed, non-empty entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
