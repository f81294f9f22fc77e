//! Conversion between declared environment variables and the runtime's flat
//! `KEY=VALUE` representation.

use crate::component::EnvVar;

/// Encode declared variables as `name=value` strings, preserving order.
///
/// Duplicate names are kept as-is; validation of the declared set happens
/// upstream.
pub fn encode(vars: &[EnvVar]) -> Vec<String> {
    vars.iter()
        .map(|env| format!("{}={}", env.name, env.value))
        .collect()
}

/// Returns true if the exact `KEY=VALUE` entry exists in the runtime env list.
pub fn contains(entry: &str, runtime_env: &[String]) -> bool {
    runtime_env.iter().any(|env| env == entry)
}
