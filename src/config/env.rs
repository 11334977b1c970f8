//! Environment variable overrides.
//!
//! Applied on top of the config file and below CLI flags. Unparseable
//! values are ignored with a warning so a stray variable never blocks a
//! render.

use tracing::warn;

use super::types::Config;

pub const ENV_PROVIDER: &str = "VLMWEAVE_PROVIDER";
pub const ENV_API_KEY: &str = "VLMWEAVE_API_KEY";
pub const ENV_MODEL: &str = "VLMWEAVE_MODEL";
pub const ENV_ENDPOINT: &str = "VLMWEAVE_ENDPOINT";
pub const ENV_PROMPT: &str = "VLMWEAVE_PROMPT";
pub const ENV_TIMEOUT: &str = "VLMWEAVE_TIMEOUT";
pub const ENV_THREADS: &str = "VLMWEAVE_THREADS";

/// Apply overrides read through `lookup` (usually `std::env::var`).
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(kind) = get(ENV_PROVIDER) {
        match kind.parse() {
            Ok(kind) => config.provider.kind = kind,
            Err(e) => warn!(variable = ENV_PROVIDER, "ignoring invalid value: {}", e),
        }
    }
    if let Some(key) = get(ENV_API_KEY) {
        config.provider.api_key = Some(key);
    }
    if let Some(model) = get(ENV_MODEL) {
        config.provider.model = Some(model);
    }
    if let Some(endpoint) = get(ENV_ENDPOINT) {
        config.provider.endpoint = Some(endpoint);
    }
    if let Some(prompt) = get(ENV_PROMPT) {
        config.provider.prompt = Some(prompt);
    }
    if let Some(timeout) = get(ENV_TIMEOUT) {
        match timeout.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => config.provider.timeout_secs = secs,
            _ => warn!(variable = ENV_TIMEOUT, value = %timeout, "ignoring invalid timeout"),
        }
    }
    if let Some(threads) = get(ENV_THREADS) {
        match threads.trim().parse::<usize>() {
            Ok(n) if n > 0 => config.pool.threads = Some(n),
            _ => warn!(variable = ENV_THREADS, value = %threads, "ignoring invalid thread count"),
        }
    }
}

/// Apply overrides from the process environment.
pub fn apply_process_env(config: &mut Config) {
    apply_env_overrides(config, |name| std::env::var(name).ok());
}
