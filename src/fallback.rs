//!
//! Environment fallbacks for a handful of top-level settings.
//!
//! Before resolution, each of the keys below is filled from its environment
//! variable when the caller did not supply it. An explicit value always wins,
//! and an unset variable leaves the key absent so the resolver reports it.
//!
//! | Key             | Variable          |
//! |-----------------|-------------------|
//! | `secret`        | `SECRET`          |
//! | `issuerBaseURL` | `ISSUER_BASE_URL` |
//! | `baseURL`       | `BASE_URL`        |
//! | `clientID`      | `CLIENT_ID`       |
//! | `clientSecret`  | `CLIENT_SECRET`   |
//!

use {
    crate::value::{RawConfig, Value},
    std::collections::{BTreeMap, HashMap},
};

/// Top-level keys paired with the variable that backs them.
pub const FALLBACKS: [(&str, &str); 5] = [
    ("secret", "SECRET"),
    ("issuerBaseURL", "ISSUER_BASE_URL"),
    ("baseURL", "BASE_URL"),
    ("clientID", "CLIENT_ID"),
    ("clientSecret", "CLIENT_SECRET"),
];

/// A source of fallback values, looked up by variable name.
pub trait FallbackSource {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads fallbacks from the process environment at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl FallbackSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl FallbackSource for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }
}

impl FallbackSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// No fallbacks at all.
impl FallbackSource for () {
    fn get(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Overlays fallback values beneath the explicit keys of `raw`.
pub fn merge(mut raw: RawConfig, source: &dyn FallbackSource) -> RawConfig {
    for (key, variable) in FALLBACKS {
        if raw.as_map().contains_key(key) {
            continue;
        }
        if let Some(value) = source.get(variable) {
            tracing::trace!(key, variable, "Using environment fallback");
            raw.set_path(key, Value::String(value));
        }
    }
    raw
}
