//! # oidc-conf
//!
//! Configuration validation and defaulting for an OpenID Connect authentication
//! middleware.
//!
//! An integrator supplies a partial, untyped configuration (optionally backed by
//! a few environment variables). [`normalize`] turns it into one fully resolved,
//! internally consistent [`NormalizedConfig`], or fails with a single [`Error`]
//! naming the first violated field. The engine is a pure, synchronous transform:
//! no network calls, no caching, no persistence.
//!
//! # Quick Start
//!
//! ```rust
//! use oidc_conf::{RawConfig, normalize_with};
//!
//! let raw = RawConfig::new()
//!     .with("secret", "a long, random session secret")
//!     .with("baseURL", "https://app.example.com")
//!     .with("clientID", "my-app")
//!     .with("issuerBaseURL", "https://op.example.com");
//!
//! // `()` supplies no fallbacks
//! let config = normalize_with(raw, &())?;
//! assert!(config.session.cookie.secure);
//! assert_eq!(config.routes.callback.as_deref(), Some("/callback"));
//! # Ok::<(), oidc_conf::Error>(())
//! ```
//!
//! Or from TOML, with `{{ VAR }}` placeholders substituted from the environment:
//! ```toml
//! secret = "{{ SESSION_SECRET }}"
//! baseURL = "https://app.example.com"
//! clientID = "my-app"
//! issuerBaseURL = "https://op.example.com"
//!
//! [authorizationParams]
//! response_type = "code"
//! ```
//!
//! # Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`fallback`] | Environment fallbacks merged beneath explicit keys |
//! | [`schema`] | Field rules compiled into an acyclic constraint graph |
//! | [`resolver`] | Dependency-ordered evaluation against a schema |
//! | [`advisory`] | Non-fatal best-practice warnings |
//! | [`config`] | The typed [`NormalizedConfig`] and tracing setup |
//! | [`error`] | Error types and handling ([`Error`]) |
//! | [`utils`] | Utilities ([`Sensitive`]) |
//!
pub mod advisory;
pub mod config;
pub mod error;
pub mod fallback;
pub mod resolver;
pub mod schema;
pub mod utils;
mod value;

pub use {
    advisory::Advisory,
    config::{NormalizedConfig, hooks},
    error::{Error, ErrorKind},
    fallback::{FallbackSource, ProcessEnv},
    utils::Sensitive,
    value::{Handle, Hook, Map, RawConfig, Value},
};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A normalized configuration plus the advisory raised while resolving it.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub config: NormalizedConfig,
    pub advisory: Option<Advisory>,
}

///
/// Normalizes `raw` with fallbacks read from the process environment.
///
/// Fails with the first violated constraint. An advisory, if any, is logged at
/// `warn` level and otherwise does not affect the result.
///
pub fn normalize(raw: RawConfig) -> Result<NormalizedConfig> {
    normalize_with(raw, &ProcessEnv)
}

///
/// Normalizes `raw` with fallbacks read from `fallbacks`.
///
pub fn normalize_with(raw: RawConfig, fallbacks: &dyn FallbackSource) -> Result<NormalizedConfig> {
    let validated = validate_with(raw, fallbacks)?;
    if let Some(advisory) = &validated.advisory {
        tracing::warn!(field = advisory.field(), "{}", advisory.message());
    }
    Ok(validated.config)
}

///
/// Like [`normalize_with`], but hands the advisory back instead of logging it.
///
pub fn validate_with(raw: RawConfig, fallbacks: &dyn FallbackSource) -> Result<Validated> {
    let merged = fallback::merge(raw, fallbacks);
    let resolution = resolver::resolve(schema::oidc_schema(), merged.as_map()).map_err(|v| {
        let error = Error::from(v);
        tracing::debug!(
            field = error.field().unwrap_or_default(),
            error_code = error.error_code(),
            "Configuration rejected: {error}"
        );
        error
    })?;
    Ok(Validated {
        config: NormalizedConfig::from_resolved(&resolution.value)?,
        advisory: resolution.advisory,
    })
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::BTreeMap, tracing_test::traced_test};

    fn no_env() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn raw() -> RawConfig {
        RawConfig::new()
            .with("secret", "__test_session_secret__")
            .with("baseURL", "https://app.example.com")
            .with("clientID", "__test_client_id__")
            .with("issuerBaseURL", "https://op.example.com")
    }

    #[test]
    #[traced_test]
    fn test_advisory_is_logged() {
        let config = normalize_with(raw().with("session.cookie.secure", false), &no_env())
            .unwrap();
        assert!(!config.session.cookie.secure);
        assert!(logs_contain("Setting your cookie to insecure when over https"));
        assert!(logs_contain("session.cookie.secure"));
    }

    #[test]
    #[traced_test]
    fn test_violation_is_logged_at_debug() {
        let err = normalize_with(raw().with("httpTimeout", 10), &no_env()).unwrap_err();
        assert_eq!(err.error_code(), "FORMAT_VIOLATION");
        assert!(logs_contain("FORMAT_VIOLATION"));
        assert!(logs_contain("Configuration rejected"));
    }

    #[test]
    fn test_validate_returns_advisory() {
        let validated =
            validate_with(raw().with("session.cookie.secure", false), &no_env()).unwrap();
        assert_eq!(
            validated.advisory.map(|a| a.field().to_string()),
            Some("session.cookie.secure".to_string())
        );
        let validated = validate_with(raw(), &no_env()).unwrap();
        assert!(validated.advisory.is_none());
    }

    #[test]
    fn test_normalize_reads_process_env() {
        let err = normalize(
            RawConfig::new()
                .with("secret", "__test_session_secret__")
                .with("clientID", "__test_client_id__")
                .with("issuerBaseURL", "https://op.example.com"),
        );
        if std::env::var("BASE_URL").is_err() {
            assert_eq!(err.unwrap_err().field(), Some("baseURL"));
        }
    }
}
