//!
//! Default hooks substituted into a normalized configuration.
//!
//! These are handed out as references for the middleware to call later and are
//! never invoked during normalization. Each default is a process-wide value, so
//! every normalization returns the same handle and a re-normalized config
//! compares equal to the first.
//!

use {crate::value::Hook, std::sync::LazyLock, uuid::Uuid};

/// Signature of `session.genid`.
pub type SessionIdGenerator = fn() -> String;

/// Signature of `getLoginState`: receives the login call's `returnTo` option and
/// the URL of the request that triggered the login.
pub type LoginStateFn = fn(Option<&str>, &str) -> LoginState;

/// State carried through the authorization round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginState {
    pub return_to: String,
}

/// Generates a random session identifier.
pub fn generate_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Returns to the explicit `returnTo` option, falling back to the original URL.
pub fn default_login_state(return_to: Option<&str>, original_url: &str) -> LoginState {
    LoginState {
        return_to: return_to.unwrap_or(original_url).to_string(),
    }
}

static SESSION_ID_GENERATOR: LazyLock<Hook> = LazyLock::new(|| {
    Hook::new(
        "generate_session_id",
        0,
        generate_session_id as SessionIdGenerator,
    )
});

static LOGIN_STATE: LazyLock<Hook> =
    LazyLock::new(|| Hook::new("default_login_state", 2, default_login_state as LoginStateFn));

/// The shared default `session.genid` hook.
pub fn session_id_generator() -> Hook {
    SESSION_ID_GENERATOR.clone()
}

/// The shared default `getLoginState` hook.
pub fn login_state() -> Hook {
    LOGIN_STATE.clone()
}
