//! The OIDC middleware configuration schema.
//!
//! Protocol-security policy lives here as cross-field rules: cookie security
//! follows the scheme of `baseURL`, the client secret follows the client
//! authentication method and the ID token algorithm, and code or PAR flows
//! forbid public clients.

use {
    super::{Branch, Check, Code, Condition, FieldRule, Kind, ObjectRule, Schema, Scope, UriShape},
    crate::{config::hooks, value::Value},
    std::sync::LazyLock,
};

pub const DEFAULT_ROLLING_DURATION: i64 = 24 * 60 * 60;
pub const DEFAULT_ABSOLUTE_DURATION: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_DISCOVERY_CACHE_MAX_AGE: i64 = 10 * 60 * 1000;
pub const DEFAULT_HTTP_TIMEOUT: i64 = 5000;

/// Upper bound of every numeric field, the largest integer an `f64` holds exactly.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub const IDENTITY_CLAIM_FILTER: [&str; 11] = [
    "aud", "iss", "iat", "exp", "nbf", "nonce", "azp", "auth_time", "s_hash", "at_hash", "c_hash",
];

const SAME_SITE: [&str; 3] = ["Lax", "Strict", "None"];

const CLIENT_AUTH_METHODS: [&str; 5] = [
    "client_secret_basic",
    "client_secret_post",
    "client_secret_jwt",
    "private_key_jwt",
    "none",
];

const ASSERTION_SIGNING_ALGS: [&str; 11] = [
    "RS256", "RS384", "RS512", "PS256", "PS384", "PS512", "ES256", "ES256K", "ES384", "ES512",
    "EdDSA",
];

static OIDC_SCHEMA: LazyLock<Schema> =
    LazyLock::new(|| Schema::new(declare()).expect("built-in OIDC schema is well formed"));

/// The shared, compiled OIDC configuration schema.
pub fn oidc_schema() -> &'static Schema {
    &OIDC_SCHEMA
}

fn is_https(s: &Scope<'_>) -> bool {
    s.str(0)
        .and_then(|url| url.get(..6))
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https:"))
}

fn rolling_enabled(s: &Scope<'_>) -> bool {
    s.bool(0) == Some(true)
}

fn rolling_disabled(s: &Scope<'_>) -> bool {
    s.bool(0) == Some(false)
}

fn secret_rule() -> FieldRule {
    let text_or_bytes = Kind::OneOf(vec![Kind::String, Kind::Binary]);
    FieldRule::new(
        "secret",
        Kind::OneOf(vec![
            Kind::String,
            Kind::Binary,
            Kind::array_of(text_or_bytes),
        ]),
    )
    .required()
    .check(Check::MinLength(8))
}

fn cookie_rule() -> ObjectRule {
    ObjectRule::new("cookie")
        .field(FieldRule::new("domain", Kind::String))
        .field(FieldRule::new("transient", Kind::Bool).default(false))
        .field(FieldRule::new("httpOnly", Kind::Bool).default(true))
        .field(FieldRule::new("sameSite", Kind::String).only(SAME_SITE).default("Lax"))
        .field(
            FieldRule::new("secure", Kind::Any).when(
                Condition::when("/baseURL", is_https)
                    .then(
                        Branch::new()
                            .kind(Kind::Bool)
                            .default(true)
                            .warn(
                                |v| v.as_bool() == Some(false),
                                "Setting your cookie to insecure when over https is not recommended, I hope you know what you're doing.",
                            ),
                    )
                    .otherwise(
                        Branch::new()
                            .kind(Kind::Bool)
                            .only([false])
                            .default(false)
                            .message(
                                Code::Only,
                                "\"session.cookie.secure\" only valid value is false when \"baseURL\" is not https: cookies set with the `Secure` property wont be attached to http requests",
                            ),
                    ),
            ),
        )
        .field(FieldRule::new("path", Kind::String).check(Check::Uri(UriShape::RelativeOnly)))
}

fn session_rule() -> ObjectRule {
    ObjectRule::new("session")
        .field(FieldRule::new("rolling", Kind::Bool).default(true))
        .field(
            FieldRule::new("rollingDuration", Kind::Any).when(
                Condition::when("rolling", rolling_enabled)
                    .then(
                        Branch::new()
                            .kind(Kind::Integer)
                            .check(Check::Min(0.0))
                            .check(Check::Max(MAX_SAFE_INTEGER))
                            .default(DEFAULT_ROLLING_DURATION)
                            .message(
                                Code::Type,
                                "\"session.rollingDuration\" must be provided an integer value when \"session.rolling\" is true",
                            ),
                    )
                    .otherwise(
                        Branch::new()
                            .kind(Kind::Bool)
                            .only([false])
                            .required()
                            .message(Code::Required, ROLLING_DURATION_MUST_BE_FALSE)
                            .message(Code::Type, ROLLING_DURATION_MUST_BE_FALSE)
                            .message(Code::Only, ROLLING_DURATION_MUST_BE_FALSE),
                    ),
            ),
        )
        .field(
            FieldRule::new("absoluteDuration", Kind::Any)
                .check(Check::Min(0.0))
                .check(Check::Max(MAX_SAFE_INTEGER))
                .default(DEFAULT_ABSOLUTE_DURATION)
                .when(
                    Condition::when("rolling", rolling_disabled)
                        .then(Branch::new().kind(Kind::Integer).message(
                            Code::Type,
                            "\"session.absoluteDuration\" must be provided an integer value when \"session.rolling\" is false",
                        ))
                        .otherwise(
                            Branch::new().kind(Kind::OneOf(vec![Kind::Integer, Kind::False])),
                        ),
                ),
        )
        .field(
            FieldRule::new("name", Kind::String)
                .check(Check::pattern(r"^[0-9a-zA-Z_.-]+$", "cookie name"))
                .default("appSession"),
        )
        .field(
            FieldRule::new("store", Kind::Object).when(
                Condition::when_all(
                    &[
                        "/backchannelLogout",
                        "/backchannelLogout.store",
                        "/backchannelLogout.isLoggedOut",
                    ],
                    |s| s.bool(0) != Some(false) && s.get(1).is_none() && s.get(2).is_none(),
                )
                .then(Branch::new().required().message(
                    Code::Required,
                    "Back-Channel Logout requires a \"backchannelLogout.store\" (you can also reuse \"session.store\" if you have stateful sessions) or custom hooks for \"isLoggedOut\" and \"onLogoutToken\".",
                )),
            ),
        )
        .field(
            FieldRule::new("genid", Kind::Function)
                .check(Check::MaxArity(1))
                .default(hooks::session_id_generator()),
        )
        .field(FieldRule::new("signSessionStoreCookie", Kind::Bool).default(false))
        .field(
            FieldRule::new("requireSignedSessionStoreCookie", Kind::Bool)
                .default_ref("signSessionStoreCookie"),
        )
        .object(cookie_rule())
}

const ROLLING_DURATION_MUST_BE_FALSE: &str =
    "\"session.rollingDuration\" must be false when \"session.rolling\" is disabled";

fn authorization_params_rule() -> ObjectRule {
    ObjectRule::new("authorizationParams")
        .allow_unknown()
        .field(
            FieldRule::new("response_type", Kind::String)
                .only(["id_token", "code id_token", "code"])
                .default("id_token"),
        )
        .field(
            FieldRule::new("scope", Kind::String)
                .check(Check::pattern(r"\bopenid\b", "contains openid"))
                .default("openid profile email"),
        )
        .field(
            FieldRule::new("response_mode", Kind::String).when(
                Condition::when("response_type", |s| s.str(0) == Some("code"))
                    .then(Branch::new().only(["query", "form_post"]))
                    .otherwise(Branch::new().only(["form_post"]).default("form_post")),
            ),
        )
}

fn backchannel_logout_rule() -> ObjectRule {
    let hook_or_false = || Kind::OneOf(vec![Kind::Function, Kind::False]);
    ObjectRule::new("backchannelLogout")
        .or_kind(Kind::Bool)
        .default(false)
        .field(FieldRule::new("store", Kind::Object))
        .field(FieldRule::new("onLogin", hook_or_false()))
        .field(FieldRule::new("isLoggedOut", hook_or_false()))
        .field(FieldRule::new("onLogoutToken", Kind::Function))
}

fn routes_rule() -> ObjectRule {
    let route = |key, default| {
        FieldRule::new(key, Kind::OneOf(vec![Kind::String, Kind::False]))
            .check(Check::Uri(UriShape::RelativeOnly))
            .default(default)
    };
    ObjectRule::new("routes")
        .field(route("login", "/login"))
        .field(route("logout", "/logout"))
        .field(route("callback", "/callback"))
        .field(
            FieldRule::new("postLogoutRedirect", Kind::String)
                .allow_empty()
                .check(Check::Uri(UriShape::AllowRelative))
                .default(""),
        )
        .field(
            FieldRule::new("backchannelLogout", Kind::String)
                .check(Check::Uri(UriShape::AllowRelative))
                .default("/backchannel-logout"),
        )
}

fn client_secret_rule() -> FieldRule {
    FieldRule::new("clientSecret", Kind::String)
        .when(
            Condition::when("clientAuthMethod", |s| {
                s.str(0).is_some_and(|m| m.contains("client_secret"))
            })
            .then(Branch::new().required().message(
                Code::Required,
                "\"clientSecret\" is required for the clientAuthMethod \"{{ref}}\"",
            )),
        )
        .when(
            Condition::when("idTokenSigningAlg", |s| {
                s.str(0)
                    .and_then(|alg| alg.get(..2))
                    .is_some_and(|family| family.eq_ignore_ascii_case("HS"))
            })
            .then(Branch::new().required().message(
                Code::Required,
                "\"clientSecret\" is required for ID tokens with HMAC based algorithms",
            )),
        )
}

/// Falsy keys (`false`, `""`, `0`) count as not supplied.
fn is_supplied(key: &Value) -> bool {
    !matches!(key, Value::Bool(false))
        && key.as_str() != Some("")
        && key.as_f64() != Some(0.0)
}

fn default_client_auth_method(s: &Scope<'_>) -> Option<Value> {
    let response_type = s.str(0);
    let pushed = s.bool(1) == Some(true);
    let method = if response_type == Some("id_token") && !pushed {
        "none"
    } else if s.input("clientAssertionSigningKey").is_some_and(is_supplied) {
        "private_key_jwt"
    } else {
        "client_secret_basic"
    };
    Some(method.into())
}

fn client_auth_method_rule() -> FieldRule {
    FieldRule::new("clientAuthMethod", Kind::String)
        .only(CLIENT_AUTH_METHODS)
        .default_with(
            &["authorizationParams.response_type", "pushedAuthorizationRequests"],
            default_client_auth_method,
        )
        .when(
            Condition::when("authorizationParams.response_type", |s| {
                s.str(0).is_some_and(|rt| rt.contains("code"))
            })
            .then(
                Branch::new()
                    .invalid(["none"])
                    .message(Code::Invalid, "Public code flow clients are not supported."),
            ),
        )
        .when(
            Condition::when("pushedAuthorizationRequests", |s| s.bool(0) == Some(true)).then(
                Branch::new()
                    .invalid(["none"])
                    .message(Code::Invalid, "Public PAR clients are not supported"),
            ),
        )
}

fn declare() -> ObjectRule {
    ObjectRule::root()
        .field(secret_rule())
        .object(session_rule())
        .object(
            ObjectRule::new("transactionCookie")
                .field(
                    FieldRule::new("sameSite", Kind::String)
                        .only(SAME_SITE)
                        .default_ref("..session.cookie.sameSite"),
                )
                .field(FieldRule::new("name", Kind::String).default("auth_verification")),
        )
        .field(FieldRule::new("auth0Logout", Kind::Bool))
        .field(FieldRule::new("tokenEndpointParams", Kind::Map))
        .object(authorization_params_rule())
        .field(FieldRule::new("logoutParams", Kind::Map))
        .object(backchannel_logout_rule())
        .field(
            FieldRule::new("baseURL", Kind::String)
                .required()
                .check(Check::Uri(UriShape::Schemes(&["http", "https"]))),
        )
        .field(FieldRule::new("clientID", Kind::String).required())
        .field(client_secret_rule())
        .field(
            FieldRule::new("clockTolerance", Kind::Number)
                .check(Check::Min(0.0))
                .check(Check::Max(MAX_SAFE_INTEGER))
                .default(60),
        )
        .field(FieldRule::new("enableTelemetry", Kind::Bool).default(true))
        .field(FieldRule::new("errorOnRequiredAuth", Kind::Bool).default(false))
        .field(FieldRule::new("attemptSilentLogin", Kind::Bool).default(false))
        .field(FieldRule::new("getLoginState", Kind::Function).default(hooks::login_state()))
        .field(FieldRule::new("afterCallback", Kind::Function))
        .field(
            FieldRule::new("identityClaimFilter", Kind::array_of(Kind::String)).default(
                IDENTITY_CLAIM_FILTER
                    .iter()
                    .map(|claim| Value::from(*claim))
                    .collect::<Vec<_>>(),
            ),
        )
        .field(FieldRule::new("idpLogout", Kind::Bool).default_with(&["auth0Logout"], |s| {
            Some(Value::Bool(s.bool(0).unwrap_or(false)))
        }))
        .field(
            FieldRule::new("idTokenSigningAlg", Kind::String)
                .check(Check::Invalid {
                    values: vec!["none".into()],
                    ignore_case: true,
                })
                .default("RS256"),
        )
        .field(
            FieldRule::new("issuerBaseURL", Kind::String)
                .required()
                .check(Check::Uri(UriShape::Absolute)),
        )
        .field(FieldRule::new("legacySameSiteCookie", Kind::Bool).default(true))
        .field(FieldRule::new("authRequired", Kind::Bool).default(true))
        .field(FieldRule::new("pushedAuthorizationRequests", Kind::Bool).default(false))
        .object(routes_rule())
        .field(client_auth_method_rule())
        .field(
            FieldRule::new("clientAssertionSigningKey", Kind::Any).when(
                Condition::when("clientAuthMethod", |s| s.str(0) == Some("private_key_jwt"))
                    .then(Branch::new().required().message(
                        Code::Required,
                        "\"clientAssertionSigningKey\" is required for a \"clientAuthMethod\" of \"private_key_jwt\"",
                    )),
            ),
        )
        .field(FieldRule::new("clientAssertionSigningAlg", Kind::String).only(ASSERTION_SIGNING_ALGS))
        .field(
            FieldRule::new("discoveryCacheMaxAge", Kind::Number)
                .check(Check::Min(0.0))
                .check(Check::Max(MAX_SAFE_INTEGER))
                .default(DEFAULT_DISCOVERY_CACHE_MAX_AGE),
        )
        .field(
            FieldRule::new("httpTimeout", Kind::Number)
                .check(Check::Min(500.0))
                .check(Check::Max(MAX_SAFE_INTEGER))
                .default(DEFAULT_HTTP_TIMEOUT),
        )
        .field(FieldRule::new("httpUserAgent", Kind::String))
        .field(FieldRule::new("httpAgent", Kind::Object))
}
