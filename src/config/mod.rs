//!
//! The typed, fully resolved configuration handed to the OIDC middleware.
//!
//! A [`NormalizedConfig`] is only ever built from a tree that the resolver has
//! accepted, so every field is present or has been defaulted, and every
//! cross-field rule holds. Conversion from the resolved tree therefore only
//! fails with [`ErrorKind::Internal`](crate::ErrorKind::Internal), which would
//! indicate a schema and model that disagree.
//!
//! Configuration is split into logical sections, each represented by its own struct:
//!
//! - `SessionConfig` and `CookieConfig` for the session cookie
//! - `TransactionCookieConfig` for the short-lived authorization round trip cookie
//! - `AuthorizationParams` for the authorization request
//! - `BackchannelLogoutConfig` for back-channel logout
//! - `RoutesConfig` for the routes the middleware mounts
//!
//! [`NormalizedConfig::to_raw`] turns a normalized configuration back into raw
//! input. Normalizing that input again yields an equal configuration.
//!
pub mod hooks;
pub mod logging;

pub use logging::*;

use {
    crate::{
        Error, Result, RawConfig,
        utils::Sensitive,
        value::{Hook, Map, Value},
    },
    std::{fmt, time::Duration},
    url::Url,
};

/// One session secret. Several may be configured to support key rotation.
#[derive(Debug, Clone, PartialEq)]
pub enum SecretMaterial {
    Text(Sensitive<String>),
    Bytes(Sensitive<Vec<u8>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Lax" => Some(SameSite::Lax),
            "Strict" => Some(SameSite::Strict),
            "None" => Some(SameSite::None),
            _ => None,
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CookieConfig {
    pub domain: Option<String>,
    pub transient: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub secure: bool,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub rolling: bool,
    /// `None` when rolling sessions are disabled.
    pub rolling_duration: Option<Duration>,
    /// `None` when sessions have no absolute lifetime.
    pub absolute_duration: Option<Duration>,
    pub name: String,
    /// A session store handle, or a plain table of store settings.
    pub store: Option<Value>,
    /// Session id generator, see [`hooks::SessionIdGenerator`].
    pub genid: Hook,
    pub sign_session_store_cookie: bool,
    pub require_signed_session_store_cookie: bool,
    pub cookie: CookieConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionCookieConfig {
    pub same_site: SameSite,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    IdToken,
    CodeIdToken,
    Code,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::IdToken => "id_token",
            ResponseType::CodeIdToken => "code id_token",
            ResponseType::Code => "code",
        }
    }

    /// Whether the flow involves an authorization code exchange.
    pub fn is_code_flow(&self) -> bool {
        !matches!(self, ResponseType::IdToken)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Query,
    FormPost,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Query => "query",
            ResponseMode::FormPost => "form_post",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationParams {
    pub response_type: ResponseType,
    pub scope: String,
    /// `None` lets the provider pick its default for the code flow.
    pub response_mode: Option<ResponseMode>,
    /// Additional parameters passed through to the authorization request.
    pub extra: Map,
}

/// A back-channel logout hook that may be explicitly turned off.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum HookSetting {
    #[default]
    Unset,
    Disabled,
    Hook(Hook),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackchannelLogoutConfig {
    pub store: Option<Value>,
    pub on_login: HookSetting,
    pub is_logged_out: HookSetting,
    pub on_logout_token: Option<Hook>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutesConfig {
    /// `None` when the middleware must not mount the route.
    pub login: Option<String>,
    pub logout: Option<String>,
    pub callback: Option<String>,
    /// Empty means "return to `baseURL`".
    pub post_logout_redirect: String,
    pub backchannel_logout: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAuthMethod {
    ClientSecretBasic,
    ClientSecretPost,
    ClientSecretJwt,
    PrivateKeyJwt,
    None,
}

impl ClientAuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientAuthMethod::ClientSecretBasic => "client_secret_basic",
            ClientAuthMethod::ClientSecretPost => "client_secret_post",
            ClientAuthMethod::ClientSecretJwt => "client_secret_jwt",
            ClientAuthMethod::PrivateKeyJwt => "private_key_jwt",
            ClientAuthMethod::None => "none",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "client_secret_basic" => Some(ClientAuthMethod::ClientSecretBasic),
            "client_secret_post" => Some(ClientAuthMethod::ClientSecretPost),
            "client_secret_jwt" => Some(ClientAuthMethod::ClientSecretJwt),
            "private_key_jwt" => Some(ClientAuthMethod::PrivateKeyJwt),
            "none" => Some(ClientAuthMethod::None),
            _ => None,
        }
    }
}

impl fmt::Display for ClientAuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// The fully resolved OIDC middleware configuration.
///
/// Secret material is wrapped in [`Sensitive`] so it never shows up in debug
/// output. Hooks and handles compare by identity.
///
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedConfig {
    pub secret: Vec<SecretMaterial>,
    pub session: SessionConfig,
    pub transaction_cookie: TransactionCookieConfig,
    pub auth0_logout: Option<bool>,
    pub token_endpoint_params: Option<Map>,
    pub authorization_params: AuthorizationParams,
    pub logout_params: Option<Map>,
    /// `None` when back-channel logout is disabled.
    pub backchannel_logout: Option<BackchannelLogoutConfig>,
    pub base_url: Url,
    pub client_id: String,
    pub client_secret: Option<Sensitive<String>>,
    pub clock_tolerance: Duration,
    pub enable_telemetry: bool,
    pub error_on_required_auth: bool,
    pub attempt_silent_login: bool,
    /// See [`hooks::LoginStateFn`].
    pub get_login_state: Hook,
    pub after_callback: Option<Hook>,
    pub identity_claim_filter: Vec<String>,
    pub idp_logout: bool,
    pub id_token_signing_alg: String,
    pub issuer_base_url: Url,
    pub legacy_same_site_cookie: bool,
    pub auth_required: bool,
    pub pushed_authorization_requests: bool,
    pub routes: RoutesConfig,
    pub client_auth_method: ClientAuthMethod,
    pub client_assertion_signing_key: Option<Value>,
    pub client_assertion_signing_alg: Option<String>,
    pub discovery_cache_max_age: Duration,
    pub http_timeout: Duration,
    pub http_user_agent: Option<String>,
    /// An HTTP agent handle, or a plain table of agent settings.
    pub http_agent: Option<Value>,
}

/// Typed reads from one section of the resolved tree.
struct Section<'a> {
    path: String,
    map: &'a Map,
}

impl<'a> Section<'a> {
    fn field(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    fn mismatch(&self, key: &str, expected: &str) -> Error {
        let field = self.field(key);
        Error::internal(format!("resolved \"{field}\" is not {expected}")).with_field(field)
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    fn section(&self, key: &str) -> Result<Section<'a>> {
        match self.get(key) {
            Some(Value::Map(map)) => Ok(Section {
                path: self.field(key),
                map,
            }),
            _ => Err(self.mismatch(key, "an object")),
        }
    }

    fn opt<T>(&self, key: &str, expected: &str, f: impl Fn(&'a Value) -> Option<T>) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => f(v).map(Some).ok_or_else(|| self.mismatch(key, expected)),
        }
    }

    fn req<T>(&self, key: &str, expected: &str, f: impl Fn(&'a Value) -> Option<T>) -> Result<T> {
        self.opt(key, expected, f)?
            .ok_or_else(|| self.mismatch(key, expected))
    }

    fn bool(&self, key: &str) -> Result<bool> {
        self.req(key, "a boolean", Value::as_bool)
    }

    fn opt_bool(&self, key: &str) -> Result<Option<bool>> {
        self.opt(key, "a boolean", Value::as_bool)
    }

    fn string(&self, key: &str) -> Result<String> {
        self.req(key, "a string", |v| v.as_str().map(str::to_string))
    }

    fn opt_string(&self, key: &str) -> Result<Option<String>> {
        self.opt(key, "a string", |v| v.as_str().map(str::to_string))
    }

    fn hook(&self, key: &str) -> Result<Hook> {
        self.req(key, "a function", |v| v.as_hook().cloned())
    }

    fn opt_hook(&self, key: &str) -> Result<Option<Hook>> {
        self.opt(key, "a function", |v| v.as_hook().cloned())
    }

    fn opt_map(&self, key: &str) -> Result<Option<Map>> {
        self.opt(key, "an object", |v| v.as_map().cloned())
    }

    fn url(&self, key: &str) -> Result<Url> {
        self.req(key, "an absolute url", |v| Url::parse(v.as_str()?).ok())
    }

    /// A non-negative number scaled to seconds.
    fn duration(&self, key: &str, seconds_per_unit: f64) -> Result<Duration> {
        self.req(key, "a non-negative number", |v| {
            Duration::try_from_secs_f64(v.as_f64()? * seconds_per_unit).ok()
        })
    }

    /// A whole number of seconds, or `false` for none.
    fn opt_seconds(&self, key: &str) -> Result<Option<Duration>> {
        let seconds = |v: &Value| match v {
            Value::Bool(false) => Some(None),
            v => Some(Some(Duration::from_secs(u64::try_from(v.as_i64()?).ok()?))),
        };
        Ok(self.opt(key, "a number of seconds or false", seconds)?.flatten())
    }

    /// A relative path, or `false` for a disabled route.
    fn route(&self, key: &str) -> Result<Option<String>> {
        self.req(key, "a route or false", |v| match v {
            Value::Bool(false) => Some(None),
            v => v.as_str().map(|s| Some(s.to_string())),
        })
    }

    fn hook_setting(&self, key: &str) -> Result<HookSetting> {
        let setting = self.opt(key, "a function or false", |v| match v {
            Value::Bool(false) => Some(HookSetting::Disabled),
            v => v.as_hook().cloned().map(HookSetting::Hook),
        })?;
        Ok(setting.unwrap_or_default())
    }
}

fn secret_material(value: &Value) -> Option<SecretMaterial> {
    match value {
        Value::String(s) => Some(SecretMaterial::Text(Sensitive(s.clone()))),
        Value::Binary(b) => Some(SecretMaterial::Bytes(Sensitive(b.clone()))),
        _ => None,
    }
}

fn secrets(value: &Value) -> Option<Vec<SecretMaterial>> {
    match value {
        Value::Array(items) => items.iter().map(secret_material).collect(),
        v => secret_material(v).map(|s| vec![s]),
    }
}

impl NormalizedConfig {
    ///
    /// Builds the typed configuration from a tree the resolver has accepted.
    ///
    pub fn from_resolved(resolved: &Map) -> Result<NormalizedConfig> {
        let root = Section {
            path: String::new(),
            map: resolved,
        };

        let session = root.section("session")?;
        let cookie = session.section("cookie")?;
        let cookie = CookieConfig {
            domain: cookie.opt_string("domain")?,
            transient: cookie.bool("transient")?,
            http_only: cookie.bool("httpOnly")?,
            same_site: cookie.req("sameSite", "a SameSite value", |v| SameSite::parse(v.as_str()?))?,
            secure: cookie.bool("secure")?,
            path: cookie.opt_string("path")?,
        };
        let session = SessionConfig {
            rolling: session.bool("rolling")?,
            rolling_duration: session.opt_seconds("rollingDuration")?,
            absolute_duration: session.opt_seconds("absoluteDuration")?,
            name: session.string("name")?,
            store: session.get("store").cloned(),
            genid: session.hook("genid")?,
            sign_session_store_cookie: session.bool("signSessionStoreCookie")?,
            require_signed_session_store_cookie: session.bool("requireSignedSessionStoreCookie")?,
            cookie,
        };

        let transaction = root.section("transactionCookie")?;
        let transaction_cookie = TransactionCookieConfig {
            same_site: transaction.req("sameSite", "a SameSite value", |v| {
                SameSite::parse(v.as_str()?)
            })?,
            name: transaction.string("name")?,
        };

        let params = root.section("authorizationParams")?;
        let authorization_params = AuthorizationParams {
            response_type: params.req("response_type", "a response type", |v| {
                match v.as_str()? {
                    "id_token" => Some(ResponseType::IdToken),
                    "code id_token" => Some(ResponseType::CodeIdToken),
                    "code" => Some(ResponseType::Code),
                    _ => None,
                }
            })?,
            scope: params.string("scope")?,
            response_mode: params.opt("response_mode", "a response mode", |v| {
                match v.as_str()? {
                    "query" => Some(ResponseMode::Query),
                    "form_post" => Some(ResponseMode::FormPost),
                    _ => None,
                }
            })?,
            extra: params
                .map
                .iter()
                .filter(|(k, _)| !matches!(k.as_str(), "response_type" | "scope" | "response_mode"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };

        let backchannel_logout = match root.get("backchannelLogout") {
            None | Some(Value::Bool(false)) => None,
            Some(Value::Bool(true)) => Some(BackchannelLogoutConfig::default()),
            Some(Value::Map(_)) => {
                let bcl = root.section("backchannelLogout")?;
                Some(BackchannelLogoutConfig {
                    store: bcl.get("store").cloned(),
                    on_login: bcl.hook_setting("onLogin")?,
                    is_logged_out: bcl.hook_setting("isLoggedOut")?,
                    on_logout_token: bcl.opt_hook("onLogoutToken")?,
                })
            }
            Some(_) => return Err(root.mismatch("backchannelLogout", "an object or boolean")),
        };

        let routes = root.section("routes")?;
        let routes = RoutesConfig {
            login: routes.route("login")?,
            logout: routes.route("logout")?,
            callback: routes.route("callback")?,
            post_logout_redirect: routes.string("postLogoutRedirect")?,
            backchannel_logout: routes.string("backchannelLogout")?,
        };

        Ok(NormalizedConfig {
            secret: root.req("secret", "secret material", secrets)?,
            session,
            transaction_cookie,
            auth0_logout: root.opt_bool("auth0Logout")?,
            token_endpoint_params: root.opt_map("tokenEndpointParams")?,
            authorization_params,
            logout_params: root.opt_map("logoutParams")?,
            backchannel_logout,
            base_url: root.url("baseURL")?,
            client_id: root.string("clientID")?,
            client_secret: root
                .opt_string("clientSecret")?
                .map(|s| Sensitive::from(s.as_str())),
            clock_tolerance: root.duration("clockTolerance", 1.0)?,
            enable_telemetry: root.bool("enableTelemetry")?,
            error_on_required_auth: root.bool("errorOnRequiredAuth")?,
            attempt_silent_login: root.bool("attemptSilentLogin")?,
            get_login_state: root.hook("getLoginState")?,
            after_callback: root.opt_hook("afterCallback")?,
            identity_claim_filter: root.req("identityClaimFilter", "a list of claims", |v| {
                v.as_array()?
                    .iter()
                    .map(|c| c.as_str().map(str::to_string))
                    .collect()
            })?,
            idp_logout: root.bool("idpLogout")?,
            id_token_signing_alg: root.string("idTokenSigningAlg")?,
            issuer_base_url: root.url("issuerBaseURL")?,
            legacy_same_site_cookie: root.bool("legacySameSiteCookie")?,
            auth_required: root.bool("authRequired")?,
            pushed_authorization_requests: root.bool("pushedAuthorizationRequests")?,
            routes,
            client_auth_method: root.req("clientAuthMethod", "a client auth method", |v| {
                ClientAuthMethod::parse(v.as_str()?)
            })?,
            client_assertion_signing_key: root.get("clientAssertionSigningKey").cloned(),
            client_assertion_signing_alg: root.opt_string("clientAssertionSigningAlg")?,
            discovery_cache_max_age: root.duration("discoveryCacheMaxAge", 0.001)?,
            http_timeout: root.duration("httpTimeout", 0.001)?,
            http_user_agent: root.opt_string("httpUserAgent")?,
            http_agent: root.get("httpAgent").cloned(),
        })
    }

    ///
    /// Converts this configuration back into raw input using the integrator-facing
    /// key names. Normalizing the result again is a fixed point.
    ///
    pub fn to_raw(&self) -> RawConfig {
        let mut raw = RawConfig::new();
        let mut set = |path: &str, value: Value| raw.set_path(path, value);

        let secrets: Vec<Value> = self
            .secret
            .iter()
            .map(|s| match s {
                SecretMaterial::Text(t) => Value::from(t.0.as_str()),
                SecretMaterial::Bytes(b) => Value::binary(b.0.clone()),
            })
            .collect();
        match <[Value; 1]>::try_from(secrets) {
            Ok([single]) => set("secret", single),
            Err(many) => set("secret", Value::Array(many)),
        }

        let session = &self.session;
        set("session.rolling", session.rolling.into());
        set("session.rollingDuration", seconds_or_false(session.rolling_duration));
        set("session.absoluteDuration", seconds_or_false(session.absolute_duration));
        set("session.name", session.name.as_str().into());
        if let Some(store) = &session.store {
            set("session.store", store.clone());
        }
        set("session.genid", session.genid.clone().into());
        set("session.signSessionStoreCookie", session.sign_session_store_cookie.into());
        set(
            "session.requireSignedSessionStoreCookie",
            session.require_signed_session_store_cookie.into(),
        );
        let cookie = &session.cookie;
        if let Some(domain) = &cookie.domain {
            set("session.cookie.domain", domain.as_str().into());
        }
        set("session.cookie.transient", cookie.transient.into());
        set("session.cookie.httpOnly", cookie.http_only.into());
        set("session.cookie.sameSite", cookie.same_site.as_str().into());
        set("session.cookie.secure", cookie.secure.into());
        if let Some(path) = &cookie.path {
            set("session.cookie.path", path.as_str().into());
        }

        set("transactionCookie.sameSite", self.transaction_cookie.same_site.as_str().into());
        set("transactionCookie.name", self.transaction_cookie.name.as_str().into());

        if let Some(auth0_logout) = self.auth0_logout {
            set("auth0Logout", auth0_logout.into());
        }
        if let Some(params) = &self.token_endpoint_params {
            set("tokenEndpointParams", params.clone().into());
        }

        let mut params = self.authorization_params.extra.clone();
        params.insert(
            "response_type".into(),
            self.authorization_params.response_type.as_str().into(),
        );
        params.insert("scope".into(), self.authorization_params.scope.as_str().into());
        if let Some(mode) = self.authorization_params.response_mode {
            params.insert("response_mode".into(), mode.as_str().into());
        }
        set("authorizationParams", params.into());

        if let Some(params) = &self.logout_params {
            set("logoutParams", params.clone().into());
        }

        let backchannel_logout = match &self.backchannel_logout {
            None => Value::Bool(false),
            Some(bcl) if *bcl == BackchannelLogoutConfig::default() => Value::Bool(true),
            Some(bcl) => {
                let mut map = Map::new();
                if let Some(store) = &bcl.store {
                    map.insert("store".into(), store.clone());
                }
                for (key, setting) in [("onLogin", &bcl.on_login), ("isLoggedOut", &bcl.is_logged_out)] {
                    match setting {
                        HookSetting::Unset => {}
                        HookSetting::Disabled => {
                            map.insert(key.into(), false.into());
                        }
                        HookSetting::Hook(hook) => {
                            map.insert(key.into(), hook.clone().into());
                        }
                    }
                }
                if let Some(hook) = &bcl.on_logout_token {
                    map.insert("onLogoutToken".into(), hook.clone().into());
                }
                map.into()
            }
        };
        set("backchannelLogout", backchannel_logout);

        set("baseURL", self.base_url.as_str().into());
        set("clientID", self.client_id.as_str().into());
        if let Some(secret) = &self.client_secret {
            set("clientSecret", secret.0.as_str().into());
        }
        set("clockTolerance", number(self.clock_tolerance, 1));
        set("enableTelemetry", self.enable_telemetry.into());
        set("errorOnRequiredAuth", self.error_on_required_auth.into());
        set("attemptSilentLogin", self.attempt_silent_login.into());
        set("getLoginState", self.get_login_state.clone().into());
        if let Some(hook) = &self.after_callback {
            set("afterCallback", hook.clone().into());
        }
        set(
            "identityClaimFilter",
            self.identity_claim_filter
                .iter()
                .map(|c| Value::from(c.as_str()))
                .collect::<Vec<_>>()
                .into(),
        );
        set("idpLogout", self.idp_logout.into());
        set("idTokenSigningAlg", self.id_token_signing_alg.as_str().into());
        set("issuerBaseURL", self.issuer_base_url.as_str().into());
        set("legacySameSiteCookie", self.legacy_same_site_cookie.into());
        set("authRequired", self.auth_required.into());
        set("pushedAuthorizationRequests", self.pushed_authorization_requests.into());

        let route = |r: &Option<String>| r.as_deref().map_or(Value::Bool(false), Value::from);
        set("routes.login", route(&self.routes.login));
        set("routes.logout", route(&self.routes.logout));
        set("routes.callback", route(&self.routes.callback));
        set("routes.postLogoutRedirect", self.routes.post_logout_redirect.as_str().into());
        set("routes.backchannelLogout", self.routes.backchannel_logout.as_str().into());

        set("clientAuthMethod", self.client_auth_method.as_str().into());
        if let Some(key) = &self.client_assertion_signing_key {
            set("clientAssertionSigningKey", key.clone());
        }
        if let Some(alg) = &self.client_assertion_signing_alg {
            set("clientAssertionSigningAlg", alg.as_str().into());
        }
        set("discoveryCacheMaxAge", number(self.discovery_cache_max_age, 1000));
        set("httpTimeout", number(self.http_timeout, 1000));
        if let Some(agent) = &self.http_user_agent {
            set("httpUserAgent", agent.as_str().into());
        }
        if let Some(agent) = &self.http_agent {
            set("httpAgent", agent.clone());
        }
        raw
    }
}

fn seconds_or_false(duration: Option<Duration>) -> Value {
    match duration {
        Some(d) => i64::try_from(d.as_secs()).map_or(Value::Bool(false), Value::Integer),
        None => Value::Bool(false),
    }
}

/// A duration in units of `1/per_second` seconds, as an integer when exact.
fn number(duration: Duration, per_second: u32) -> Value {
    let nanos_per_unit = 1_000_000_000 / u128::from(per_second);
    let nanos = duration.as_nanos();
    if nanos % nanos_per_unit == 0 {
        if let Ok(units) = i64::try_from(nanos / nanos_per_unit) {
            return Value::Integer(units);
        }
    }
    Value::Float(duration.as_secs_f64() * f64::from(per_second))
}
