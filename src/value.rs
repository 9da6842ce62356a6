//!
//! The untyped input model.
//!
//! Integrators hand the engine an arbitrary nested mapping. Besides the usual
//! scalar and container types, values may be opaque [`Hook`]s (callbacks such as
//! a session id generator) and [`Handle`]s (objects the engine never looks into,
//! such as a session store or an HTTP agent). Both compare by identity so a
//! normalized configuration can be fed back in and compare equal.
//!

use {
    crate::{Error, Result, utils::replace_handlebars_with_env},
    std::{any::Any, collections::BTreeMap, fmt, fs, path::Path, str::FromStr, sync::Arc},
};

/// A nested mapping of string keys to values.
pub type Map = BTreeMap<String, Value>;

/// A single configuration value.
///
/// Absence is modelled by the key not being present in its [`Map`].
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
    Array(Vec<Value>),
    Map(Map),
    Function(Hook),
    Object(Handle),
}

impl Value {
    /// Wraps raw bytes as a binary value.
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Binary(bytes.into())
    }

    /// Human-readable name of the value's type, used in messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Integer(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Array(_) => "array",
            Value::Map(_) | Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value of integers and finite floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }

    /// Returns integers, and floats with no fractional part that fit an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f)
                if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f) =>
            {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_hook(&self) -> Option<&Hook> {
        match self {
            Value::Function(h) => Some(h),
            _ => None,
        }
    }

    /// Looks up a dotted path below this value.
    /// Returns `None` when a segment is missing or crosses a non-map value.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.')
            .try_fold(self, |value, key| value.as_map()?.get(key))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Binary(b) => write!(f, "<{} bytes>", b.len()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(_) | Value::Object(_) => write!(f, "[object]"),
            Value::Function(h) => write!(f, "[function {}]", h.name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<Hook> for Value {
    fn from(h: Hook) -> Self {
        Value::Function(h)
    }
}

impl From<Handle> for Value {
    fn from(h: Handle) -> Self {
        Value::Object(h)
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(d) => Value::String(d.to_string()),
            toml::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(table) => Value::Map(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Converts JSON, dropping `null` (which stands for "not provided").
fn from_json(value: serde_json::Value) -> Option<Value> {
    use serde_json::Value as Json;
    Some(match value {
        Json::Null => return None,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64()?),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Array(items.into_iter().filter_map(from_json).collect()),
        Json::Object(obj) => Value::Map(
            obj.into_iter()
                .filter_map(|(k, v)| Some((k, from_json(v)?)))
                .collect(),
        ),
    })
}

// ============================================================================
// Opaque values
// ============================================================================

/// An opaque callable supplied by the integrator (or one of the built-in
/// default hooks).
///
/// The engine never invokes hooks; it only checks their declared arity and
/// passes them through. Consumers recover the concrete callable with
/// [`Hook::downcast_ref`].
///
/// ```
/// use oidc_conf::Hook;
///
/// fn make_id() -> String { "abc".into() }
///
/// let hook = Hook::new("makeId", 0, make_id as fn() -> String);
/// let f = hook.downcast_ref::<fn() -> String>().unwrap();
/// assert_eq!(f(), "abc");
/// ```
#[derive(Clone)]
pub struct Hook {
    name: Arc<str>,
    arity: usize,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Hook {
    pub fn new<T: Any + Send + Sync>(name: impl AsRef<str>, arity: usize, callable: T) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            arity,
            inner: Arc::new(callable),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of parameters the callable declares.
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({}/{})", self.name, self.arity)
    }
}

/// An opaque object handle (session store, HTTP agent, key object).
#[derive(Clone)]
pub struct Handle {
    name: Arc<str>,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Handle {
    pub fn new<T: Any + Send + Sync>(name: impl AsRef<str>, object: T) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            inner: Arc::new(object),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.name)
    }
}

// ============================================================================
// RawConfig
// ============================================================================

///
/// The configuration exactly as the integrator supplied it.
///
/// A raw configuration can be created in several ways:
/// - Programmatically via [`RawConfig::with`] and [`RawConfig::set_path`]
/// - From a TOML string via [`RawConfig::from_toml`] or `str::parse`
/// - From a TOML file via [`RawConfig::from_toml_file`]
/// - From a JSON object via `RawConfig::try_from(serde_json::Value)`
///
/// In the TOML-based methods, environment variables can be referenced using the
/// `{{ VAR_NAME }}` syntax and are substituted before parsing.
///
/// ```
/// use oidc_conf::RawConfig;
///
/// let raw = RawConfig::new()
///     .with("baseURL", "https://app.example.com")
///     .with("session.rolling", false);
/// assert!(raw.get_path("session.rolling").is_some());
/// ```
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawConfig(Map);

impl RawConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value at a dotted path and returns the config, builder style.
    pub fn with(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.set_path(path, value);
        self
    }

    ///
    /// Sets a value at a dotted path, creating intermediate maps as needed.
    /// An intermediate non-map value is replaced by a map.
    ///
    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) {
        let segments: Vec<&str> = path.split('.').collect();
        insert_path(&mut self.0, &segments, value.into());
    }

    /// Removes the value at a dotted path, returning it.
    pub fn remove_path(&mut self, path: &str) -> Option<Value> {
        let (parent, key) = match path.rsplit_once('.') {
            Some((parent, key)) => (Some(parent), key),
            None => (None, path),
        };
        let map = match parent {
            Some(parent) => match parent
                .split('.')
                .try_fold(&mut self.0, |map, key| match map.get_mut(key) {
                    Some(Value::Map(inner)) => Some(inner),
                    _ => None,
                }) {
                Some(map) => map,
                None => return None,
            },
            None => &mut self.0,
        };
        map.remove(key)
    }

    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let (first, rest) = match path.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (path, None),
        };
        let value = self.0.get(first)?;
        match rest {
            Some(rest) => value.get_path(rest),
            None => Some(value),
        }
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.get_path(path).is_some()
    }

    pub fn as_map(&self) -> &Map {
        &self.0
    }

    pub fn into_map(self) -> Map {
        self.0
    }

    ///
    /// Given a path to a TOML file, loads it, substitutes any environment
    /// variables, and returns the raw configuration.
    ///
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<RawConfig> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    ///
    /// Parses a configuration string in TOML format into a RawConfig.
    ///
    pub fn from_toml(toml_str: &str) -> Result<RawConfig> {
        toml_str.parse()
    }
}

fn insert_path(map: &mut Map, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let slot = map
                .entry(first.to_string())
                .or_insert_with(|| Value::Map(Map::new()));
            match slot {
                Value::Map(inner) => insert_path(inner, rest, value),
                other => {
                    let mut inner = Map::new();
                    insert_path(&mut inner, rest, value);
                    *other = Value::Map(inner);
                }
            }
        }
    }
}

impl From<Map> for RawConfig {
    fn from(map: Map) -> Self {
        Self(map)
    }
}

///
/// Parses a configuration string with references to environment variables
/// into a RawConfig by substituting the environment variables and then
/// parsing the resulting TOML.
///
impl FromStr for RawConfig {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let config_file = replace_handlebars_with_env(s);
        let table = toml::from_str::<toml::Table>(&config_file)?;
        Ok(Self(
            table
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect(),
        ))
    }
}

impl TryFrom<serde_json::Value> for RawConfig {
    type Error = Error;
    fn try_from(json: serde_json::Value) -> Result<Self> {
        match from_json(json) {
            Some(Value::Map(map)) => Ok(Self(map)),
            None => Ok(Self::default()),
            Some(other) => Err(Error::config(format!(
                "configuration root must be an object, found {}",
                other.type_name()
            ))),
        }
    }
}
