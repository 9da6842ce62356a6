//! Declarative field rules.
//!
//! A rule describes one field: its type, whether it is required, static checks,
//! its default, and any number of conditions that select a branch of extra
//! constraints based on the resolved value of other fields.
//!
//! ```
//! use oidc_conf::schema::{Branch, Condition, FieldRule, Kind};
//!
//! let rule = FieldRule::new("rollingDuration", Kind::Any).when(
//!     Condition::when("rolling", |s| s.bool(0) == Some(true))
//!         .then(Branch::new().kind(Kind::Integer).default(86400))
//!         .otherwise(Branch::new().kind(Kind::Bool).only([false]).required()),
//! );
//! # let _ = rule;
//! ```

use {
    super::path::{FieldPath, RefPath},
    crate::value::{Map, Value},
    regex::Regex,
    url::Url,
};

/// Read-only view handed to predicates and computed defaults.
///
/// `get(i)` returns the resolved value of the i-th declared reference.
/// `input(path)` reads the merged, not yet resolved input; reading it does not
/// create a dependency.
pub struct Scope<'a> {
    pub(crate) refs: Vec<Option<&'a Value>>,
    pub(crate) input: &'a Map,
}

impl<'a> Scope<'a> {
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.refs.get(index).copied().flatten()
    }

    pub fn bool(&self, index: usize) -> Option<bool> {
        self.get(index).and_then(Value::as_bool)
    }

    pub fn str(&self, index: usize) -> Option<&'a str> {
        self.get(index).and_then(Value::as_str)
    }

    pub fn input(&self, path: &str) -> Option<&'a Value> {
        let (first, rest) = match path.split_once('.') {
            Some((first, rest)) => (first, rest),
            None => (path, ""),
        };
        self.input.get(first)?.get_path(rest)
    }
}

pub type Predicate = fn(&Scope<'_>) -> bool;
pub type Compute = fn(&Scope<'_>) -> Option<Value>;

/// Identifies the kind of constraint a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Required,
    Type,
    Empty,
    Only,
    Invalid,
    Pattern,
    Uri,
    Min,
    Max,
    MinLength,
    MaxArity,
    Unknown,
}

/// Type constraint of a field.
#[derive(Debug, Clone)]
pub enum Kind {
    Any,
    Bool,
    /// The literal `false`, used as an alternative ("a route or false").
    False,
    Integer,
    Number,
    String,
    Binary,
    Array(Option<Box<Kind>>),
    /// A plain key/value map.
    Map,
    /// A map or an opaque handle.
    Object,
    Function,
    OneOf(Vec<Kind>),
}

/// A constraint failure before message overrides are applied.
#[derive(Debug, Clone)]
pub(crate) struct Failure {
    pub path: FieldPath,
    pub code: Code,
    pub message: String,
}

impl Failure {
    fn new(path: &FieldPath, code: Code, message: String) -> Self {
        Self {
            path: path.clone(),
            code,
            message,
        }
    }
}

impl Kind {
    pub fn array_of(item: Kind) -> Self {
        Kind::Array(Some(Box::new(item)))
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Kind::Any => "any",
            Kind::Bool => "boolean",
            Kind::False => "false",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Binary => "binary",
            Kind::Array(_) => "array",
            Kind::Map | Kind::Object => "object",
            Kind::Function => "function",
            Kind::OneOf(_) => "alternatives",
        }
    }

    /// Whether strings are acceptable, which makes the empty-string rule apply.
    pub(crate) fn admits_strings(&self) -> bool {
        match self {
            Kind::String => true,
            Kind::OneOf(kinds) => kinds.iter().any(Kind::admits_strings),
            _ => false,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Kind::Any, _) => true,
            (Kind::Bool, Value::Bool(_)) => true,
            (Kind::False, Value::Bool(false)) => true,
            (Kind::Integer, Value::Integer(_)) => true,
            // whole floats of any magnitude, range is left to `Check::Max`
            (Kind::Integer, Value::Float(f)) => f.is_finite() && f.fract() == 0.0,
            (Kind::Number, v) => v.as_f64().is_some(),
            (Kind::String, Value::String(_)) => true,
            (Kind::Binary, Value::Binary(_)) => true,
            (Kind::Array(None), Value::Array(_)) => true,
            (Kind::Array(Some(item)), Value::Array(items)) => items.iter().all(|v| item.accepts(v)),
            (Kind::Map, Value::Map(_)) => true,
            (Kind::Object, Value::Map(_) | Value::Object(_)) => true,
            (Kind::Function, Value::Function(_)) => true,
            (Kind::OneOf(kinds), v) => kinds.iter().any(|k| k.accepts(v)),
            _ => false,
        }
    }

    /// Checks the value's type, reporting array items by index.
    pub(crate) fn check(&self, path: &FieldPath, value: &Value) -> Option<Failure> {
        if self.accepts(value) {
            return None;
        }
        if let Kind::OneOf(kinds) = self {
            // an array that is an allowed alternative reports its offending item
            if let Value::Array(_) = value {
                if let Some(array) = kinds.iter().find(|k| matches!(k, Kind::Array(_))) {
                    return array.check(path, value);
                }
            }
        }
        if let (Kind::Array(Some(item)), Value::Array(items)) = (self, value) {
            return items
                .iter()
                .enumerate()
                .find_map(|(i, v)| item.check(&path.item(i), v));
        }
        let message = match self {
            Kind::Integer if value.as_f64().is_some() => format!("\"{path}\" must be an integer"),
            Kind::Integer | Kind::Number => format!("\"{path}\" must be a number"),
            Kind::Bool => format!("\"{path}\" must be a boolean"),
            Kind::False => format!("\"{path}\" must be [false]"),
            Kind::String => format!("\"{path}\" must be a string"),
            Kind::Binary => format!("\"{path}\" must be a buffer"),
            Kind::Array(_) => format!("\"{path}\" must be an array"),
            Kind::Map | Kind::Object => format!("\"{path}\" must be of type object"),
            Kind::Function => format!("\"{path}\" must be of type function"),
            Kind::OneOf(kinds) => {
                let names: Vec<&str> = kinds.iter().map(Kind::name).collect();
                format!(
                    "\"{path}\" does not match any of the allowed types [{}]",
                    names.join(", ")
                )
            }
            Kind::Any => return None,
        };
        Some(Failure::new(path, Code::Type, message))
    }
}

/// Shape a URI-valued string must have.
#[derive(Debug, Clone, Copy)]
pub enum UriShape {
    /// Any absolute URI.
    Absolute,
    /// An absolute URI with one of the listed schemes.
    Schemes(&'static [&'static str]),
    /// A relative reference only (`/callback`).
    RelativeOnly,
    /// Absolute or relative.
    AllowRelative,
}

impl UriShape {
    fn matches(&self, s: &str) -> bool {
        if s.chars().any(char::is_whitespace) {
            return false;
        }
        let absolute = Url::parse(s);
        let relative_ok = || {
            matches!(absolute, Err(url::ParseError::RelativeUrlWithoutBase))
                && Url::parse("http://relative.invalid")
                    .and_then(|base| base.join(s))
                    .is_ok()
        };
        match self {
            UriShape::Absolute => absolute.is_ok(),
            UriShape::Schemes(schemes) => absolute
                .as_ref()
                .map(|u| schemes.contains(&u.scheme()))
                .unwrap_or(false),
            UriShape::RelativeOnly => relative_ok(),
            UriShape::AllowRelative => absolute.is_ok() || relative_ok(),
        }
    }

    fn describe(&self) -> String {
        match self {
            UriShape::Absolute | UriShape::AllowRelative => "a valid uri".into(),
            UriShape::Schemes(schemes) => format!(
                "a valid uri with a scheme matching the {} pattern",
                schemes.join("|")
            ),
            UriShape::RelativeOnly => "a valid relative uri".into(),
        }
    }
}

/// Static constraint applied to an explicit value.
#[derive(Debug, Clone)]
pub enum Check {
    /// The value must equal one of these.
    Only(Vec<Value>),
    /// The value must not equal any of these.
    Invalid { values: Vec<Value>, ignore_case: bool },
    Pattern { regex: Regex, name: &'static str },
    Uri(UriShape),
    Min(f64),
    Max(f64),
    /// Minimum length of strings and binaries, applied per item for arrays.
    MinLength(usize),
    MaxArity(usize),
}

impl Check {
    pub fn pattern(pattern: &str, name: &'static str) -> Self {
        // rule patterns are literals declared alongside the schema
        Check::Pattern {
            regex: Regex::new(pattern).unwrap(),
            name,
        }
    }

    pub(crate) fn code(&self) -> Code {
        match self {
            Check::Only(_) => Code::Only,
            Check::Invalid { .. } => Code::Invalid,
            Check::Pattern { .. } => Code::Pattern,
            Check::Uri(_) => Code::Uri,
            Check::Min(_) => Code::Min,
            Check::Max(_) => Code::Max,
            Check::MinLength(_) => Code::MinLength,
            Check::MaxArity(_) => Code::MaxArity,
        }
    }

    pub(crate) fn verify(&self, path: &FieldPath, value: &Value) -> Option<Failure> {
        let fail = |message: String| Some(Failure::new(path, self.code(), message));
        match self {
            Check::Only(allowed) => {
                if allowed.contains(value) {
                    return None;
                }
                let names: Vec<String> = allowed.iter().map(Value::to_string).collect();
                if names.len() == 1 {
                    fail(format!("\"{path}\" must be [{}]", names[0]))
                } else {
                    fail(format!("\"{path}\" must be one of [{}]", names.join(", ")))
                }
            }
            Check::Invalid {
                values,
                ignore_case,
            } => {
                let hit = values.iter().any(|v| match (v, value, ignore_case) {
                    (Value::String(a), Value::String(b), true) => a.eq_ignore_ascii_case(b),
                    _ => v == value,
                });
                if hit {
                    fail(format!("\"{path}\" contains an invalid value"))
                } else {
                    None
                }
            }
            Check::Pattern { regex, name } => match value.as_str() {
                Some(s) if !regex.is_match(s) => fail(format!(
                    "\"{path}\" with value \"{s}\" fails to match the {name} pattern"
                )),
                _ => None,
            },
            Check::Uri(shape) => match value.as_str() {
                Some(s) if !s.is_empty() && !shape.matches(s) => {
                    fail(format!("\"{path}\" must be {}", shape.describe()))
                }
                _ => None,
            },
            Check::Min(min) => match value.as_f64() {
                Some(n) if n < *min => {
                    fail(format!("\"{path}\" must be greater than or equal to {min}"))
                }
                _ => None,
            },
            Check::Max(max) => match value.as_f64() {
                Some(n) if n > *max => {
                    fail(format!("\"{path}\" must be less than or equal to {max}"))
                }
                _ => None,
            },
            Check::MinLength(min) => match value {
                Value::String(s) if s.chars().count() < *min => fail(format!(
                    "\"{path}\" length must be at least {min} characters long"
                )),
                Value::Binary(b) if b.len() < *min => fail(format!(
                    "\"{path}\" must be at least {min} bytes"
                )),
                Value::Array(items) => items
                    .iter()
                    .enumerate()
                    .find_map(|(i, v)| self.verify(&path.item(i), v)),
                _ => None,
            },
            Check::MaxArity(max) => match value.as_hook() {
                Some(h) if h.arity() > *max => fail(format!(
                    "\"{path}\" must have an arity lesser or equal to {max}"
                )),
                _ => None,
            },
        }
    }
}

/// How a field's value is produced when the caller omits it.
#[derive(Debug, Clone)]
pub enum DefaultSpec {
    Const(Value),
    /// The resolved value of another field.
    Ref { path: RefPath, target: usize },
    /// A pure function of other resolved fields.
    Computed {
        refs: Vec<RefPath>,
        targets: Vec<usize>,
        compute: Compute,
    },
}

/// A non-fatal warning attached to explicit values.
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryRule {
    pub(crate) applies: fn(&Value) -> bool,
    pub(crate) message: &'static str,
}

/// Extra constraints contributed by a condition.
#[derive(Debug, Clone)]
pub struct Branch {
    pub(crate) kind: Option<Kind>,
    pub(crate) required: Option<bool>,
    pub(crate) checks: Vec<Check>,
    pub(crate) default: Option<DefaultSpec>,
    pub(crate) advisory: Option<AdvisoryRule>,
    pub(crate) messages: Vec<(Code, &'static str)>,
}

impl Branch {
    pub fn new() -> Self {
        Self {
            kind: None,
            required: None,
            checks: Vec::new(),
            default: None,
            advisory: None,
            messages: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn only<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.check(Check::Only(values.into_iter().map(Into::into).collect()))
    }

    pub fn invalid<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.check(Check::Invalid {
            values: values.into_iter().map(Into::into).collect(),
            ignore_case: false,
        })
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultSpec::Const(value.into()));
        self
    }

    pub fn warn(mut self, applies: fn(&Value) -> bool, message: &'static str) -> Self {
        self.advisory = Some(AdvisoryRule { applies, message });
        self
    }

    /// Overrides the message reported for a constraint code. `{{ref}}` is
    /// replaced by the condition's first referenced value.
    pub fn message(mut self, code: Code, message: &'static str) -> Self {
        self.messages.push((code, message));
        self
    }
}

/// Selects a branch by testing the resolved values of referenced fields.
#[derive(Debug, Clone)]
pub struct Condition {
    pub(crate) refs: Vec<RefPath>,
    pub(crate) targets: Vec<usize>,
    pub(crate) test: Predicate,
    pub(crate) then: Branch,
    pub(crate) otherwise: Option<Branch>,
}

impl Condition {
    pub fn when(reference: &str, test: Predicate) -> Self {
        Self::when_all(&[reference], test)
    }

    pub fn when_all(references: &[&str], test: Predicate) -> Self {
        Self {
            refs: references.iter().map(|r| RefPath::parse(r)).collect(),
            targets: Vec::new(),
            test,
            then: Branch::new(),
            otherwise: None,
        }
    }

    pub fn then(mut self, branch: Branch) -> Self {
        self.then = branch;
        self
    }

    pub fn otherwise(mut self, branch: Branch) -> Self {
        self.otherwise = Some(branch);
        self
    }
}

/// Rule for a single (non-object) field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub(crate) key: &'static str,
    pub(crate) kind: Kind,
    pub(crate) required: bool,
    pub(crate) allow_empty: bool,
    pub(crate) checks: Vec<Check>,
    pub(crate) default: Option<DefaultSpec>,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) advisory: Option<AdvisoryRule>,
    pub(crate) messages: Vec<(Code, &'static str)>,
}

impl FieldRule {
    pub fn new(key: &'static str, kind: Kind) -> Self {
        Self {
            key,
            kind,
            required: false,
            allow_empty: false,
            checks: Vec::new(),
            default: None,
            conditions: Vec::new(),
            advisory: None,
            messages: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn only<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.check(Check::Only(values.into_iter().map(Into::into).collect()))
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultSpec::Const(value.into()));
        self
    }

    /// Defaults to the resolved value of another field.
    pub fn default_ref(mut self, reference: &str) -> Self {
        self.default = Some(DefaultSpec::Ref {
            path: RefPath::parse(reference),
            target: usize::MAX,
        });
        self
    }

    /// Defaults to a function of the resolved values of `references`.
    pub fn default_with(mut self, references: &[&str], compute: Compute) -> Self {
        self.default = Some(DefaultSpec::Computed {
            refs: references.iter().map(|r| RefPath::parse(r)).collect(),
            targets: Vec::new(),
            compute,
        });
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn warn(mut self, applies: fn(&Value) -> bool, message: &'static str) -> Self {
        self.advisory = Some(AdvisoryRule { applies, message });
        self
    }

    pub fn message(mut self, code: Code, message: &'static str) -> Self {
        self.messages.push((code, message));
        self
    }
}

/// Policy for keys an object rule does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownKeys {
    Deny,
    /// Undeclared keys are passed through untouched.
    Allow,
}

/// What an omitted object resolves to.
#[derive(Debug, Clone)]
pub enum ObjectDefault {
    /// An object built from the children's defaults.
    Empty,
    Value(Value),
}

/// Rule for a nested object (a section of the configuration).
#[derive(Debug, Clone)]
pub struct ObjectRule {
    pub(crate) key: &'static str,
    pub(crate) children: Vec<Node>,
    pub(crate) unknown: UnknownKeys,
    pub(crate) default: ObjectDefault,
    pub(crate) alternative: Option<Kind>,
}

impl ObjectRule {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            children: Vec::new(),
            unknown: UnknownKeys::Deny,
            default: ObjectDefault::Empty,
            alternative: None,
        }
    }

    /// The root object of a schema.
    pub fn root() -> Self {
        Self::new("")
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.children.push(Node::Field(rule));
        self
    }

    pub fn object(mut self, rule: ObjectRule) -> Self {
        self.children.push(Node::Object(rule));
        self
    }

    pub fn allow_unknown(mut self) -> Self {
        self.unknown = UnknownKeys::Allow;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = ObjectDefault::Value(value.into());
        self
    }

    /// Accepts a scalar of this kind in place of the object.
    pub fn or_kind(mut self, kind: Kind) -> Self {
        self.alternative = Some(kind);
        self
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Field(FieldRule),
    Object(ObjectRule),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Hook;

    fn path(p: &str) -> FieldPath {
        FieldPath::new(p)
    }

    #[test]
    fn test_kind_messages() {
        let f = Kind::Bool.check(&path("session.rolling"), &Value::from("yes")).unwrap();
        assert_eq!(f.code, Code::Type);
        assert_eq!(f.message, "\"session.rolling\" must be a boolean");

        let f = Kind::Integer.check(&path("x"), &Value::Float(1.5)).unwrap();
        assert_eq!(f.message, "\"x\" must be an integer");

        let f = Kind::Integer.check(&path("x"), &Value::from("1")).unwrap();
        assert_eq!(f.message, "\"x\" must be a number");

        assert!(Kind::Integer.check(&path("x"), &Value::Float(3.0)).is_none());
        assert!(Kind::Integer.check(&path("x"), &Value::Float(1e20)).is_none());
    }

    #[test]
    fn test_one_of_reports_array_item() {
        let kind = Kind::OneOf(vec![
            Kind::String,
            Kind::Binary,
            Kind::array_of(Kind::OneOf(vec![Kind::String, Kind::Binary])),
        ]);
        let value = Value::Array(vec![Value::from("long enough"), Value::Integer(3)]);
        let f = kind.check(&path("secret"), &value).unwrap();
        assert_eq!(f.path.as_str(), "secret[1]");

        let f = kind.check(&path("secret"), &Value::Bool(true)).unwrap();
        assert!(f.message.contains("does not match any of the allowed types"));
    }

    #[test]
    fn test_only_and_invalid() {
        let only = Check::Only(vec!["Lax".into(), "Strict".into(), "None".into()]);
        assert!(only.verify(&path("s"), &"Lax".into()).is_none());
        let f = only.verify(&path("s"), &"lax".into()).unwrap();
        assert_eq!(f.message, "\"s\" must be one of [Lax, Strict, None]");

        let single = Check::Only(vec![false.into()]);
        assert_eq!(
            single.verify(&path("s"), &true.into()).unwrap().message,
            "\"s\" must be [false]"
        );

        let invalid = Check::Invalid {
            values: vec!["none".into()],
            ignore_case: true,
        };
        assert!(invalid.verify(&path("alg"), &"NONE".into()).is_some());
        assert!(invalid.verify(&path("alg"), &"RS256".into()).is_none());
    }

    #[test]
    fn test_pattern_check() {
        let check = Check::pattern(r"^[0-9a-zA-Z_.-]+$", "cookie name");
        assert!(check.verify(&path("n"), &"appSession".into()).is_none());
        assert_eq!(
            check.verify(&path("n"), &"app session".into()).unwrap().message,
            "\"n\" with value \"app session\" fails to match the cookie name pattern"
        );
    }

    #[test]
    fn test_uri_shapes() {
        let http = Check::Uri(UriShape::Schemes(&["http", "https"]));
        assert!(http.verify(&path("u"), &"https://example.com".into()).is_none());
        assert!(http.verify(&path("u"), &"ftp://example.com".into()).is_some());
        assert!(http.verify(&path("u"), &"/relative".into()).is_some());

        let relative = Check::Uri(UriShape::RelativeOnly);
        assert!(relative.verify(&path("r"), &"/callback".into()).is_none());
        assert!(relative.verify(&path("r"), &"https://x.example/cb".into()).is_some());
        assert!(relative.verify(&path("r"), &"/has space".into()).is_some());
        // non-strings are left to the type rule
        assert!(relative.verify(&path("r"), &false.into()).is_none());

        let any = Check::Uri(UriShape::AllowRelative);
        assert!(any.verify(&path("r"), &"https://x.example/cb".into()).is_none());
        assert!(any.verify(&path("r"), &"/cb".into()).is_none());
    }

    #[test]
    fn test_min_and_min_length() {
        let min = Check::Min(500.0);
        assert!(min.verify(&path("t"), &Value::Integer(500)).is_none());
        assert_eq!(
            min.verify(&path("t"), &Value::Integer(499)).unwrap().message,
            "\"t\" must be greater than or equal to 500"
        );

        let max = Check::Max(9_007_199_254_740_991.0);
        assert!(max.verify(&path("t"), &Value::Integer(9_007_199_254_740_991)).is_none());
        let f = max.verify(&path("t"), &Value::Float(1e20)).unwrap();
        assert_eq!(f.code, Code::Max);
        assert_eq!(f.message, "\"t\" must be less than or equal to 9007199254740991");

        let len = Check::MinLength(8);
        assert!(len.verify(&path("s"), &"12345678".into()).is_none());
        assert!(len.verify(&path("s"), &"1234567".into()).is_some());
        assert!(len.verify(&path("s"), &Value::binary(vec![0u8; 7])).is_some());
        let f = len
            .verify(&path("s"), &Value::Array(vec!["12345678".into(), "short".into()]))
            .unwrap();
        assert_eq!(f.path.as_str(), "s[1]");
    }

    #[test]
    fn test_max_arity() {
        fn two(_: u8, _: u8) {}
        let hook = Hook::new("two", 2, two as fn(u8, u8));
        let f = Check::MaxArity(1).verify(&path("g"), &hook.into()).unwrap();
        assert_eq!(f.code, Code::MaxArity);
    }

    #[test]
    fn test_scope_access() {
        let mut input = Map::new();
        input.insert("clientAssertionSigningKey".into(), "pem".into());
        let rolling = Value::Bool(true);
        let scope = Scope {
            refs: vec![Some(&rolling), None],
            input: &input,
        };
        assert_eq!(scope.bool(0), Some(true));
        assert!(scope.get(1).is_none());
        assert!(scope.get(7).is_none());
        assert!(scope.input("clientAssertionSigningKey").is_some());
        assert!(scope.input("missing.path").is_none());
    }
}
