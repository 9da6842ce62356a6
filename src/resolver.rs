//!
//! Evaluation of a compiled [`Schema`] against a merged input.
//!
//! Resolution is a depth-first walk from the root object. Before a field is
//! resolved, every field its conditions or default reference is resolved first,
//! so evaluation follows the schema's dependency order with ties broken by
//! declaration order. Each entry is resolved once per call and memoized for the
//! rest of that call only.
//!
//! For each field:
//! 1. the conditions are tested against already resolved values and the
//!    selected branches are layered over the base rule;
//! 2. an explicit value is checked against type, emptiness and static checks,
//!    and the first failure halts resolution;
//! 3. an absent value fails if required, otherwise takes its default, which is
//!    trusted and not re-checked;
//! 4. an explicit value may raise an advisory, which never alters the value.
//!

use {
    crate::{
        Error, ErrorKind,
        advisory::{Advisory, AdvisoryChannel},
        schema::{
            AdvisoryRule, Branch, Check, Code, DefaultSpec, Failure, FieldPath, FieldRule, Kind,
            ObjectDefault, Schema, Scope, Shape, UnknownKeys,
        },
        value::{Map, Value},
    },
    thiserror::Error,
};

/// The first violated constraint of a resolution.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct Violation {
    pub kind: ErrorKind,
    pub field: FieldPath,
    pub message: String,
}

impl From<Violation> for Error {
    fn from(v: Violation) -> Self {
        Error::new(v.kind, v.message).with_field(v.field.to_string())
    }
}

/// A fully resolved value tree plus at most one advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: Map,
    pub advisory: Option<Advisory>,
}

/// Resolves `input` against `schema`.
pub fn resolve(schema: &Schema, input: &Map) -> Result<Resolution, Violation> {
    let mut resolver = Resolver {
        schema,
        input,
        memo: vec![None; schema.len()],
        advisories: AdvisoryChannel::default(),
    };
    resolver.resolve_entry(Schema::ROOT)?;
    let value = match resolver.value(Schema::ROOT) {
        Some(Value::Map(map)) => map.clone(),
        _ => Map::new(),
    };
    Ok(Resolution {
        value,
        advisory: resolver.advisories.into_first(),
    })
}

struct Resolver<'a> {
    schema: &'a Schema,
    input: &'a Map,
    /// `None` until resolved, then the resolved value or `Some(None)` for absent.
    memo: Vec<Option<Option<Value>>>,
    advisories: AdvisoryChannel,
}

/// A base rule with the selected branches layered on top. The boolean beside
/// each constraint records whether a branch contributed it.
struct Effective<'r> {
    kind: (&'r Kind, bool),
    required: (bool, bool),
    allow_empty: bool,
    checks: Vec<(&'r Check, bool)>,
    default: Option<&'r DefaultSpec>,
    advisory: Option<&'r AdvisoryRule>,
    messages: Vec<(Code, String)>,
}

impl<'r> Effective<'r> {
    fn new(rule: &'r FieldRule) -> Self {
        Self {
            kind: (&rule.kind, false),
            required: (rule.required, false),
            allow_empty: rule.allow_empty,
            checks: rule.checks.iter().map(|c| (c, false)).collect(),
            default: rule.default.as_ref(),
            advisory: rule.advisory.as_ref(),
            messages: rule
                .messages
                .iter()
                .map(|(code, msg)| (*code, msg.to_string()))
                .collect(),
        }
    }

    fn apply(&mut self, branch: &'r Branch, reference: &str) {
        if let Some(kind) = &branch.kind {
            self.kind = (kind, true);
        }
        if let Some(required) = branch.required {
            self.required = (required, true);
        }
        self.checks.extend(branch.checks.iter().map(|c| (c, true)));
        if branch.default.is_some() {
            self.default = branch.default.as_ref();
        }
        if branch.advisory.is_some() {
            self.advisory = branch.advisory.as_ref();
        }
        self.messages.extend(
            branch
                .messages
                .iter()
                .map(|(code, msg)| (*code, msg.replace("{{ref}}", reference))),
        );
    }

    fn violation(&self, failure: Failure, from_branch: bool) -> Violation {
        let message = self
            .messages
            .iter()
            .rev()
            .find(|(code, _)| *code == failure.code)
            .map(|(_, msg)| msg.clone())
            .unwrap_or(failure.message);
        Violation {
            kind: classify(failure.code, from_branch),
            field: failure.path,
            message,
        }
    }
}

fn classify(code: Code, from_branch: bool) -> ErrorKind {
    match code {
        Code::Required => ErrorKind::MissingRequiredField,
        Code::Type => ErrorKind::TypeMismatch,
        Code::Only | Code::Invalid if from_branch => ErrorKind::CrossFieldConstraint,
        _ => ErrorKind::FormatViolation,
    }
}

impl<'a> Resolver<'a> {
    fn value(&self, idx: usize) -> Option<&Value> {
        self.memo[idx].as_ref().and_then(Option::as_ref)
    }

    fn raw(&self, path: &FieldPath) -> Option<&'a Value> {
        if path.is_root() {
            return None;
        }
        let (first, rest) = match path.as_str().split_once('.') {
            Some((first, rest)) => (first, rest),
            None => (path.as_str(), ""),
        };
        self.input.get(first)?.get_path(rest)
    }

    fn scope(&self, targets: &[usize]) -> Scope<'_> {
        Scope {
            refs: targets.iter().map(|t| self.value(*t)).collect(),
            input: self.input,
        }
    }

    fn resolve_entry(&mut self, idx: usize) -> Result<(), Violation> {
        if self.memo[idx].is_some() {
            return Ok(());
        }
        let schema = self.schema;
        let entry = schema.entry(idx);
        let value = match &entry.shape {
            Shape::Field(rule) => {
                for dep in schema.dependencies(idx) {
                    self.resolve_entry(dep)?;
                }
                self.resolve_field(&entry.path, rule)?
            }
            Shape::Object {
                children,
                unknown,
                default,
                alternative,
            } => self.resolve_object(&entry.path, children, *unknown, default, alternative.as_ref())?,
        };
        self.memo[idx] = Some(value);
        Ok(())
    }

    fn resolve_field(
        &mut self,
        path: &FieldPath,
        rule: &'a FieldRule,
    ) -> Result<Option<Value>, Violation> {
        let mut effective = Effective::new(rule);
        for condition in &rule.conditions {
            let scope = self.scope(&condition.targets);
            let branch = if (condition.test)(&scope) {
                Some(&condition.then)
            } else {
                condition.otherwise.as_ref()
            };
            if let Some(branch) = branch {
                let reference = scope.get(0).map(Value::to_string).unwrap_or_default();
                effective.apply(branch, &reference);
            }
        }

        let Some(value) = self.raw(path) else {
            if effective.required.0 {
                let failure = Failure {
                    path: path.clone(),
                    code: Code::Required,
                    message: format!("\"{path}\" is required"),
                };
                return Err(effective.violation(failure, effective.required.1));
            }
            return Ok(effective.default.and_then(|d| self.default_value(d)));
        };

        let (kind, kind_from_branch) = effective.kind;
        if let Some(failure) = kind.check(path, value) {
            return Err(effective.violation(failure, kind_from_branch));
        }
        if !effective.allow_empty && kind.admits_strings() && value.as_str() == Some("") {
            let failure = Failure {
                path: path.clone(),
                code: Code::Empty,
                message: format!("\"{path}\" is not allowed to be empty"),
            };
            return Err(effective.violation(failure, kind_from_branch));
        }
        for (check, from_branch) in &effective.checks {
            if let Some(failure) = check.verify(path, value) {
                return Err(effective.violation(failure, *from_branch));
            }
        }
        if let Some(advisory) = effective.advisory {
            if (advisory.applies)(value) {
                self.advisories
                    .offer(Advisory::new(path.to_string(), advisory.message));
            }
        }
        Ok(Some(value.clone()))
    }

    fn default_value(&self, default: &DefaultSpec) -> Option<Value> {
        match default {
            DefaultSpec::Const(value) => Some(value.clone()),
            DefaultSpec::Ref { target, .. } => self.value(*target).cloned(),
            DefaultSpec::Computed {
                targets, compute, ..
            } => compute(&self.scope(targets)),
        }
    }

    fn resolve_object(
        &mut self,
        path: &FieldPath,
        children: &[usize],
        unknown: UnknownKeys,
        default: &ObjectDefault,
        alternative: Option<&Kind>,
    ) -> Result<Option<Value>, Violation> {
        let provided: Option<&'a Map> = if path.is_root() {
            Some(self.input)
        } else {
            match self.raw(path) {
                Some(Value::Map(map)) => Some(map),
                Some(other) => {
                    if let Some(alt) = alternative {
                        if alt.check(path, other).is_none() {
                            return Ok(Some(other.clone()));
                        }
                    }
                    let message = match alternative {
                        Some(alt) => format!("\"{path}\" must be one of [object, {}]", alt.name()),
                        None => format!("\"{path}\" must be of type object"),
                    };
                    return Err(Violation {
                        kind: ErrorKind::TypeMismatch,
                        field: path.clone(),
                        message,
                    });
                }
                None => match default {
                    ObjectDefault::Empty => None,
                    ObjectDefault::Value(value) => return Ok(Some(value.clone())),
                },
            }
        };

        for &child in children {
            self.resolve_entry(child)?;
        }

        let schema = self.schema;
        let mut out = Map::new();
        if let Some(map) = provided {
            for (key, value) in map {
                if children.iter().any(|c| schema.entry(*c).path.key() == key) {
                    continue;
                }
                match unknown {
                    UnknownKeys::Deny => {
                        let field = path.child(key);
                        return Err(Violation {
                            kind: ErrorKind::FormatViolation,
                            message: format!("\"{field}\" is not allowed"),
                            field,
                        });
                    }
                    UnknownKeys::Allow => {
                        out.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        for &child in children {
            if let Some(value) = self.value(child) {
                out.insert(schema.entry(child).path.key().to_string(), value.clone());
            }
        }
        Ok(Some(Value::Map(out)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Condition, ObjectRule, UriShape};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn input(pairs: &[(&str, Value)]) -> Map {
        let mut raw = crate::RawConfig::new();
        for (k, v) in pairs {
            raw.set_path(k, v.clone());
        }
        raw.into_map()
    }

    fn flag_schema() -> Schema {
        Schema::new(
            ObjectRule::root()
                .field(FieldRule::new("flag", Kind::Bool).default(true))
                .field(
                    FieldRule::new("duration", Kind::Any).when(
                        Condition::when("flag", |s| s.bool(0) == Some(true))
                            .then(Branch::new().kind(Kind::Integer).default(10))
                            .otherwise(
                                Branch::new()
                                    .kind(Kind::Bool)
                                    .only([false])
                                    .required()
                                    .message(Code::Required, "\"duration\" must be false"),
                            ),
                    ),
                ),
        )
        .unwrap()
    }

    #[test]
    fn test_conditional_default() {
        let r = resolve(&flag_schema(), &Map::new()).unwrap();
        assert_eq!(r.value.get("flag"), Some(&Value::Bool(true)));
        assert_eq!(r.value.get("duration"), Some(&Value::Integer(10)));
        assert!(r.advisory.is_none());
    }

    #[test]
    fn test_otherwise_branch_requires_sentinel() {
        let schema = flag_schema();
        let err = resolve(&schema, &input(&[("flag", false.into())])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingRequiredField);
        assert_eq!(err.message, "\"duration\" must be false");

        let ok = resolve(
            &schema,
            &input(&[("flag", false.into()), ("duration", false.into())]),
        )
        .unwrap();
        assert_eq!(ok.value.get("duration"), Some(&Value::Bool(false)));

        let err = resolve(
            &schema,
            &input(&[("flag", false.into()), ("duration", true.into())]),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::CrossFieldConstraint);
        assert_eq!(err.message, "\"duration\" must be [false]");
    }

    #[test]
    fn test_first_violation_in_declaration_order() {
        let schema = Schema::new(
            ObjectRule::root()
                .field(FieldRule::new("a", Kind::String).required())
                .field(FieldRule::new("b", Kind::String).required()),
        )
        .unwrap();
        let err = resolve(&schema, &Map::new()).unwrap_err();
        assert_eq!(err.field.as_str(), "a");
        assert_eq!(err.message, "\"a\" is required");
    }

    #[test]
    fn test_dependency_violation_reported_before_dependent() {
        // "late" is declared first but depends on "early", which is invalid
        let schema = Schema::new(
            ObjectRule::root()
                .field(FieldRule::new("late", Kind::Bool).default_ref("early"))
                .field(FieldRule::new("early", Kind::Bool)),
        )
        .unwrap();
        let err = resolve(&schema, &input(&[("early", "x".into())])).unwrap_err();
        assert_eq!(err.field.as_str(), "early");

        let ok = resolve(&schema, &input(&[("early", false.into())])).unwrap();
        assert_eq!(ok.value.get("late"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_defaults_are_not_rechecked() {
        let schema = Schema::new(
            ObjectRule::root().field(
                FieldRule::new("url", Kind::String)
                    .check(Check::Uri(UriShape::Absolute))
                    .default("not a url"),
            ),
        )
        .unwrap();
        let r = resolve(&schema, &Map::new()).unwrap();
        assert_eq!(r.value.get("url"), Some(&Value::from("not a url")));
    }

    #[test]
    fn test_empty_strings_rejected_unless_allowed() {
        let schema = Schema::new(
            ObjectRule::root()
                .field(FieldRule::new("a", Kind::String))
                .field(FieldRule::new("b", Kind::String).allow_empty()),
        )
        .unwrap();
        let err = resolve(&schema, &input(&[("a", "".into())])).unwrap_err();
        assert_eq!(err.message, "\"a\" is not allowed to be empty");
        assert!(resolve(&schema, &input(&[("b", "".into())])).is_ok());
    }

    #[test]
    fn test_unknown_keys() {
        let schema = Schema::new(
            ObjectRule::root()
                .object(ObjectRule::new("strict").field(FieldRule::new("x", Kind::Bool)))
                .object(
                    ObjectRule::new("loose")
                        .allow_unknown()
                        .field(FieldRule::new("x", Kind::Bool)),
                ),
        )
        .unwrap();
        let err = resolve(&schema, &input(&[("strict.y", true.into())])).unwrap_err();
        assert_eq!(err.message, "\"strict.y\" is not allowed");
        assert_eq!(err.kind, ErrorKind::FormatViolation);

        let err = resolve(&schema, &input(&[("other", true.into())])).unwrap_err();
        assert_eq!(err.message, "\"other\" is not allowed");

        let r = resolve(&schema, &input(&[("loose.extra", 3.into())])).unwrap();
        let loose = r.value.get("loose").and_then(Value::as_map).unwrap();
        assert_eq!(loose.get("extra"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_object_alternative_and_default() {
        let schema = Schema::new(
            ObjectRule::root().object(
                ObjectRule::new("bcl")
                    .or_kind(Kind::Bool)
                    .default(false)
                    .field(FieldRule::new("store", Kind::Object)),
            ),
        )
        .unwrap();
        let r = resolve(&schema, &Map::new()).unwrap();
        assert_eq!(r.value.get("bcl"), Some(&Value::Bool(false)));

        let r = resolve(&schema, &input(&[("bcl", true.into())])).unwrap();
        assert_eq!(r.value.get("bcl"), Some(&Value::Bool(true)));

        let err = resolve(&schema, &input(&[("bcl", "yes".into())])).unwrap_err();
        assert_eq!(err.message, "\"bcl\" must be one of [object, boolean]");
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_section_type_mismatch() {
        let schema =
            Schema::new(ObjectRule::root().object(ObjectRule::new("session"))).unwrap();
        let err = resolve(&schema, &input(&[("session", 1.into())])).unwrap_err();
        assert_eq!(err.message, "\"session\" must be of type object");
    }

    #[test]
    fn test_message_interpolates_reference() {
        let schema = Schema::new(
            ObjectRule::root()
                .field(FieldRule::new("method", Kind::String).default("client_secret_post"))
                .field(
                    FieldRule::new("secret", Kind::String).when(
                        Condition::when("method", |s| s.str(0).is_some())
                            .then(Branch::new().required().message(
                                Code::Required,
                                "\"secret\" is required for \"{{ref}}\"",
                            )),
                    ),
                ),
        )
        .unwrap();
        let err = resolve(&schema, &Map::new()).unwrap_err();
        assert_eq!(err.message, "\"secret\" is required for \"client_secret_post\"");
    }

    #[test]
    fn test_only_first_advisory_surfaces() {
        let warn_if_false = |v: &Value| v.as_bool() == Some(false);
        let schema = Schema::new(
            ObjectRule::root()
                .field(FieldRule::new("a", Kind::Bool).warn(warn_if_false, "a is off"))
                .field(FieldRule::new("b", Kind::Bool).warn(warn_if_false, "b is off")),
        )
        .unwrap();
        let r = resolve(&schema, &input(&[("a", false.into()), ("b", false.into())])).unwrap();
        let advisory = r.advisory.unwrap();
        assert_eq!(advisory.field(), "a");
        assert_eq!(advisory.message(), "a is off");
        assert_eq!(r.value.get("a"), Some(&Value::Bool(false)));

        let r = resolve(&schema, &input(&[("b", false.into())])).unwrap();
        assert_eq!(r.advisory.unwrap().field(), "b");
    }

    static COMPUTE_CALLS: AtomicUsize = AtomicUsize::new(0);

    #[test]
    fn test_computed_default_evaluated_once_per_call() {
        let schema = Schema::new(
            ObjectRule::root()
                .field(FieldRule::new("base", Kind::Integer).default(2))
                .field(FieldRule::new("derived", Kind::Integer).default_with(&["base"], |s| {
                    COMPUTE_CALLS.fetch_add(1, Ordering::SeqCst);
                    Some(Value::Integer(s.get(0)?.as_i64()? * 10))
                }))
                .field(FieldRule::new("a", Kind::Integer).default_ref("derived"))
                .field(FieldRule::new("b", Kind::Integer).default_ref("derived")),
        )
        .unwrap();
        let before = COMPUTE_CALLS.load(Ordering::SeqCst);
        let r = resolve(&schema, &input(&[("base", 4.into())])).unwrap();
        assert_eq!(COMPUTE_CALLS.load(Ordering::SeqCst) - before, 1);
        assert_eq!(r.value.get("a"), Some(&Value::Integer(40)));
        assert_eq!(r.value.get("b"), Some(&Value::Integer(40)));
    }
}
