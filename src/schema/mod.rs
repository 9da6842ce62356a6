//!
//! The constraint graph.
//!
//! A schema is declared as a tree of [`ObjectRule`]s and [`FieldRule`]s and
//! compiled once into a flat arena. Compilation resolves every reference path to
//! the entry it points at, rejects references to undeclared fields and rejects
//! dependency cycles. What comes out is immutable and shared by every call.
//!
//! Dependencies are of two sorts: an object depends on its children, and a field
//! depends on every field its conditions and default reference. The resolution
//! order is a depth-first post-order over these edges, visiting children and
//! references in declaration order.
//!
mod oidc;
mod path;
mod rule;

pub use oidc::oidc_schema;
pub use path::*;
pub use rule::*;
pub(crate) use rule::Failure;

use {
    crate::{Error, Result},
    std::collections::HashMap,
};

pub(crate) struct Entry {
    pub path: FieldPath,
    pub shape: Shape,
}

pub(crate) enum Shape {
    Field(FieldRule),
    Object {
        children: Vec<usize>,
        unknown: UnknownKeys,
        default: ObjectDefault,
        alternative: Option<Kind>,
    },
}

/// A compiled, acyclic constraint graph.
pub struct Schema {
    entries: Vec<Entry>,
    index: HashMap<FieldPath, usize>,
    order: Vec<usize>,
}

impl Schema {
    /// Compiles a schema from its root object rule.
    pub fn new(root: ObjectRule) -> Result<Schema> {
        let mut schema = Schema {
            entries: Vec::new(),
            index: HashMap::new(),
            order: Vec::new(),
        };
        schema.flatten_object(FieldPath::root(), root)?;
        schema.link()?;
        schema.order = schema.topological_order()?;
        Ok(schema)
    }

    pub(crate) const ROOT: usize = 0;

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entry(&self, idx: usize) -> &Entry {
        &self.entries[idx]
    }

    /// Whether a field or object with this dotted path is declared.
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(&FieldPath::new(path))
    }

    /// Every declared path in resolution order (dependencies first, ties by
    /// declaration order). The root is last.
    pub fn resolution_order(&self) -> impl Iterator<Item = &FieldPath> {
        self.order.iter().map(|idx| &self.entries[*idx].path)
    }

    fn flatten(&mut self, parent: &FieldPath, node: Node) -> Result<usize> {
        match node {
            Node::Field(rule) => {
                let path = parent.child(rule.key);
                self.push(Entry {
                    path,
                    shape: Shape::Field(rule),
                })
            }
            Node::Object(rule) => {
                let path = parent.child(rule.key);
                self.flatten_object(path, rule)
            }
        }
    }

    fn flatten_object(&mut self, path: FieldPath, rule: ObjectRule) -> Result<usize> {
        let idx = self.push(Entry {
            path: path.clone(),
            shape: Shape::Object {
                children: Vec::new(),
                unknown: rule.unknown,
                default: rule.default,
                alternative: rule.alternative,
            },
        })?;
        let children = rule
            .children
            .into_iter()
            .map(|child| self.flatten(&path, child))
            .collect::<Result<Vec<_>>>()?;
        if let Shape::Object { children: slot, .. } = &mut self.entries[idx].shape {
            *slot = children;
        }
        Ok(idx)
    }

    fn push(&mut self, entry: Entry) -> Result<usize> {
        if self.index.contains_key(&entry.path) {
            return Err(Error::schema(format!(
                "field \"{}\" is declared twice",
                entry.path
            )));
        }
        let idx = self.entries.len();
        self.index.insert(entry.path.clone(), idx);
        self.entries.push(entry);
        Ok(idx)
    }

    /// Resolves every reference path to an entry index.
    fn link(&mut self) -> Result<()> {
        let index = &self.index;
        let lookup = |from: &FieldPath, reference: &RefPath| -> Result<usize> {
            let target = reference.resolve(from);
            index.get(&target).copied().ok_or_else(|| {
                Error::schema(format!(
                    "\"{from}\" references undeclared field \"{target}\""
                ))
            })
        };
        let link_default = |from: &FieldPath, default: &mut DefaultSpec| -> Result<()> {
            match default {
                DefaultSpec::Const(_) => {}
                DefaultSpec::Ref { path, target } => *target = lookup(from, path)?,
                DefaultSpec::Computed { refs, targets, .. } => {
                    *targets = refs
                        .iter()
                        .map(|r| lookup(from, r))
                        .collect::<Result<_>>()?;
                }
            }
            Ok(())
        };

        for entry in &mut self.entries {
            let Shape::Field(rule) = &mut entry.shape else {
                continue;
            };
            let from = &entry.path;
            if let Some(default) = &mut rule.default {
                link_default(from, default)?;
            }
            for condition in &mut rule.conditions {
                condition.targets = condition
                    .refs
                    .iter()
                    .map(|r| lookup(from, r))
                    .collect::<Result<_>>()?;
                for branch in std::iter::once(&mut condition.then).chain(condition.otherwise.as_mut()) {
                    if let Some(default) = &mut branch.default {
                        link_default(from, default)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Entries that must be resolved before `idx`.
    pub(crate) fn dependencies(&self, idx: usize) -> Vec<usize> {
        match &self.entries[idx].shape {
            Shape::Object { children, .. } => children.clone(),
            Shape::Field(rule) => {
                let mut deps = Vec::new();
                let mut add_default = |default: &DefaultSpec| match default {
                    DefaultSpec::Const(_) => {}
                    DefaultSpec::Ref { target, .. } => deps.push(*target),
                    DefaultSpec::Computed { targets, .. } => deps.extend(targets),
                };
                for condition in &rule.conditions {
                    for branch in std::iter::once(&condition.then).chain(condition.otherwise.as_ref()) {
                        if let Some(default) = &branch.default {
                            add_default(default);
                        }
                    }
                }
                if let Some(default) = &rule.default {
                    add_default(default);
                }
                let mut all: Vec<usize> = rule
                    .conditions
                    .iter()
                    .flat_map(|c| c.targets.iter().copied())
                    .collect();
                all.extend(deps);
                all
            }
        }
    }

    fn topological_order(&self) -> Result<Vec<usize>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(schema: &Schema, idx: usize, marks: &mut [Mark], order: &mut Vec<usize>) -> Result<()> {
            match marks[idx] {
                Mark::Done => return Ok(()),
                Mark::Active => {
                    return Err(Error::schema(format!(
                        "dependency cycle through \"{}\"",
                        schema.entries[idx].path
                    )));
                }
                Mark::New => {}
            }
            marks[idx] = Mark::Active;
            for dep in schema.dependencies(idx) {
                visit(schema, dep, marks, order)?;
            }
            marks[idx] = Mark::Done;
            order.push(idx);
            Ok(())
        }

        let mut marks = vec![Mark::New; self.entries.len()];
        let mut order = Vec::with_capacity(self.entries.len());
        visit(self, Self::ROOT, &mut marks, &mut order)?;
        Ok(order)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn order(schema: &Schema) -> Vec<&str> {
        schema.resolution_order().map(FieldPath::as_str).collect()
    }

    #[test]
    fn test_declaration_order_without_dependencies() {
        let schema = Schema::new(
            ObjectRule::root()
                .field(FieldRule::new("a", Kind::Bool))
                .object(ObjectRule::new("b").field(FieldRule::new("c", Kind::Bool)))
                .field(FieldRule::new("d", Kind::Bool)),
        )
        .unwrap();
        assert_eq!(order(&schema), vec!["a", "b.c", "b", "d", ""]);
    }

    #[test]
    fn test_references_are_resolved_first() {
        let schema = Schema::new(
            ObjectRule::root()
                .object(
                    ObjectRule::new("session").field(
                        FieldRule::new("secure", Kind::Bool)
                            .when(Condition::when("/baseURL", |_| true)),
                    ),
                )
                .field(FieldRule::new("baseURL", Kind::String))
                .field(FieldRule::new("late", Kind::Bool).default_ref("early"))
                .field(FieldRule::new("early", Kind::Bool)),
        )
        .unwrap();
        assert_eq!(
            order(&schema),
            vec!["baseURL", "session.secure", "session", "early", "late", ""]
        );
        assert!(schema.contains("session.secure"));
        assert!(!schema.contains("session.missing"));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let err = Schema::new(
            ObjectRule::root()
                .field(FieldRule::new("a", Kind::Bool).default_ref("b"))
                .field(FieldRule::new("b", Kind::Bool).when(Condition::when("a", |_| true))),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("dependency cycle"));
    }

    #[test]
    fn test_reference_to_ancestor_is_a_cycle() {
        let err = Schema::new(ObjectRule::root().object(
            ObjectRule::new("session").field(
                FieldRule::new("x", Kind::Bool).when(Condition::when("/session", |_| true)),
            ),
        ))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_dangling_reference_is_rejected() {
        let err = Schema::new(
            ObjectRule::root().field(FieldRule::new("a", Kind::Bool).default_ref("nope")),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("undeclared field \"nope\""));
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let err = Schema::new(
            ObjectRule::root()
                .field(FieldRule::new("a", Kind::Bool))
                .field(FieldRule::new("a", Kind::String)),
        )
        .unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_branch_default_reference_is_linked() {
        let schema = Schema::new(
            ObjectRule::root()
                .field(
                    FieldRule::new("a", Kind::Bool).when(
                        Condition::when("flag", |_| true).then(Branch {
                            default: Some(DefaultSpec::Ref {
                                path: RefPath::parse("b"),
                                target: usize::MAX,
                            }),
                            ..Branch::new()
                        }),
                    ),
                )
                .field(FieldRule::new("flag", Kind::Bool))
                .field(FieldRule::new("b", Kind::Bool)),
        )
        .unwrap();
        assert_eq!(order(&schema), vec!["flag", "b", "a", ""]);
    }
}
