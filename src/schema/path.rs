//! Field paths and reference paths.

use std::fmt;

/// Dotted, root-relative path of a field (`session.cookie.secure`).
///
/// The root itself is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn child(&self, key: &str) -> Self {
        if self.is_root() {
            Self(key.to_string())
        } else {
            Self(format!("{}.{key}", self.0))
        }
    }

    /// Path of an array element, `secret[0]`.
    pub fn item(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    /// Returns the parent path; the root's parent is the root.
    pub fn parent(&self) -> Self {
        match self.0.rsplit_once('.') {
            Some((parent, _)) => Self(parent.to_string()),
            None => Self::root(),
        }
    }

    /// The last segment of the path.
    pub fn key(&self) -> &str {
        match self.0.rsplit_once('.') {
            Some((_, key)) => key,
            None => &self.0,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

///
/// A reference from one field to another, written in the notation used by
/// rule declarations:
///
/// - `rolling` or `.rolling` is a sibling of the referencing field
/// - `..auth0Logout` climbs one level (the parent's sibling), each further
///   dot climbs one more; climbing stops at the root
/// - `/baseURL` is absolute from the root
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefPath {
    Relative { up: usize, path: String },
    Absolute(String),
}

impl RefPath {
    pub fn parse(notation: &str) -> Self {
        if let Some(path) = notation.strip_prefix('/') {
            return RefPath::Absolute(path.to_string());
        }
        let dots = notation.chars().take_while(|c| *c == '.').count();
        RefPath::Relative {
            up: dots.saturating_sub(1),
            path: notation[dots..].to_string(),
        }
    }

    /// Resolves the reference as seen from `field`.
    pub fn resolve(&self, field: &FieldPath) -> FieldPath {
        match self {
            RefPath::Absolute(path) => FieldPath::new(path.clone()),
            RefPath::Relative { up, path } => {
                let mut base = field.parent();
                for _ in 0..*up {
                    if base.is_root() {
                        break;
                    }
                    base = base.parent();
                }
                path.split('.').fold(base, |acc, key| acc.child(key))
            }
        }
    }
}
