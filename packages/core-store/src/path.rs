//! Path type with validated store-key components.

use std::fmt;
use std::str::FromStr;

/// Maximum number of components in a path.
pub const MAX_DEPTH: usize = 32;

/// Maximum length of a single key, in UTF-8 bytes.
pub const MAX_KEY_BYTES: usize = 768;

const FORBIDDEN_KEY_CHARS: [char; 6] = ['/', '.', '#', '$', '[', ']'];

/// Errors related to path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A path component is not a valid store key.
    #[error("invalid path component '{component}' at position {position}: {message}")]
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
    /// The path has more components than the store allows.
    #[error("path is {depth} levels deep, at most {} are allowed", MAX_DEPTH)]
    TooDeep { depth: usize },
    /// The path string is invalid.
    #[error("invalid path: {message}")]
    InvalidPath { message: String },
}

/// A validated path into the hierarchical store.
///
/// Components are store keys: non-empty, at most [`MAX_KEY_BYTES`] bytes,
/// free of `.`, `#`, `$`, `[`, `]` and ASCII control characters. Generated
/// push keys (which contain `-` and `_`) are valid components.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    pub components: Vec<String>,
}

impl Path {
    /// The root of the store.
    pub fn root() -> Self {
        Path::default()
    }

    /// Parse a path string, validating components.
    ///
    /// # Path Syntax
    ///
    /// - Components are separated by `/`
    /// - Empty components are ignored (normalizes `//`, leading and trailing `/`)
    /// - The empty string is the root path
    ///
    /// # Examples
    ///
    /// ```rust
    /// use clinicdb_core::Path;
    ///
    /// let path = Path::parse("attendance/u1/2024-05-01").unwrap();
    /// assert_eq!(path.len(), 3);
    ///
    /// assert_eq!(Path::parse("/doctors/").unwrap(), Path::parse("doctors").unwrap());
    /// assert!(Path::parse("users/a.b").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let components: Vec<String> = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect();

        Self::try_from_components(components)
    }

    /// Try to create a path from components, validating each.
    pub fn try_from_components(components: Vec<String>) -> Result<Self, PathError> {
        if components.len() > MAX_DEPTH {
            return Err(PathError::TooDeep {
                depth: components.len(),
            });
        }
        for (i, component) in components.iter().enumerate() {
            Self::validate_component(component, i)?;
        }
        Ok(Path { components })
    }

    /// Validate a single path component.
    fn validate_component(component: &str, position: usize) -> Result<(), PathError> {
        let invalid = |message: String| PathError::InvalidComponent {
            component: component.to_string(),
            position,
            message,
        };

        if component.is_empty() {
            return Err(invalid("empty component".to_string()));
        }

        if component.len() > MAX_KEY_BYTES {
            return Err(invalid(format!(
                "key is {} bytes, at most {} are allowed",
                component.len(),
                MAX_KEY_BYTES
            )));
        }

        if let Some(c) = component
            .chars()
            .find(|c| FORBIDDEN_KEY_CHARS.contains(c) || c.is_ascii_control())
        {
            return Err(invalid(format!("invalid character {:?} in key", c)));
        }

        Ok(())
    }

    /// Check if this path is empty (root path).
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Get the number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Iterate over components.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.components.iter()
    }

    /// The last component, `None` at the root.
    pub fn last(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// The enclosing path, `None` at the root.
    pub fn parent(&self) -> Option<Path> {
        if self.is_empty() {
            return None;
        }
        Some(self.slice(0, self.len() - 1))
    }

    /// Append a single key.
    pub fn child(&self, key: &str) -> Result<Path, PathError> {
        let mut components = self.components.clone();
        components.push(key.to_string());
        Self::try_from_components(components)
    }

    /// Join this path with another. Fails when the result is too deep.
    pub fn join(&self, other: &Path) -> Result<Path, PathError> {
        let mut components = self.components.clone();
        components.extend(other.components.iter().cloned());
        Self::try_from_components(components)
    }

    /// Check if this path has the given prefix.
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        prefix.components.len() <= self.components.len()
            && prefix.components == self.components[..prefix.components.len()]
    }

    /// Strip a prefix from this path.
    ///
    /// Returns `None` if the prefix doesn't match.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Path> {
        if self.has_prefix(prefix) {
            Some(Path {
                components: self.components[prefix.components.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// True when a write at one path can change the value seen at the other.
    pub fn is_related(&self, other: &Path) -> bool {
        self.has_prefix(other) || other.has_prefix(self)
    }

    /// Get a slice of components as a new path.
    pub fn slice(&self, start: usize, end: usize) -> Path {
        Path {
            components: self.components[start..end].to_vec(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl std::ops::Index<usize> for Path {
    type Output = String;

    fn index(&self, i: usize) -> &Self::Output {
        &self.components[i]
    }
}

/// Macro for creating paths from literals.
///
/// # Example
///
/// ```rust
/// use clinicdb_core::path;
///
/// let p = path!("appointments/a1/slot");
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::Path::parse($s).expect("invalid path literal")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_paths() {
        assert_eq!(Path::parse("").unwrap().len(), 0);
        assert_eq!(Path::parse("patients").unwrap().len(), 1);
        assert_eq!(Path::parse("patients/p1").unwrap().len(), 2);
        assert_eq!(Path::parse("attendance/u1/2024-05-01").unwrap().len(), 3);
    }

    #[test]
    fn normalize_slashes() {
        assert_eq!(
            Path::parse("foo/bar/").unwrap(),
            Path::parse("foo/bar").unwrap()
        );
        assert_eq!(
            Path::parse("foo//bar").unwrap(),
            Path::parse("foo/bar").unwrap()
        );
        assert_eq!(
            Path::parse("/foo/bar").unwrap(),
            Path::parse("foo/bar").unwrap()
        );
        assert!(Path::parse("/").unwrap().is_empty());
    }

    #[test]
    fn push_keys_and_dates_allowed() {
        let p = Path::parse("expenses/-NxA3b_9zQ/2024-05-01 10:00").unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(&p[1], "-NxA3b_9zQ");
    }

    #[test]
    fn unicode_keys_allowed() {
        let p = Path::parse("usuarios/名前").unwrap();
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn forbidden_characters_rejected() {
        assert!(Path::parse("users/a.b").is_err());
        assert!(Path::parse("users/#1").is_err());
        assert!(Path::parse("users/$uid").is_err());
        assert!(Path::parse("users/[0]").is_err());
        assert!(Path::parse("users/a\tb").is_err());

        let err = Path::parse("users/a.b").unwrap_err();
        assert!(err.to_string().contains("invalid character"));
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn long_key_rejected() {
        let key = "k".repeat(MAX_KEY_BYTES + 1);
        assert!(Path::parse(&key).is_err());
        assert!(Path::parse(&"k".repeat(MAX_KEY_BYTES)).is_ok());
    }

    #[test]
    fn deep_path_rejected() {
        let deep = vec!["a"; MAX_DEPTH + 1].join("/");
        assert_eq!(
            Path::parse(&deep),
            Err(PathError::TooDeep {
                depth: MAX_DEPTH + 1
            })
        );
        assert!(Path::parse(&vec!["a"; MAX_DEPTH].join("/")).is_ok());
    }

    #[test]
    fn has_prefix_works() {
        let p = path!("foo/bar/baz");
        assert!(p.has_prefix(&path!("")));
        assert!(p.has_prefix(&path!("foo")));
        assert!(p.has_prefix(&path!("foo/bar")));
        assert!(p.has_prefix(&path!("foo/bar/baz")));
        assert!(!p.has_prefix(&path!("bar")));
        assert!(!p.has_prefix(&path!("foo/bar/baz/qux")));
    }

    #[test]
    fn strip_prefix_works() {
        let p = path!("foo/bar/baz");
        assert_eq!(p.strip_prefix(&path!("foo")), Some(path!("bar/baz")));
        assert_eq!(p.strip_prefix(&path!("other")), None);
    }

    #[test]
    fn related_paths() {
        let p = path!("patients/p1");
        assert!(p.is_related(&path!("patients")));
        assert!(p.is_related(&path!("patients/p1/name")));
        assert!(p.is_related(&path!("")));
        assert!(!p.is_related(&path!("patients/p2")));
        assert!(!p.is_related(&path!("doctors")));
    }

    #[test]
    fn parent_last_and_child() {
        let p = path!("slots/d1/s1");
        assert_eq!(p.parent(), Some(path!("slots/d1")));
        assert_eq!(p.last(), Some("s1"));
        assert_eq!(Path::root().parent(), None);
        assert_eq!(Path::root().last(), None);

        assert_eq!(p.child("booked").unwrap(), path!("slots/d1/s1/booked"));
        assert!(p.child("a/b").is_err());
        assert!(p.child("a.b").is_err());
    }

    #[test]
    fn join_with_empty() {
        let p1 = path!("foo");
        assert_eq!(p1.join(&path!("")).unwrap(), p1);
        assert_eq!(path!("").join(&path!("bar")).unwrap(), path!("bar"));
        assert_eq!(path!("a/b").join(&path!("c")).unwrap().to_string(), "a/b/c");
    }

    #[test]
    fn join_respects_max_depth() {
        let base = Path::parse(&vec!["a"; MAX_DEPTH - 1].join("/")).unwrap();
        assert_eq!(base.join(&path!("x")).unwrap().len(), MAX_DEPTH);
        assert_eq!(
            base.join(&path!("x/y/z")),
            Err(PathError::TooDeep {
                depth: MAX_DEPTH + 2
            })
        );
    }

    #[test]
    fn from_str_and_display() {
        let p: Path = "doctors/d1".parse().unwrap();
        assert_eq!(format!("{}", p), "doctors/d1");
        assert_eq!(format!("{}", Path::root()), "");
    }

    #[test]
    fn path_ord() {
        assert!(path!("a/b") < path!("a/c"));
        assert!(path!("a/c") < path!("b/a"));
    }
}
