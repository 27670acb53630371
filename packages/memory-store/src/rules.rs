//! Path-prefix access rules.

use clinicdb_core::{Error, Operation, Path, PathError};
use serde::{Deserialize, Serialize};

/// Access rules as written in a config file.
///
/// ```json
/// { "readDenied": ["admin"], "writeDenied": ["audit", "settings/billing"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessRules {
    pub read_denied: Vec<String>,
    pub write_denied: Vec<String>,
}

/// Compiled access rules.
///
/// An operation is denied when its path lies under a denied prefix, or
/// above one: reading a parent would expose the protected child, writing
/// a parent would replace it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rules {
    read_denied: Vec<Path>,
    write_denied: Vec<Path>,
}

impl Rules {
    /// Rules that allow everything.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn compile(rules: &AccessRules) -> Result<Self, PathError> {
        let parse_all = |prefixes: &[String]| -> Result<Vec<Path>, PathError> {
            prefixes.iter().map(|p| Path::parse(p)).collect()
        };
        Ok(Self {
            read_denied: parse_all(&rules.read_denied)?,
            write_denied: parse_all(&rules.write_denied)?,
        })
    }

    #[must_use]
    pub fn deny_read(mut self, prefix: Path) -> Self {
        self.read_denied.push(prefix);
        self
    }

    #[must_use]
    pub fn deny_write(mut self, prefix: Path) -> Self {
        self.write_denied.push(prefix);
        self
    }

    /// Check an operation at `path`.
    pub fn check(&self, path: &Path, operation: Operation) -> Result<(), Error> {
        let denied = match operation {
            Operation::Read => &self.read_denied,
            Operation::Write => &self.write_denied,
        };
        if denied.iter().any(|prefix| prefix.is_related(path)) {
            return Err(Error::PermissionDenied {
                path: path.clone(),
                operation,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicdb_core::path;

    #[test]
    fn allow_all_allows() {
        let rules = Rules::allow_all();
        assert!(rules.check(&path!(""), Operation::Read).is_ok());
        assert!(rules.check(&path!("a/b"), Operation::Write).is_ok());
    }

    #[test]
    fn denied_prefix_blocks_below_and_above() {
        let rules = Rules::allow_all().deny_write(path!("settings/billing"));

        assert!(rules.check(&path!("settings/billing/rate"), Operation::Write).is_err());
        assert!(rules.check(&path!("settings"), Operation::Write).is_err());
        assert!(rules.check(&path!("settings/hours"), Operation::Write).is_ok());
        // Reads are not affected by write rules.
        assert!(rules.check(&path!("settings/billing"), Operation::Read).is_ok());
    }

    #[test]
    fn compile_from_config() {
        let config = AccessRules {
            read_denied: vec!["admin".to_string()],
            write_denied: vec![],
        };
        let rules = Rules::compile(&config).unwrap();
        let err = rules.check(&path!("admin/keys"), Operation::Read).unwrap_err();
        assert!(err.is_permission_denied());

        let bad = AccessRules {
            read_denied: vec!["a.b".to_string()],
            write_denied: vec![],
        };
        assert!(Rules::compile(&bad).is_err());
    }

    #[test]
    fn access_rules_deserialize_camel_case() {
        let rules: AccessRules =
            serde_json::from_str(r#"{"writeDenied": ["audit"]}"#).unwrap();
        assert_eq!(rules.write_denied, vec!["audit".to_string()]);
        assert!(rules.read_denied.is_empty());
    }
}
