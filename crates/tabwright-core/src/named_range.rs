//! Named range definitions
//!
//! A defined name binds an identifier to a reference formula, either a
//! plain cell range (`Sheet1!$A$1:$A$9`) or a structured table column
//! reference (`TBL_COLORS[Color]`). Names are case-insensitive and unique
//! within their scope.
//!
//! # Example
//!
//! ```rust
//! use tabwright_core::{NameScope, NamedRange, NamedRangeCollection};
//!
//! let mut names = NamedRangeCollection::new();
//! names
//!     .define(NamedRange::workbook_scope("RNG_COLORS", "TBL_COLORS[Color]"))
//!     .unwrap();
//! assert!(names.get_exact("rng_colors", &NameScope::Workbook).is_some());
//! ```

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Scope of a named range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameScope {
    /// Available throughout the workbook (global)
    Workbook,
    /// Scoped to a specific sheet (local)
    Sheet(usize),
}

/// A named range definition
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    /// The name, case-insensitive for lookups
    pub name: String,
    /// Scope of this name (workbook-wide or sheet-specific)
    pub scope: NameScope,
    /// Reference formula, stored without a leading `=`
    pub refers_to: String,
    /// Optional comment shown in Excel's name manager
    pub comment: Option<String>,
    /// Whether this name is hidden from the UI
    pub hidden: bool,
}

impl NamedRange {
    /// Create a new named range
    pub fn new(name: impl Into<String>, refers_to: impl Into<String>, scope: NameScope) -> Self {
        let refers_to = refers_to.into();
        let refers_to = match refers_to.strip_prefix('=') {
            Some(rest) => rest.to_string(),
            None => refers_to,
        };
        Self {
            name: name.into(),
            scope,
            refers_to,
            comment: None,
            hidden: false,
        }
    }

    /// Create a workbook-scoped named range
    pub fn workbook_scope(name: impl Into<String>, refers_to: impl Into<String>) -> Self {
        Self::new(name, refers_to, NameScope::Workbook)
    }

    /// Create a sheet-scoped named range
    pub fn sheet_scope(
        name: impl Into<String>,
        refers_to: impl Into<String>,
        sheet_index: usize,
    ) -> Self {
        Self::new(name, refers_to, NameScope::Sheet(sheet_index))
    }

    /// Set a comment for this named range
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Mark this named range as hidden
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Validate a defined name the way Excel does for simple identifiers
///
/// Letters and digits of any script are accepted, as are `_`, `.`, `\`
/// and `?` after the first character.
pub fn validate_defined_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let first = chars
        .next()
        .ok_or_else(|| Error::InvalidName("name cannot be empty".into()))?;
    if !(first.is_alphabetic() || first == '_' || first == '\\') {
        return Err(Error::InvalidName(format!(
            "'{}' must start with a letter, '_' or '\\'",
            name
        )));
    }
    if let Some(bad) =
        chars.find(|c| !(c.is_alphanumeric() || matches!(*c, '_' | '.' | '\\' | '?')))
    {
        return Err(Error::InvalidName(format!(
            "'{}' contains invalid character '{}'",
            name, bad
        )));
    }
    if name.chars().count() > 255 {
        return Err(Error::InvalidName(format!("'{}' is too long", name)));
    }
    Ok(())
}

/// Collection of named ranges keyed by (lowercase name, scope)
#[derive(Debug, Default, Clone)]
pub struct NamedRangeCollection {
    ranges: HashMap<(String, NameScope), NamedRange>,
}

impl NamedRangeCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str, scope: NameScope) -> (String, NameScope) {
        (name.to_lowercase(), scope)
    }

    /// Define a new named range
    ///
    /// Fails if the name is invalid or already taken in the same scope.
    pub fn define(&mut self, range: NamedRange) -> Result<&NamedRange> {
        validate_defined_name(&range.name)?;
        let key = Self::key(&range.name, range.scope);
        if self.ranges.contains_key(&key) {
            return Err(Error::InvalidName(format!(
                "'{}' already exists in this scope",
                range.name
            )));
        }
        Ok(self.ranges.entry(key).or_insert(range))
    }

    /// Look a name up in one exact scope
    pub fn get_exact(&self, name: &str, scope: &NameScope) -> Option<&NamedRange> {
        self.ranges.get(&Self::key(name, *scope))
    }

    /// Look a name up with Excel's resolution rules: a name local to the
    /// current sheet shadows a workbook-level one.
    pub fn get(&self, name: &str, current_sheet: Option<usize>) -> Option<&NamedRange> {
        current_sheet
            .and_then(|idx| self.get_exact(name, &NameScope::Sheet(idx)))
            .or_else(|| self.get_exact(name, &NameScope::Workbook))
    }

    /// Check if a name exists in a scope
    pub fn contains(&self, name: &str, scope: &NameScope) -> bool {
        self.get_exact(name, scope).is_some()
    }

    /// Drop every name scoped to `sheet_index` and shift local scopes of
    /// later sheets down by one
    pub fn remove_sheet(&mut self, sheet_index: usize) {
        let ranges = std::mem::take(&mut self.ranges);
        for (_, mut range) in ranges {
            match range.scope {
                NameScope::Sheet(idx) if idx == sheet_index => continue,
                NameScope::Sheet(idx) if idx > sheet_index => {
                    range.scope = NameScope::Sheet(idx - 1);
                }
                _ => {}
            }
            self.ranges.insert(Self::key(&range.name, range.scope), range);
        }
    }

    /// All named ranges, sorted by name then scope
    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        let mut all: Vec<_> = self.ranges.values().collect();
        all.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| scope_order(&a.scope).cmp(&scope_order(&b.scope)))
        });
        all.into_iter()
    }

    /// Number of defined names
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

fn scope_order(scope: &NameScope) -> usize {
    match scope {
        NameScope::Workbook => 0,
        NameScope::Sheet(idx) => idx + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_lookup_case_insensitive() {
        let mut names = NamedRangeCollection::new();
        names
            .define(NamedRange::workbook_scope("RNG_A", "=TBL_A[Col]"))
            .unwrap();

        let found = names.get_exact("rng_a", &NameScope::Workbook).unwrap();
        assert_eq!(found.refers_to, "TBL_A[Col]");
        assert!(names.get_exact("RNG_A", &NameScope::Sheet(0)).is_none());
    }

    #[test]
    fn test_duplicate_in_scope_rejected() {
        let mut names = NamedRangeCollection::new();
        names.define(NamedRange::workbook_scope("X", "A1")).unwrap();
        assert!(names.define(NamedRange::workbook_scope("x", "B1")).is_err());
        // Same name in another scope is fine
        names.define(NamedRange::sheet_scope("X", "C1", 0)).unwrap();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_sheet_scope_shadows_workbook() {
        let mut names = NamedRangeCollection::new();
        names.define(NamedRange::workbook_scope("Rate", "Sheet1!$A$1")).unwrap();
        names.define(NamedRange::sheet_scope("Rate", "Sheet2!$B$2", 1)).unwrap();

        assert_eq!(names.get("rate", Some(1)).unwrap().refers_to, "Sheet2!$B$2");
        assert_eq!(names.get("rate", Some(0)).unwrap().refers_to, "Sheet1!$A$1");
        assert_eq!(names.get("rate", None).unwrap().refers_to, "Sheet1!$A$1");
    }

    #[test]
    fn test_invalid_names() {
        assert!(validate_defined_name("").is_err());
        assert!(validate_defined_name("1abc").is_err());
        assert!(validate_defined_name("has space").is_err());
        assert!(validate_defined_name("RNG_SHEET_COL.2").is_ok());
    }

    #[test]
    fn test_non_ascii_names() {
        assert!(validate_defined_name("Größe").is_ok());
        assert!(validate_defined_name("\\Rate?").is_ok());
        assert!(validate_defined_name("_税率").is_ok());
        assert!(validate_defined_name("Größe!").is_err());
    }

    #[test]
    fn test_remove_sheet_shifts_scopes() {
        let mut names = NamedRangeCollection::new();
        names.define(NamedRange::sheet_scope("A", "1", 0)).unwrap();
        names.define(NamedRange::sheet_scope("B", "1", 2)).unwrap();
        names.remove_sheet(0);
        assert!(names.get_exact("A", &NameScope::Sheet(0)).is_none());
        assert!(names.get_exact("B", &NameScope::Sheet(1)).is_some());
    }
}
