//! Data validation
//!
//! Validation rules attach to one or more cell ranges of a worksheet. The
//! rule tabwright cares about is the list rule whose allowed values come from
//! a defined name, e.g. a dropdown fed by `=RNG_LOOKUPS_COLOR`.
//!
//! ## Example
//!
//! ```rust
//! use tabwright_core::{CellRange, DataValidation, ListSource, ValidationType};
//!
//! let rule = DataValidation::list("=RNG_LOOKUPS_COLOR")
//!     .with_range(CellRange::parse("C3:C12").unwrap())
//!     .with_dropdown(false);
//!
//! assert_eq!(
//!     rule.validation_type,
//!     ValidationType::List(ListSource::Formula("RNG_LOOKUPS_COLOR".into()))
//! );
//! ```

use crate::cell::CellRange;

/// Data validation rule for cells
#[derive(Debug, Clone, PartialEq)]
pub struct DataValidation {
    /// Type of validation
    pub validation_type: ValidationType,
    /// Cell ranges this validation applies to
    pub ranges: Vec<CellRange>,
    /// Allow blank/empty cells
    pub allow_blank: bool,
    /// Show the in-cell dropdown arrow for list validation
    pub show_dropdown: bool,
    /// Input prompt as (title, message), shown when a cell is selected
    pub prompt: Option<(Option<String>, String)>,
    /// Error alert style
    pub error_style: ValidationErrorStyle,
    /// Error alert as (title, message)
    pub error: Option<(Option<String>, String)>,
}

impl Default for DataValidation {
    fn default() -> Self {
        Self {
            validation_type: ValidationType::None,
            ranges: Vec::new(),
            allow_blank: true,
            show_dropdown: true,
            prompt: None,
            error_style: ValidationErrorStyle::Stop,
            error: None,
        }
    }
}

impl DataValidation {
    /// Create a list validation
    ///
    /// A source starting with `=` is a formula reference (a defined name or
    /// range); anything else is an inline comma-separated list.
    pub fn list(source: impl AsRef<str>) -> Self {
        Self {
            validation_type: ValidationType::List(ListSource::parse(source.as_ref())),
            ..Self::default()
        }
    }

    /// Create a comparison validation of the given kind
    pub fn compare(kind: CompareKind, criteria: Criteria) -> Self {
        Self {
            validation_type: ValidationType::Compare { kind, criteria },
            ..Self::default()
        }
    }

    /// Create a custom formula validation
    pub fn custom(formula: impl Into<String>) -> Self {
        Self {
            validation_type: ValidationType::Custom {
                formula: formula.into(),
            },
            ..Self::default()
        }
    }

    /// Add a range this validation applies to
    pub fn with_range(mut self, range: CellRange) -> Self {
        self.ranges.push(range);
        self
    }

    /// Set whether blank cells pass validation
    pub fn with_allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = allow;
        self
    }

    /// Set whether the dropdown arrow is shown
    pub fn with_dropdown(mut self, show: bool) -> Self {
        self.show_dropdown = show;
        self
    }

    /// Check whether a cell is covered by this rule
    pub fn applies_to(&self, row: u32, col: u16) -> bool {
        let addr = crate::CellAddress::new(row, col);
        self.ranges.iter().any(|r| r.contains(&addr))
    }

    /// Space-separated `sqref` form of the covered ranges
    pub fn sqref(&self) -> String {
        self.ranges
            .iter()
            .map(CellRange::to_a1_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Where a list validation takes its allowed values from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    /// Formula reference, stored without the leading `=`
    Formula(String),
    /// Inline literal values
    Values(Vec<String>),
}

impl ListSource {
    /// Parse the user-facing source form (`=NAME` or `a,b,c`)
    pub fn parse(source: &str) -> Self {
        match source.strip_prefix('=') {
            Some(formula) => ListSource::Formula(formula.to_string()),
            None => ListSource::Values(
                source
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect(),
            ),
        }
    }

    /// The user-facing source form, inverse of [`ListSource::parse`]
    pub fn to_source_string(&self) -> String {
        match self {
            ListSource::Formula(formula) => format!("={}", formula),
            ListSource::Values(values) => values.join(","),
        }
    }
}

/// Types of data validation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ValidationType {
    /// No validation (any value allowed)
    #[default]
    None,
    /// Value must come from a list
    List(ListSource),
    /// Numeric, date, time or text-length comparison
    Compare { kind: CompareKind, criteria: Criteria },
    /// Custom formula returning TRUE/FALSE
    Custom { formula: String },
}

impl ValidationType {
    /// Get the XLSX `type` attribute for this validation type
    pub fn xlsx_type(&self) -> &'static str {
        match self {
            ValidationType::None => "none",
            ValidationType::List(_) => "list",
            ValidationType::Compare { kind, .. } => kind.xlsx_type(),
            ValidationType::Custom { .. } => "custom",
        }
    }
}

/// Value kind checked by a comparison validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareKind {
    Whole,
    Decimal,
    Date,
    Time,
    TextLength,
}

impl CompareKind {
    /// Get the XLSX `type` attribute
    pub fn xlsx_type(&self) -> &'static str {
        match self {
            CompareKind::Whole => "whole",
            CompareKind::Decimal => "decimal",
            CompareKind::Date => "date",
            CompareKind::Time => "time",
            CompareKind::TextLength => "textLength",
        }
    }

    /// Parse from the XLSX `type` attribute
    pub fn from_xlsx(s: &str) -> Option<Self> {
        match s {
            "whole" => Some(CompareKind::Whole),
            "decimal" => Some(CompareKind::Decimal),
            "date" => Some(CompareKind::Date),
            "time" => Some(CompareKind::Time),
            "textLength" => Some(CompareKind::TextLength),
            _ => None,
        }
    }
}

/// Operator and operands of a comparison validation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Criteria {
    pub operator: ValidationOperator,
    pub value1: String,
    pub value2: Option<String>,
}

/// Comparison operators for validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationOperator {
    #[default]
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl ValidationOperator {
    const XLSX_NAMES: [(ValidationOperator, &'static str); 8] = [
        (ValidationOperator::Between, "between"),
        (ValidationOperator::NotBetween, "notBetween"),
        (ValidationOperator::Equal, "equal"),
        (ValidationOperator::NotEqual, "notEqual"),
        (ValidationOperator::GreaterThan, "greaterThan"),
        (ValidationOperator::LessThan, "lessThan"),
        (ValidationOperator::GreaterThanOrEqual, "greaterThanOrEqual"),
        (ValidationOperator::LessThanOrEqual, "lessThanOrEqual"),
    ];

    /// Get the XLSX operator string
    pub fn xlsx_operator(&self) -> &'static str {
        Self::XLSX_NAMES
            .iter()
            .find(|(op, _)| op == self)
            .map(|(_, name)| *name)
            .unwrap_or("between")
    }

    /// Parse from XLSX operator string
    pub fn from_xlsx(s: &str) -> Option<Self> {
        Self::XLSX_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(op, _)| *op)
    }
}

/// Error alert styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationErrorStyle {
    /// Reject invalid data (default)
    #[default]
    Stop,
    /// Warn but allow
    Warning,
    /// Just inform
    Information,
}

impl ValidationErrorStyle {
    /// Get the XLSX error style string
    pub fn xlsx_style(&self) -> &'static str {
        match self {
            ValidationErrorStyle::Stop => "stop",
            ValidationErrorStyle::Warning => "warning",
            ValidationErrorStyle::Information => "information",
        }
    }

    /// Parse from XLSX style string
    pub fn from_xlsx(s: &str) -> Option<Self> {
        match s {
            "stop" => Some(ValidationErrorStyle::Stop),
            "warning" => Some(ValidationErrorStyle::Warning),
            "information" => Some(ValidationErrorStyle::Information),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_source_forms() {
        assert_eq!(
            ListSource::parse("=RNG_X"),
            ListSource::Formula("RNG_X".into())
        );
        assert_eq!(
            ListSource::parse("Yes, No,,Maybe"),
            ListSource::Values(vec!["Yes".into(), "No".into(), "Maybe".into()])
        );
        assert_eq!(ListSource::parse("=RNG_X").to_source_string(), "=RNG_X");
    }

    #[test]
    fn test_dropdown_defaults() {
        let v = DataValidation::list("=RNG_X");
        assert!(v.allow_blank);
        assert!(v.show_dropdown);
        assert!(!v.with_dropdown(false).show_dropdown);
    }

    #[test]
    fn test_applies_to_and_sqref() {
        let v = DataValidation::list("A,B")
            .with_range(CellRange::parse("A2:A10").unwrap())
            .with_range(CellRange::parse("C5").unwrap());

        assert!(v.applies_to(1, 0));
        assert!(v.applies_to(4, 2));
        assert!(!v.applies_to(0, 0));
        assert_eq!(v.sqref(), "A2:A10 C5");
    }

    #[test]
    fn test_operator_xlsx_strings() {
        assert_eq!(ValidationOperator::NotBetween.xlsx_operator(), "notBetween");
        assert_eq!(
            ValidationOperator::from_xlsx("lessThanOrEqual"),
            Some(ValidationOperator::LessThanOrEqual)
        );
        assert_eq!(ValidationOperator::from_xlsx("bogus"), None);
    }

    #[test]
    fn test_compare_type_names() {
        let v = DataValidation::compare(
            CompareKind::TextLength,
            Criteria {
                operator: ValidationOperator::LessThan,
                value1: "10".into(),
                value2: None,
            },
        );
        assert_eq!(v.validation_type.xlsx_type(), "textLength");
        assert_eq!(CompareKind::from_xlsx("date"), Some(CompareKind::Date));
    }
}
