//! Naming conventions for tables, sheets, columns and column ranges
//!
//! Table names look like `TBL_PEOPLE`, column ranges like
//! `RNG_LOOKUPS_STATUS`, and columns are referenced with the structured
//! syntax `TBL_PEOPLE[Full Name]`.

/// Table style applied to every table tabwright creates
pub const DEFAULT_TABLE_STYLE: &str = "TableStyleMedium13";

const TABLE_PREFIX: &str = "TBL_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Upper,
    Lower,
    Digit,
    OtherLetter,
    Space,
    Symbol,
}

impl CharClass {
    fn of(c: char) -> Self {
        if c.is_whitespace() {
            CharClass::Space
        } else if c.is_uppercase() {
            CharClass::Upper
        } else if c.is_lowercase() {
            CharClass::Lower
        } else if c.is_numeric() {
            CharClass::Digit
        } else if c.is_alphabetic() {
            CharClass::OtherLetter
        } else {
            CharClass::Symbol
        }
    }
}

/// Split a string into runs of the same character class
///
/// An uppercase letter followed by lowercase letters starts a new token, so
/// `XMLHttp` splits into `XML` and `Http`. Whitespace only separates.
fn split_camel_case(s: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_class: Option<CharClass> = None;

    for c in s.chars() {
        let class = CharClass::of(c);
        if class == CharClass::Space {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            current_class = Some(class);
            continue;
        }
        match current_class {
            Some(prev) if prev == class => current.push(c),
            Some(CharClass::Upper) if class == CharClass::Lower => {
                // Move the last capital over to the new lowercase token
                match current.pop() {
                    Some(capital) if !current.is_empty() => {
                        tokens.push(std::mem::take(&mut current));
                        current.push(capital);
                    }
                    Some(capital) => current.push(capital),
                    None => {}
                }
                current.push(c);
            }
            _ => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                current.push(c);
            }
        }
        current_class = Some(class);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn a camel-case identifier into space separated title case
///
/// ```
/// use tabwright::naming::to_title_case;
///
/// assert_eq!(to_title_case("camelCaseString"), "Camel Case String");
/// assert_eq!(to_title_case("item2Name"), "Item 2 Name");
/// ```
pub fn to_title_case(s: &str) -> String {
    split_camel_case(s)
        .iter()
        .map(|token| capitalize(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical table name for a loose, human name
///
/// The result always matches `TBL_[A-Z0-9_]+`, and feeding a generated name
/// back in returns it unchanged.
pub fn generate_table_name(simple_name: &str) -> String {
    let body: String = simple_name
        .to_uppercase()
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if body.len() > TABLE_PREFIX.len() && body.starts_with(TABLE_PREFIX) {
        return body;
    }
    if body.is_empty() {
        return format!("{}_", TABLE_PREFIX);
    }
    format!("{}{}", TABLE_PREFIX, body)
}

/// Sheet name for a camel-case identifier, e.g. `orderLines` becomes `ORDER_LINES`
pub fn generate_sheet_name(camel_case: &str) -> String {
    to_title_case(camel_case).replace(' ', "_").to_uppercase()
}

/// Column header for a camel-case identifier, e.g. `unitPrice` becomes `Unit Price`
pub fn format_column_name(camel_case: &str) -> String {
    to_title_case(camel_case)
}

/// Name of the workbook-level range covering one table column
pub fn generate_column_named_range_name(sheet_name: &str, column: &str) -> String {
    format!(
        "RNG_{}_{}",
        sheet_name.replace(' ', "_"),
        column.replace(' ', "_")
    )
    .to_uppercase()
}

/// Structured reference to a table column
pub fn column_reference_formula(table_name: &str, column: &str) -> String {
    format!("{}[{}]", table_name, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_title_case_splits_by_character_type() {
        assert_eq!(to_title_case("camelCaseString"), "Camel Case String");
        assert_eq!(to_title_case("XMLHttpRequest"), "XML Http Request");
        assert_eq!(to_title_case("item2Name"), "Item 2 Name");
        assert_eq!(to_title_case("already spaced"), "Already Spaced");
        assert_eq!(to_title_case("  two   gaps "), "Two Gaps");
        assert_eq!(to_title_case("snake_case"), "Snake _ Case");
        assert_eq!(to_title_case("A"), "A");
        assert_eq!(to_title_case(""), "");
    }

    #[test]
    fn test_generate_table_name() {
        assert_eq!(generate_table_name("People"), "TBL_PEOPLE");
        assert_eq!(generate_table_name("order lines"), "TBL_ORDER_LINES");
        assert_eq!(generate_table_name("a-b.c"), "TBL_A_B_C");
        assert_eq!(generate_table_name("TBL_PEOPLE"), "TBL_PEOPLE");
        assert_eq!(generate_table_name("tbl_people"), "TBL_PEOPLE");
        assert_eq!(generate_table_name(""), "TBL__");
        assert_eq!(generate_table_name("TBL_"), "TBL_TBL_");
    }

    #[test]
    fn test_sheet_and_column_names() {
        assert_eq!(generate_sheet_name("orderLines"), "ORDER_LINES");
        assert_eq!(format_column_name("unitPrice"), "Unit Price");
    }

    #[test]
    fn test_column_range_name() {
        assert_eq!(
            generate_column_named_range_name("Look Ups", "Full Name"),
            "RNG_LOOK_UPS_FULL_NAME"
        );
        assert_eq!(column_reference_formula("TBL_X", "Full Name"), "TBL_X[Full Name]");
    }
}
