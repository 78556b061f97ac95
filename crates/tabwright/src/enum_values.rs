//! Enumerations whose members can be listed as table values

/// A closed set of values with a type name
///
/// Implement it for a fieldless enum to turn its members into a lookup table
/// with [`SheetOperator::add_enum_value_range_table`](crate::SheetOperator::add_enum_value_range_table).
///
/// ```
/// use tabwright::EnumValues;
///
/// #[derive(Debug, Clone, Copy)]
/// enum Status {
///     Open,
///     Closed,
/// }
///
/// impl EnumValues for Status {
///     const TYPE_NAME: &'static str = "Status";
///
///     fn values() -> Vec<Self> {
///         vec![Status::Open, Status::Closed]
///     }
/// }
///
/// assert_eq!(Status::values().len(), 2);
/// ```
pub trait EnumValues: Sized {
    /// Name used as the column header of the generated table
    const TYPE_NAME: &'static str;

    /// Every member, in declaration order
    fn values() -> Vec<Self>;
}
