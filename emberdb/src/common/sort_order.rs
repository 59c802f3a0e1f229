/// Direction of a sort key.
///
/// Descending reverses the order of key values only. Documents with equal
/// keys keep ascending id order in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    Ascending,
    Descending,
}
