//! Support for partial updates where `null` means "clear this field".

use serde::{Deserialize, Deserializer};

/// Deserialize a field that distinguishes between being absent and being `null`.
///
/// Use together with `#[serde(default)]`:
/// - absent field → `None` (leave unchanged),
/// - `null` → `Some(None)` (clear),
/// - a value → `Some(Some(value))` (replace).
pub fn deserialize_nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
