use serde::{Deserialize, Deserializer};

/// Distinguish an omitted field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates. Pair with `#[serde(default)]`.
pub fn explicit<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
