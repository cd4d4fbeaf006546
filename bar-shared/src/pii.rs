use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps a guest's contact detail (phone numbers) so it never shows up in `{:?}` output.
///
/// Serialization passes the real value through, since the grid has to render it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Masked(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_phone() {
        let phone = Masked("+7 (999) 123-45-67".to_string());
        assert_eq!(format!("{:?}", phone), "********");
        assert_eq!(phone.expose(), "+7 (999) 123-45-67");
    }

    #[test]
    fn test_serialize_passes_value_through() {
        let phone = Masked("+7 999".to_string());
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"+7 999\"");
    }
}
