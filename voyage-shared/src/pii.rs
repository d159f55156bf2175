use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps customer contact and identity data so it never shows up in `Debug`
/// or `Display` output (and therefore not in `tracing` fields either).
/// Serialization passes the real value through because the backend needs it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

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

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_value() {
        let phone = Masked::from("+84 912 345 678");
        assert_eq!(format!("{:?}", phone), "********");
        assert_eq!(phone.to_string(), "********");
        assert_eq!(phone.expose(), "+84 912 345 678");
    }

    #[test]
    fn test_serialize_passes_through() {
        let passport = Masked::from("B1234567");
        let json = serde_json::to_string(&passport).unwrap();
        assert_eq!(json, "\"B1234567\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, passport);
    }
}
