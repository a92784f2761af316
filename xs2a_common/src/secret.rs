use std::{
    fmt,
    fmt::{Debug, Display},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A wrapper for credentials (PSU passwords, OTPs) that never prints its contents.
///
/// Serialization also redacts the value, so a `Secret` can sit inside request objects that end up in logs or
/// JSON exports without leaking. Deserialization accepts the plain value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Serialize for Secret<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("****")
    }
}

impl<'de, T> Deserialize<'de> for Secret<T>
where T: Clone + Default + Deserialize<'de>
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn secret_is_redacted() {
        let password = Secret::from("12345");
        assert_eq!(format!("{password}"), "****");
        assert_eq!(format!("{password:?}"), "****");
        assert_eq!(password.reveal(), "12345");
    }

    #[test]
    fn secret_serializes_redacted() {
        let password = Secret::from("hunter2");
        let json = serde_json::to_string(&password).unwrap();
        assert_eq!(json, "\"****\"");
        let restored: Secret<String> = serde_json::from_str("\"hunter2\"").unwrap();
        assert_eq!(restored, password);
    }
}
