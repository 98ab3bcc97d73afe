use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable device identifier.
///
/// Assigned by the remote endpoint and stable across connect/disconnect
/// cycles; display names may change, this must not.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_from_str() {
        let id: DeviceId = "iphone15pro".into();
        assert_eq!(id.as_str(), "iphone15pro");
    }

    #[test]
    fn test_device_id_ordering_is_lexicographic() {
        let a = DeviceId::from("ipadair");
        let b = DeviceId::from("iphone15pro");
        assert!(a < b);
    }
}
