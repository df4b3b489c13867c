//! ID types for the projection engine.
//!
//! All entity ids are opaque strings minted by the storage layer, so the
//! newtypes here exist for type safety rather than encoding.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id! {
    /// Type-safe wrapper for player ids.
    PlayerId
}

string_id! {
    /// Type-safe wrapper for projection ids.
    ProjectionId
}

string_id! {
    /// Type-safe wrapper for scenario ids. The global baseline is not a
    /// scenario row; it is represented as `Option<ScenarioId>::None`.
    ScenarioId
}

string_id! {
    /// Type-safe wrapper for stat-override ids.
    OverrideId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = PlayerId::new("abc-123");
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(PlayerId::from("abc-123"), id);
    }

    #[test]
    fn test_serde_transparent() {
        let id = ScenarioId::new("s1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"s1\"");
    }
}
