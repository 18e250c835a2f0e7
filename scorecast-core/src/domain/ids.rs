use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Scored entity (a dealership, a location, a tenant site).
    EntityId
);
string_id!(
    /// Forecast model identifier carried on every `ImpactForecast`.
    ModelId
);
string_id!(
    /// Market event identifier.
    EventId
);
string_id!(
    /// Triage card identifier.
    CardId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = EntityId::new("dealer-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"dealer-42\"");
        let back: EntityId = serde_json::from_str("\"dealer-42\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(id.to_string(), "dealer-42");
    }
}
