use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a string-backed identifier with the conversions every id shares.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Tenant/team identifier owning topics and service accounts
    CapabilityId
);

string_id!(
    /// Kafka cluster identifier at the platform (e.g. `lkc-4npj6`)
    ClusterId
);

string_id!(
    /// Service account resource id at the platform (e.g. `sa-abc123`)
    ServiceAccountId
);

string_id!(
    /// Principal used in ACL bindings (e.g. `User:123456`)
    UserAccountId
);

string_id!(
    /// Identifier of a self-service topic
    TopicId
);

string_id!(
    /// Identifier of a self-service message contract
    MessageContractId
);

impl UserAccountId {
    /// Builds the ACL principal for a numeric internal user id.
    pub fn from_internal_user(id: i64) -> Self {
        Self(format!("User:{}", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_serde_are_transparent() {
        let id = CapabilityId::new("my-capability-xyz");
        assert_eq!(id.to_string(), "my-capability-xyz");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"my-capability-xyz\""
        );
    }

    #[test]
    fn test_user_account_id_from_internal_user() {
        assert_eq!(UserAccountId::from_internal_user(42).as_str(), "User:42");
    }
}
