//! ACL definitions and the per-capability ACL template.
//!
//! Enum values use the upper-case names of the Kafka REST v3 ACL API, which
//! is also how they are stored.

use crate::CapabilityId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a wire enum with `as_str`, `Display` and `FromStr`.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }
    };
}

wire_enum!(
    /// Kind of Kafka resource an ACL applies to
    ResourceType {
        Topic => "TOPIC",
        Group => "GROUP",
        Cluster => "CLUSTER",
        TransactionalId => "TRANSACTIONAL_ID",
    }
);

wire_enum!(
    /// How the resource name is matched
    PatternType {
        Literal => "LITERAL",
        Prefixed => "PREFIXED",
    }
);

wire_enum!(
    /// Operation granted or denied
    OperationType {
        All => "ALL",
        Read => "READ",
        Write => "WRITE",
        Create => "CREATE",
        Describe => "DESCRIBE",
        DescribeConfigs => "DESCRIBE_CONFIGS",
        Alter => "ALTER",
        AlterConfigs => "ALTER_CONFIGS",
        ClusterAction => "CLUSTER_ACTION",
        IdempotentWrite => "IDEMPOTENT_WRITE",
    }
);

wire_enum!(
    PermissionType {
        Allow => "ALLOW",
        Deny => "DENY",
    }
);

/// One access-control rule, independent of the principal it is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclDefinition {
    pub resource_type: ResourceType,
    pub resource_name: String,
    pub pattern_type: PatternType,
    pub operation_type: OperationType,
    pub permission_type: PermissionType,
}

impl AclDefinition {
    pub fn new(
        resource_type: ResourceType,
        resource_name: impl Into<String>,
        pattern_type: PatternType,
        operation_type: OperationType,
        permission_type: PermissionType,
    ) -> Self {
        Self {
            resource_type,
            resource_name: resource_name.into(),
            pattern_type,
            operation_type,
            permission_type,
        }
    }
}

impl fmt::Display for AclDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{} {}",
            self.permission_type,
            self.operation_type,
            self.resource_type,
            self.pattern_type,
            self.resource_name
        )
    }
}

const CLUSTER_RESOURCE: &str = "kafka-cluster";

/// ACL entries every capability needs on a cluster, in the order they are
/// applied.
pub fn acl_template_for(capability_id: &CapabilityId) -> Vec<AclDefinition> {
    use OperationType::*;
    use PatternType::*;
    use PermissionType::*;
    use ResourceType::*;

    let cap = capability_id.as_str();

    vec![
        AclDefinition::new(Topic, "pub.", Prefixed, Read, Allow),
        AclDefinition::new(Topic, format!("{cap}."), Prefixed, All, Allow),
        AclDefinition::new(Topic, format!("pub.{cap}."), Prefixed, All, Allow),
        AclDefinition::new(Group, format!("{cap}."), Prefixed, All, Allow),
        AclDefinition::new(Group, format!("connect-{cap}"), Prefixed, All, Allow),
        AclDefinition::new(TransactionalId, format!("{cap}."), Prefixed, All, Allow),
        AclDefinition::new(Cluster, CLUSTER_RESOURCE, Literal, Alter, Deny),
        AclDefinition::new(Cluster, CLUSTER_RESOURCE, Literal, AlterConfigs, Deny),
        AclDefinition::new(Cluster, CLUSTER_RESOURCE, Literal, ClusterAction, Deny),
        AclDefinition::new(Cluster, CLUSTER_RESOURCE, Literal, DescribeConfigs, Allow),
        AclDefinition::new(Cluster, CLUSTER_RESOURCE, Literal, Describe, Allow),
        AclDefinition::new(Cluster, CLUSTER_RESOURCE, Literal, IdempotentWrite, Allow),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_template_is_stable_across_calls() {
        let capability = CapabilityId::new("team-a-xyz");

        let first = acl_template_for(&capability);
        let second = acl_template_for(&capability);

        assert_eq!(first.len(), 12);
        assert_eq!(first, second);
    }

    #[test]
    fn test_template_is_parameterized_by_capability() {
        let template = acl_template_for(&CapabilityId::new("cap-1"));

        assert_eq!(template[0].resource_name, "pub.");
        assert_eq!(template[1].resource_name, "cap-1.");
        assert_eq!(template[2].resource_name, "pub.cap-1.");
        assert_eq!(template[4].resource_name, "connect-cap-1");
        assert_eq!(template[5].resource_type, ResourceType::TransactionalId);
        assert!(
            template[6..]
                .iter()
                .all(|acl| acl.resource_name == "kafka-cluster"
                    && acl.pattern_type == PatternType::Literal)
        );
    }

    #[test]
    fn test_template_denies_cluster_mutation() {
        let denied: Vec<_> = acl_template_for(&CapabilityId::new("cap"))
            .into_iter()
            .filter(|acl| acl.permission_type == PermissionType::Deny)
            .map(|acl| acl.operation_type)
            .collect();

        assert_eq!(
            denied,
            vec![
                OperationType::Alter,
                OperationType::AlterConfigs,
                OperationType::ClusterAction
            ]
        );
    }

    #[rstest]
    #[case("TOPIC", ResourceType::Topic)]
    #[case("TRANSACTIONAL_ID", ResourceType::TransactionalId)]
    #[case("CLUSTER", ResourceType::Cluster)]
    fn test_resource_type_parses_wire_name(#[case] wire: &str, #[case] expected: ResourceType) {
        assert_eq!(wire.parse::<ResourceType>().unwrap(), expected);
        assert_eq!(expected.as_str(), wire);
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        assert!("EXPLODE".parse::<OperationType>().is_err());
    }
}
