use super::acl::{AclDefinition, acl_template_for};
use super::cluster::ApiKey;
use crate::{CapabilityId, ClusterId, ServiceAccountId, UserAccountId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity created at the platform on behalf of a capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub id: ServiceAccountId,
    pub capability_id: CapabilityId,
    /// ACL principal of the account
    pub user_account_id: UserAccountId,
    pub cluster_accesses: Vec<ClusterAccess>,
    pub created_at: DateTime<Utc>,
}

impl ServiceAccount {
    /// New account with an initial access to `cluster_id` and its full
    /// pending ACL template.
    pub fn new(
        id: ServiceAccountId,
        capability_id: CapabilityId,
        user_account_id: UserAccountId,
        cluster_id: ClusterId,
    ) -> Self {
        let access = ClusterAccess::new(
            id.clone(),
            user_account_id.clone(),
            cluster_id,
            capability_id.clone(),
        );

        Self {
            id,
            capability_id,
            user_account_id,
            cluster_accesses: vec![access],
            created_at: Utc::now(),
        }
    }

    pub fn cluster_access(&self, cluster_id: &ClusterId) -> Option<&ClusterAccess> {
        self.cluster_accesses
            .iter()
            .find(|access| &access.cluster_id == cluster_id)
    }

    /// Builds (without attaching) a fresh access for another cluster.
    pub fn new_cluster_access(&self, cluster_id: ClusterId) -> ClusterAccess {
        ClusterAccess::new(
            self.id.clone(),
            self.user_account_id.clone(),
            cluster_id,
            self.capability_id.clone(),
        )
    }
}

/// Binding of one service account's credentials and ACL grants to one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAccess {
    pub id: Uuid,
    pub service_account_id: ServiceAccountId,
    pub user_account_id: UserAccountId,
    pub cluster_id: ClusterId,
    pub capability_id: CapabilityId,
    /// Empty until a cluster API key has been created
    pub api_key: ApiKey,
    /// Template entries in application order
    pub acl: Vec<AclEntry>,
    pub created_at: DateTime<Utc>,
}

impl ClusterAccess {
    pub fn new(
        service_account_id: ServiceAccountId,
        user_account_id: UserAccountId,
        cluster_id: ClusterId,
        capability_id: CapabilityId,
    ) -> Self {
        let acl = acl_template_for(&capability_id)
            .into_iter()
            .map(AclEntry::pending)
            .collect();

        Self {
            id: Uuid::new_v4(),
            service_account_id,
            user_account_id,
            cluster_id,
            capability_id,
            api_key: ApiKey::default(),
            acl,
            created_at: Utc::now(),
        }
    }

    /// Entries not yet applied at the platform, in template order.
    pub fn pending_acl(&self) -> impl Iterator<Item = &AclEntry> {
        self.acl.iter().filter(|entry| entry.is_pending())
    }

    pub fn next_pending_acl(&self) -> Option<&AclEntry> {
        self.pending_acl().next()
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// One ACL template entry of a cluster access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclEntry {
    pub id: Uuid,
    pub definition: AclDefinition,
    /// `None` while the entry is pending
    pub created_at: Option<DateTime<Utc>>,
}

impl AclEntry {
    pub fn pending(definition: AclDefinition) -> Self {
        Self {
            id: Uuid::new_v4(),
            definition,
            created_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.created_at.is_none()
    }

    /// Records the entry as applied. Applied entries keep their timestamp.
    pub fn mark_as_done(&mut self) {
        if self.created_at.is_none() {
            self.created_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> ServiceAccount {
        ServiceAccount::new(
            ServiceAccountId::new("sa-1"),
            CapabilityId::new("cap"),
            UserAccountId::from_internal_user(7),
            ClusterId::new("lkc-1"),
        )
    }

    #[test]
    fn test_new_account_seeds_pending_template_for_cluster() {
        let account = account();
        let access = account.cluster_access(&ClusterId::new("lkc-1")).unwrap();

        assert_eq!(access.acl.len(), 12);
        assert_eq!(access.pending_acl().count(), 12);
        assert_eq!(access.user_account_id.as_str(), "User:7");
        assert!(!access.has_api_key());
        assert!(account.cluster_access(&ClusterId::new("lkc-2")).is_none());
    }

    #[test]
    fn test_next_pending_follows_template_order() {
        let mut access = account().cluster_accesses.remove(0);
        access.acl[0].mark_as_done();
        access.acl[1].mark_as_done();

        let next = access.next_pending_acl().unwrap();
        assert_eq!(next.id, access.acl[2].id);
        assert_eq!(access.pending_acl().count(), 10);
    }

    #[test]
    fn test_mark_as_done_keeps_first_timestamp() {
        let mut entry = AclEntry::pending(acl_template_for(&CapabilityId::new("c"))[0].clone());
        entry.mark_as_done();
        let first = entry.created_at;
        entry.mark_as_done();

        assert_eq!(entry.created_at, first);
    }
}
