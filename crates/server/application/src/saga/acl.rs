//! ACL step shared by the create-topic and cluster-access sagas.

use async_trait::async_trait;
use confluent_gateway_domain::{AclEntry, ClusterAccess, DomainResult};

#[async_trait]
pub trait EnsureServiceAccountAclStep: Send {
    fn has_cluster_access(&self) -> bool;
    async fn get_or_create_cluster_access(&mut self) -> DomainResult<ClusterAccess>;
    async fn create_acl_entry(&mut self, access: &ClusterAccess, entry: &AclEntry)
    -> DomainResult<()>;
    fn mark_cluster_access_ready(&mut self);
}

/// Applies the next pending ACL entry, or marks the access ready when none
/// remain. Loop it until [`EnsureServiceAccountAclStep::has_cluster_access`].
pub async fn ensure_service_account_acl<C>(ctx: &mut C) -> DomainResult<()>
where
    C: EnsureServiceAccountAclStep,
{
    if ctx.has_cluster_access() {
        return Ok(());
    }

    let access = ctx.get_or_create_cluster_access().await?;

    match access.next_pending_acl() {
        Some(entry) => ctx.create_acl_entry(&access, entry).await,
        None => {
            ctx.mark_cluster_access_ready();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confluent_gateway_domain::{
        CapabilityId, ClusterId, ServiceAccountId, UserAccountId,
    };
    use uuid::Uuid;

    struct StubContext {
        access: ClusterAccess,
        ready: bool,
        applied: Vec<Uuid>,
    }

    #[async_trait]
    impl EnsureServiceAccountAclStep for StubContext {
        fn has_cluster_access(&self) -> bool {
            self.ready
        }

        async fn get_or_create_cluster_access(&mut self) -> DomainResult<ClusterAccess> {
            Ok(self.access.clone())
        }

        async fn create_acl_entry(
            &mut self,
            _access: &ClusterAccess,
            entry: &AclEntry,
        ) -> DomainResult<()> {
            self.applied.push(entry.id);
            if let Some(stored) = self.access.acl.iter_mut().find(|e| e.id == entry.id) {
                stored.mark_as_done();
            }
            Ok(())
        }

        fn mark_cluster_access_ready(&mut self) {
            self.ready = true;
        }
    }

    fn stub() -> StubContext {
        StubContext {
            access: ClusterAccess::new(
                ServiceAccountId::new("sa-1"),
                UserAccountId::from_internal_user(1),
                ClusterId::new("lkc-1"),
                CapabilityId::new("cap"),
            ),
            ready: false,
            applied: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_applies_exactly_one_entry_per_invocation() {
        let mut ctx = stub();
        ctx.access.acl[0].mark_as_done();
        ctx.access.acl[1].mark_as_done();
        let expected = ctx.access.acl[2].id;

        ensure_service_account_acl(&mut ctx).await.unwrap();

        assert_eq!(ctx.applied, vec![expected]);
        assert_eq!(ctx.access.pending_acl().count(), ctx.access.acl.len() - 3);
        assert!(!ctx.ready);
    }

    #[tokio::test]
    async fn test_marks_ready_once_nothing_is_pending() {
        let mut ctx = stub();
        let total = ctx.access.acl.len();

        for _ in 0..total {
            ensure_service_account_acl(&mut ctx).await.unwrap();
        }
        assert!(!ctx.ready);

        ensure_service_account_acl(&mut ctx).await.unwrap();
        assert!(ctx.ready);
        assert_eq!(ctx.applied.len(), total);
    }

    #[tokio::test]
    async fn test_ready_access_is_left_alone() {
        let mut ctx = stub();
        ctx.ready = true;

        ensure_service_account_acl(&mut ctx).await.unwrap();

        assert!(ctx.applied.is_empty());
    }
}
