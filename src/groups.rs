//! Identity/group collaborator interface.
//!
//! The engine never invents group membership. The embedding host supplies
//! it through [`GroupProvider`], already sorted into the deterministic
//! priority order the resolver's group tier relies on.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

#[async_trait]
pub trait GroupProvider: Send + Sync {
    /// Groups the subject belongs to, highest priority first. The order
    /// must be deterministic: it is the tie-breaker between conflicting
    /// group overrides.
    async fn groups_of(&self, subject_id: Uuid) -> Vec<String>;
}

/// Map-backed provider for tests and static deployments.
#[derive(Debug, Default)]
pub struct StaticGroupProvider {
    memberships: DashMap<Uuid, Vec<String>>,
}

impl StaticGroupProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a subject's memberships. The given order is the priority
    /// order.
    pub fn set_groups(&self, subject_id: Uuid, groups: Vec<String>) {
        self.memberships.insert(subject_id, groups);
    }
}

#[async_trait]
impl GroupProvider for StaticGroupProvider {
    async fn groups_of(&self, subject_id: Uuid) -> Vec<String> {
        self.memberships
            .get(&subject_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_membership_order_preserved() {
        let provider = StaticGroupProvider::new();
        let subject = Uuid::new_v4();
        provider.set_groups(subject, vec!["moderators".into(), "citizens".into()]);

        let groups = provider.groups_of(subject).await;
        assert_eq!(groups, vec!["moderators".to_string(), "citizens".to_string()]);

        assert!(provider.groups_of(Uuid::new_v4()).await.is_empty());
    }
}
