//! End-to-end resolution: point lookup -> group membership -> flag ladder.

use demesne::{
    flags::actions, ClaimStore, ClaimType, EngineConfig, FlagQuery, FlagResolver, GroupProvider,
    PermissionEntry, StaticGroupProvider, Tristate, TrustType, Vec3,
};
use uuid::Uuid;

/// The full caller flow the engine is embedded for: locate the claim under
/// a point, fetch the actor's groups, resolve the action.
#[tokio::test]
async fn test_point_to_decision_flow() {
    let store = ClaimStore::new();
    let resolver = FlagResolver::new(EngineConfig::default());
    let groups = StaticGroupProvider::new();
    let world = Uuid::new_v4();

    let owner = Uuid::new_v4();
    let claim = store
        .create(
            Some(owner),
            world,
            Vec3::new(0, 0, 0),
            Vec3::new(64, 255, 64),
            ClaimType::Basic,
        )
        .await
        .unwrap();

    let visitor = Uuid::new_v4();
    groups.set_groups(visitor, vec!["citizens".into()]);

    let here = Vec3::new(32, 70, 32);
    let at = store.claim_or_wilderness(world, here).await;
    assert_eq!(at.id(), claim.id());

    // Basic claims deny block-break by default.
    let memberships = groups.groups_of(visitor).await;
    let value = resolver
        .resolve(
            &store,
            visitor,
            &memberships,
            actions::BLOCK_BREAK,
            at.id(),
            &FlagQuery::default(),
        )
        .await
        .unwrap();
    assert_eq!(value, Tristate::Deny);

    // A group override opens it up for citizens.
    resolver.set_group_flag(
        at.id(),
        "citizens",
        PermissionEntry::new(actions::BLOCK_BREAK, Tristate::Allow),
    );
    let value = resolver
        .resolve(
            &store,
            visitor,
            &memberships,
            actions::BLOCK_BREAK,
            at.id(),
            &FlagQuery::default(),
        )
        .await
        .unwrap();
    assert_eq!(value, Tristate::Allow);
}

#[tokio::test]
async fn test_unclaimed_land_uses_wilderness_defaults() {
    let store = ClaimStore::new();
    let resolver = FlagResolver::new(EngineConfig::default());
    let world = Uuid::new_v4();

    let nowhere = Vec3::new(10_000, 64, -10_000);
    let wild = store.claim_or_wilderness(world, nowhere).await;
    assert_eq!(wild.claim_type(), ClaimType::Wilderness);

    let value = resolver
        .resolve(
            &store,
            Uuid::new_v4(),
            &[],
            actions::BLOCK_BREAK,
            wild.id(),
            &FlagQuery::default(),
        )
        .await
        .unwrap();
    assert_eq!(value, Tristate::Allow);
}

#[tokio::test]
async fn test_trust_check_combines_with_flags() {
    let store = ClaimStore::new();
    let world = Uuid::new_v4();
    let owner = Uuid::new_v4();
    let claim = store
        .create(
            Some(owner),
            world,
            Vec3::new(0, 0, 0),
            Vec3::new(64, 255, 64),
            ClaimType::Basic,
        )
        .await
        .unwrap();

    let friend = Uuid::new_v4();
    store
        .mutate(claim.id(), |c| c.grant_trust(friend, TrustType::Builder))
        .await
        .unwrap();

    let required = demesne::flags::required_trust(actions::BLOCK_PLACE).unwrap();
    let fetched = store.get(claim.id()).await.unwrap();
    assert!(fetched.is_trusted(&friend, &[], required));
    assert!(!fetched.is_trusted(&Uuid::new_v4(), &[], required));
    // Inventory access is implied by builder trust.
    let container = demesne::flags::required_trust(actions::INTERACT_INVENTORY).unwrap();
    assert!(fetched.is_trusted(&friend, &[], container));
}

#[tokio::test]
async fn test_override_cleanup_after_delete() {
    let store = ClaimStore::new();
    let resolver = FlagResolver::new(EngineConfig::default());
    let claim = store
        .create(
            Some(Uuid::new_v4()),
            Uuid::new_v4(),
            Vec3::new(0, 0, 0),
            Vec3::new(64, 255, 64),
            ClaimType::Basic,
        )
        .await
        .unwrap();

    resolver.set_group_flag(
        claim.id(),
        "citizens",
        PermissionEntry::new(actions::PVP, Tristate::Deny),
    );
    assert_eq!(resolver.list_flags("citizens", claim.id()).len(), 1);

    let removed = store
        .delete(claim.id(), demesne::Cascade::Deny)
        .await
        .unwrap();
    for id in removed {
        resolver.clear_claim(id);
    }
    assert!(resolver.list_flags("citizens", claim.id()).is_empty());
}
