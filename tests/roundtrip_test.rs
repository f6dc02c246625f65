//! Randomized round-trip coverage for the durable record schema.

use chrono::Utc;
use demesne::codec::{decode, encode};
use demesne::flags::actions;
use demesne::{Claim, ClaimType, Tristate, TrustType, Vec3};
use rand::Rng;
use uuid::Uuid;

const ACTION_POOL: &[&str] = &[
    actions::BLOCK_BREAK,
    actions::BLOCK_PLACE,
    actions::ENTITY_DAMAGE,
    actions::EXPLOSION,
    actions::FIRE_SPREAD,
    actions::INTERACT_INVENTORY,
    actions::ITEM_DROP,
    actions::PORTAL_USE,
    actions::PVP,
];

fn random_vec3(rng: &mut impl Rng) -> Vec3 {
    Vec3::new(
        rng.gen_range(-30_000..30_000),
        rng.gen_range(-64..320),
        rng.gen_range(-30_000..30_000),
    )
}

fn random_claim(rng: &mut impl Rng) -> Claim {
    let claim_type = match rng.gen_range(0..5) {
        0 => ClaimType::Basic,
        1 => ClaimType::Admin,
        2 => ClaimType::Subdivision,
        3 => ClaimType::Town,
        _ => ClaimType::Wilderness,
    };
    let owner = match claim_type {
        ClaimType::Admin | ClaimType::Wilderness => None,
        _ => Some(Uuid::new_v4()),
    };

    let mut claim = Claim::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        owner,
        random_vec3(rng),
        random_vec3(rng),
        claim_type,
    );

    if rng.gen_bool(0.5) {
        claim.set_cuboid(true);
    }
    if rng.gen_bool(0.3) {
        claim.set_resizable(false);
    }
    if rng.gen_bool(0.3) {
        claim.set_inherit_parent(false);
    }
    if rng.gen_bool(0.2) {
        claim.set_allow_expiration(false);
    }
    if rng.gen_bool(0.1) {
        claim.set_expired(true);
    }
    if rng.gen_bool(0.3) {
        claim.set_deny_messages(false);
    }
    if rng.gen_bool(0.2) {
        claim.set_flag_overrides(false);
    }
    if rng.gen_bool(0.2) {
        claim.set_requires_claim_blocks(false);
    }
    claim.set_pvp_override(match rng.gen_range(0..3) {
        0 => Tristate::Allow,
        1 => Tristate::Deny,
        _ => Tristate::Undefined,
    });
    claim.set_last_active(Utc::now() - chrono::Duration::days(rng.gen_range(0..400)));

    if rng.gen_bool(0.6) {
        claim.set_name(Some(format!("claim-{}", rng.gen::<u32>())));
    }
    if rng.gen_bool(0.4) {
        claim.set_greeting(Some("welcome".into()));
    }
    if rng.gen_bool(0.4) {
        claim.set_farewell(Some("goodbye".into()));
    }
    if rng.gen_bool(0.5) {
        claim.set_spawn(Some(random_vec3(rng)));
    }
    if claim_type == ClaimType::Subdivision {
        claim.set_parent(Some(Uuid::new_v4()));
    }

    let ranks = TrustType::all();
    for _ in 0..rng.gen_range(0..5) {
        claim.grant_trust(Uuid::new_v4(), ranks[rng.gen_range(0..ranks.len())]);
    }
    for _ in 0..rng.gen_range(0..3) {
        let group = format!("group-{}", rng.gen_range(0..10));
        claim.grant_group_trust(&group, ranks[rng.gen_range(0..ranks.len())]);
    }

    for _ in 0..rng.gen_range(0..6) {
        let action = ACTION_POOL[rng.gen_range(0..ACTION_POOL.len())];
        let value = if rng.gen_bool(0.5) {
            Tristate::Allow
        } else {
            Tristate::Deny
        };
        claim.set_flag(action, value);
    }

    if rng.gen_bool(0.3) {
        claim.set_for_sale(true, rng.gen_range(0..1_000_000) as f64 / 100.0);
    }

    claim
}

/// decode(encode(c)) is attribute-equal to c on every persisted field, for
/// claims of every type. Runtime-only state (dirty marker, mutation
/// generation) is outside the law and outside the comparison.
#[test]
fn test_round_trip_100_random_claims() {
    let mut rng = rand::thread_rng();
    for i in 0..100 {
        let claim = random_claim(&mut rng);
        let record = encode(&claim).unwrap_or_else(|e| panic!("encode failed at #{i}: {e}"));
        let decoded = decode(record).unwrap_or_else(|e| panic!("decode failed at #{i}: {e}"));
        assert_eq!(decoded, claim, "round-trip mismatch at #{i}");
        assert!(!decoded.is_dirty());
    }
}

/// Corners survive in normalized form no matter the input order.
#[test]
fn test_round_trip_keeps_corners_normalized() {
    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        let claim = random_claim(&mut rng);
        let decoded = decode(encode(&claim).unwrap()).unwrap();
        let lesser = decoded.lesser_corner();
        let greater = decoded.greater_corner();
        assert!(lesser.x <= greater.x);
        assert!(lesser.y <= greater.y);
        assert!(lesser.z <= greater.z);
    }
}
