//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::flags::DESTRUCTIVE_ACTIONS;
use crate::types::Tristate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub fallback: FallbackPolicy,

    /// Global per-action defaults, the fourth resolution tier.
    #[serde(default)]
    pub global_flag_defaults: BTreeMap<String, Tristate>,

    /// Inactivity threshold (days) suggested to expiration-sweep callers.
    #[serde(default = "default_expiration_days")]
    pub expiration_threshold_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback: FallbackPolicy::default(),
            global_flag_defaults: BTreeMap::new(),
            expiration_threshold_days: default_expiration_days(),
        }
    }
}

/// System-wide fallback applied when an action is unset at every tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackPolicy {
    /// Actions treated as destructive for fallback purposes.
    #[serde(default = "default_destructive_actions")]
    pub destructive_actions: BTreeSet<String>,

    #[serde(default = "default_deny")]
    pub destructive_value: Tristate,

    #[serde(default = "default_allow")]
    pub benign_value: Tristate,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            destructive_actions: default_destructive_actions(),
            destructive_value: default_deny(),
            benign_value: default_allow(),
        }
    }
}

impl FallbackPolicy {
    /// Final resolution value for an action with no decision at any tier.
    pub fn value_for(&self, action: &str) -> Tristate {
        if self.destructive_actions.contains(action) {
            self.destructive_value
        } else {
            self.benign_value
        }
    }
}

fn default_destructive_actions() -> BTreeSet<String> {
    DESTRUCTIVE_ACTIONS.iter().map(|a| a.to_string()).collect()
}

fn default_deny() -> Tristate {
    Tristate::Deny
}

fn default_allow() -> Tristate {
    Tristate::Allow
}

fn default_expiration_days() -> u32 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::actions;

    #[test]
    fn test_fallback_destructive_vs_benign() {
        let policy = FallbackPolicy::default();
        assert_eq!(policy.value_for(actions::BLOCK_BREAK), Tristate::Deny);
        assert_eq!(policy.value_for(actions::ITEM_DROP), Tristate::Allow);
        assert_eq!(policy.value_for("some-unknown-action"), Tristate::Allow);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.expiration_threshold_days, 60);
        assert!(config
            .fallback
            .destructive_actions
            .contains(actions::EXPLOSION));
    }

    #[test]
    fn test_fallback_policy_configurable() {
        let json = r#"{
            "fallback": {
                "destructive_actions": ["pvp"],
                "destructive_value": "allow",
                "benign_value": "deny"
            }
        }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.fallback.value_for("pvp"), Tristate::Allow);
        assert_eq!(config.fallback.value_for("block-break"), Tristate::Deny);
    }
}
