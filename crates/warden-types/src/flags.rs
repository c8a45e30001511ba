//! Built-in flags and the flag registry.
//!
//! The constants here are the flags the session handlers react to. Hosts
//! may register additional flags in a [`FlagRegistry`] before loading
//! region definitions.

use std::collections::BTreeMap;

use crate::enums::{RegionGroup, State};
use crate::error::FlagError;
use crate::flag::{Flag, FlagKind, GROUP_FLAG_SUFFIX};

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Whether non-members may enter a region.
pub static ENTRY: Flag = Flag::state("entry", Some(State::Allow))
    .with_default_group(RegionGroup::NonMembers);

/// Whether non-members may leave a region.
pub static EXIT: Flag =
    Flag::state("exit", Some(State::Allow)).with_default_group(RegionGroup::NonMembers);

/// Whether leaving a region by teleport is permitted.
pub static EXIT_VIA_TELEPORT: Flag = Flag::state("exit-via-teleport", Some(State::Allow));

/// When set, leaving is always permitted regardless of [`EXIT`].
pub static EXIT_OVERRIDE: Flag = Flag::new("exit-override", FlagKind::Boolean);

/// Message shown when entry is denied.
pub static ENTRY_DENY_MESSAGE: Flag = Flag::new("entry-deny-message", FlagKind::Text);

/// Message shown when exit is denied.
pub static EXIT_DENY_MESSAGE: Flag = Flag::new("exit-deny-message", FlagKind::Text);

// ---------------------------------------------------------------------------
// Messages and notifications
// ---------------------------------------------------------------------------

/// Message shown on entering a region.
pub static GREET_MESSAGE: Flag = Flag::new("greeting", FlagKind::Text);

/// Message shown on leaving a region.
pub static FAREWELL_MESSAGE: Flag = Flag::new("farewell", FlagKind::Text);

/// Notify staff when somebody enters the region.
pub static NOTIFY_ENTER: Flag = Flag::new("notify-enter", FlagKind::Boolean);

/// Notify staff when somebody leaves the region.
pub static NOTIFY_LEAVE: Flag = Flag::new("notify-leave", FlagKind::Boolean);

// ---------------------------------------------------------------------------
// Continuous effects
// ---------------------------------------------------------------------------

/// Seconds between heal applications.
pub static HEAL_DELAY: Flag = Flag::new("heal-delay", FlagKind::Integer);

/// Health added (or removed, when negative) per application.
pub static HEAL_AMOUNT: Flag = Flag::new("heal-amount", FlagKind::Integer);

/// Lower bound for healing.
pub static MIN_HEAL: Flag = Flag::new("heal-min-health", FlagKind::Double);

/// Upper bound for healing.
pub static MAX_HEAL: Flag = Flag::new("heal-max-health", FlagKind::Double);

/// Seconds between feed applications.
pub static FEED_DELAY: Flag = Flag::new("feed-delay", FlagKind::Integer);

/// Food added (or removed, when negative) per application.
pub static FEED_AMOUNT: Flag = Flag::new("feed-amount", FlagKind::Integer);

/// Lower bound for feeding.
pub static MIN_FOOD: Flag = Flag::new("feed-min-hunger", FlagKind::Integer);

/// Upper bound for feeding.
pub static MAX_FOOD: Flag = Flag::new("feed-max-hunger", FlagKind::Integer);

/// Actors inside cannot take damage.
pub static INVINCIBILITY: Flag = Flag::state("invincible", None);

/// Game mode enforced inside the region.
pub static GAME_MODE: Flag = Flag::new("game-mode", FlagKind::GameMode);

/// All flags known to the core, in a stable order.
pub fn builtin() -> Vec<Flag> {
    vec![
        ENTRY.clone(),
        EXIT.clone(),
        EXIT_VIA_TELEPORT.clone(),
        EXIT_OVERRIDE.clone(),
        ENTRY_DENY_MESSAGE.clone(),
        EXIT_DENY_MESSAGE.clone(),
        GREET_MESSAGE.clone(),
        FAREWELL_MESSAGE.clone(),
        NOTIFY_ENTER.clone(),
        NOTIFY_LEAVE.clone(),
        HEAL_DELAY.clone(),
        HEAL_AMOUNT.clone(),
        MIN_HEAL.clone(),
        MAX_HEAL.clone(),
        FEED_DELAY.clone(),
        FEED_AMOUNT.clone(),
        MIN_FOOD.clone(),
        MAX_FOOD.clone(),
        INVINCIBILITY.clone(),
        GAME_MODE.clone(),
    ]
}

// ---------------------------------------------------------------------------
// FlagRegistry
// ---------------------------------------------------------------------------

/// Lookup table of every flag a deployment understands.
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    flags: BTreeMap<String, Flag>,
}

impl FlagRegistry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            flags: BTreeMap::new(),
        }
    }

    /// A registry pre-populated with [`builtin`] flags.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for flag in builtin() {
            registry.flags.insert(flag.name().to_owned(), flag);
        }
        registry
    }

    /// Register a flag.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::DuplicateFlag`] if the name is taken, including
    /// by the companion group flag of another flag.
    pub fn register(&mut self, flag: Flag) -> Result<(), FlagError> {
        let name = flag.name().to_owned();
        if self.flags.contains_key(&name) || self.resolve_group_key(&name).is_some() {
            return Err(FlagError::DuplicateFlag(name));
        }
        self.flags.insert(name, flag);
        Ok(())
    }

    /// Look up a flag by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Flag> {
        self.flags.get(&name.to_ascii_lowercase())
    }

    /// If `key` names a companion group flag (`<flag>-group`), return the
    /// flag it belongs to.
    pub fn resolve_group_key(&self, key: &str) -> Option<&Flag> {
        let lower = key.to_ascii_lowercase();
        let base = lower.strip_suffix(GROUP_FLAG_SUFFIX)?;
        self.flags.get(base)
    }

    /// Iterate over every registered flag in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    /// Number of registered flags.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether no flags are registered.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_resolves_case_insensitively() {
        let registry = FlagRegistry::with_builtin();
        assert_eq!(registry.get("HEAL-AMOUNT").map(Flag::kind), Some(FlagKind::Integer));
        assert_eq!(registry.len(), builtin().len());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = FlagRegistry::with_builtin();
        let result = registry.register(Flag::custom("entry", FlagKind::Boolean));
        assert_eq!(result, Err(FlagError::DuplicateFlag(String::from("entry"))));
    }

    #[test]
    fn group_keys_resolve_to_their_flag() {
        let registry = FlagRegistry::with_builtin();
        assert_eq!(registry.resolve_group_key("entry-group").map(Flag::name), Some("entry"));
        assert!(registry.resolve_group_key("entry").is_none());
    }

    #[test]
    fn custom_flag_can_be_registered() {
        let mut registry = FlagRegistry::new();
        assert!(registry.register(Flag::custom("mob-spawning", FlagKind::State)).is_ok());
        assert!(registry.get("mob-spawning").is_some());
        assert!(!registry.is_empty());
    }

    #[test]
    fn entry_defaults_allow_for_non_members() {
        assert_eq!(ENTRY.default_group(), Some(RegionGroup::NonMembers));
        assert_eq!(
            ENTRY.default_value().and_then(crate::FlagValue::as_state),
            Some(State::Allow)
        );
    }
}
