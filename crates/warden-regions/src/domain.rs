//! Owner and member domains.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use warden_types::ActorId;

/// A set of actors and named groups.
///
/// Regions carry two domains: owners and members. An actor is in a domain
/// if its id is listed or if any group it belongs to is listed. Group
/// names are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Domain {
    /// Actors listed directly.
    #[serde(default)]
    players: BTreeSet<ActorId>,
    /// Lowercase group names.
    #[serde(default)]
    groups: BTreeSet<String>,
}

impl Domain {
    /// An empty domain.
    pub const fn new() -> Self {
        Self {
            players: BTreeSet::new(),
            groups: BTreeSet::new(),
        }
    }

    /// Add an actor.
    pub fn add_player(&mut self, actor: ActorId) {
        self.players.insert(actor);
    }

    /// Remove an actor. Returns whether it was present.
    pub fn remove_player(&mut self, actor: ActorId) -> bool {
        self.players.remove(&actor)
    }

    /// Add a group.
    pub fn add_group(&mut self, group: &str) {
        self.groups.insert(group.trim().to_ascii_lowercase());
    }

    /// Remove a group. Returns whether it was present.
    pub fn remove_group(&mut self, group: &str) -> bool {
        self.groups.remove(&group.trim().to_ascii_lowercase())
    }

    /// Whether the actor is listed directly.
    pub fn contains_player(&self, actor: ActorId) -> bool {
        self.players.contains(&actor)
    }

    /// Whether the actor, or one of its groups, is listed.
    pub fn contains(&self, actor: ActorId, groups: &[String]) -> bool {
        self.contains_player(actor)
            || groups
                .iter()
                .any(|g| self.groups.contains(&g.to_ascii_lowercase()))
    }

    /// The listed actors.
    pub fn players(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.players.iter().copied()
    }

    /// The listed groups, lowercase.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    /// Total number of listed actors and groups.
    pub fn size(&self) -> usize {
        self.players.len().saturating_add(self.groups.len())
    }

    /// Whether nothing is listed.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_membership_is_case_insensitive() {
        let mut domain = Domain::new();
        domain.add_group("Builders");
        let actor = ActorId::new();
        assert!(domain.contains(actor, &[String::from("BUILDERS")]));
        assert!(!domain.contains(actor, &[String::from("guests")]));
    }

    #[test]
    fn listed_player_is_contained_without_groups() {
        let mut domain = Domain::new();
        let actor = ActorId::new();
        domain.add_player(actor);
        assert!(domain.contains(actor, &[]));
        assert_eq!(domain.size(), 1);
        assert!(domain.remove_player(actor));
        assert!(domain.is_empty());
    }
}
