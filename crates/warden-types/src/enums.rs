//! Enumeration types shared by the resolution engine and the session layer.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The value domain of a state flag.
///
/// A state flag that is not set anywhere is represented as `None` by the
/// callers (the "NONE" state), so only the two explicit values live here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// The rule permits the behavior.
    Allow,
    /// The rule forbids the behavior.
    Deny,
}

impl State {
    /// Combine a sequence of states, DENY winning over ALLOW.
    ///
    /// Returns `None` if the sequence contains no states at all.
    pub fn combine<I>(states: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<Self>>,
    {
        let mut result = None;
        for state in states.into_iter().flatten() {
            if state == Self::Deny {
                return Some(Self::Deny);
            }
            result = Some(Self::Allow);
        }
        result
    }

    /// Parse `allow`/`deny` (case-insensitive).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(Self::Allow),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }
}

impl core::fmt::Display for State {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
        }
    }
}

// ---------------------------------------------------------------------------
// Association / RegionGroup
// ---------------------------------------------------------------------------

/// A subject's relation to one particular region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Association {
    /// Listed in the owners domain (directly or through a parent).
    Owner,
    /// Listed in the members domain but not an owner.
    Member,
    /// Neither owner nor member.
    NonMember,
}

/// Membership class a flag value is restricted to.
///
/// Stored on a region under the companion `<flag>-group` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionGroup {
    /// Owners only.
    Owners,
    /// Owners and members.
    Members,
    /// Members and non-members, but not owners.
    NonOwners,
    /// Non-members only.
    NonMembers,
    /// Everybody.
    All,
    /// Nobody; the value is effectively disabled.
    None,
}

impl RegionGroup {
    /// Whether a subject with the given association falls in this group.
    pub const fn contains(self, association: Association) -> bool {
        match self {
            Self::Owners => matches!(association, Association::Owner),
            Self::Members => matches!(association, Association::Owner | Association::Member),
            Self::NonOwners => {
                matches!(association, Association::Member | Association::NonMember)
            }
            Self::NonMembers => matches!(association, Association::NonMember),
            Self::All => true,
            Self::None => false,
        }
    }

    /// Parse a group name as written by administrators.
    ///
    /// Accepts `owners`, `members`, `nonowners`/`non_owners`/`non-owners`,
    /// `nonmembers`/`non_members`/`non-members`, `all`/`everyone`, `none`.
    pub fn parse(input: &str) -> Option<Self> {
        let normalized: String = input
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect();
        match normalized.as_str() {
            "owners" => Some(Self::Owners),
            "members" => Some(Self::Members),
            "nonowners" => Some(Self::NonOwners),
            "nonmembers" => Some(Self::NonMembers),
            "all" | "everyone" => Some(Self::All),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// The game mode an actor is playing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Normal play: damage, hunger, limited resources.
    Survival,
    /// Unlimited resources, no damage.
    Creative,
    /// Survival rules without block modification.
    Adventure,
    /// Invisible, non-interacting observer.
    Spectator,
}

impl GameMode {
    /// Parse a game mode name (case-insensitive).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "survival" => Some(Self::Survival),
            "creative" => Some(Self::Creative),
            "adventure" => Some(Self::Adventure),
            "spectator" => Some(Self::Spectator),
            _ => None,
        }
    }
}

impl core::fmt::Display for GameMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Survival => write!(f, "survival"),
            Self::Creative => write!(f, "creative"),
            Self::Adventure => write!(f, "adventure"),
            Self::Spectator => write!(f, "spectator"),
        }
    }
}

// ---------------------------------------------------------------------------
// MoveType
// ---------------------------------------------------------------------------

/// How an actor got from one location to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveType {
    /// Walking, running, swimming or falling.
    Move,
    /// Moving while riding a vehicle or mount.
    Ride,
    /// Teleported by a command, portal or item.
    Teleport,
    /// Respawned after death.
    Respawn,
    /// Got into a vehicle.
    Embark,
    /// Got out of a vehicle.
    Disembark,
    /// Any other movement the host is able to cancel.
    OtherCancellable,
    /// Any other movement the host cannot cancel (e.g. joining the server).
    OtherNonCancellable,
}

impl MoveType {
    /// Whether a veto from the session can actually stop this movement.
    pub const fn is_cancellable(self) -> bool {
        !matches!(self, Self::Respawn | Self::OtherNonCancellable)
    }

    /// Whether the movement was a discontinuous jump rather than travel.
    pub const fn is_teleport(self) -> bool {
        matches!(self, Self::Teleport | Self::Respawn)
    }
}
