//! Whoever a query or a permission check is made on behalf of.

use serde::{Deserialize, Serialize};
use warden_types::{ActorId, Association};

use crate::region::Region;

/// The party a flag query or permission check is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    /// A connected actor and the permission groups it belongs to.
    Actor {
        /// The actor's stable id.
        id: ActorId,
        /// Lowercase group names, matched against region domains.
        groups: Vec<String>,
    },
    /// The server console, a plugin, or the environment.
    Console,
}

impl Subject {
    /// An actor with no groups.
    pub const fn actor(id: ActorId) -> Self {
        Self::Actor {
            id,
            groups: Vec::new(),
        }
    }

    /// The actor id, if the subject is an actor.
    pub const fn actor_id(&self) -> Option<ActorId> {
        match self {
            Self::Actor { id, .. } => Some(*id),
            Self::Console => None,
        }
    }

    /// The subject's relation to one region.
    ///
    /// Owners and members of a parent count as owners and members of the
    /// child. Non-actor subjects are always non-members.
    pub fn association(&self, region: &Region) -> Association {
        match self {
            Self::Actor { id, groups } => {
                if region.is_owner(*id, groups) {
                    Association::Owner
                } else if region.is_member(*id, groups) {
                    Association::Member
                } else {
                    Association::NonMember
                }
            }
            Self::Console => Association::NonMember,
        }
    }
}
