//! Region permission model.
//!
//! Answers "may this subject do X to this region" by composing permission
//! strings and asking the external [`Authorizer`]. Region-scoped checks use
//! a three-tier fallback depending on the subject's relation to the region:
//!
//! | Relation | Permission strings checked |
//! |---|---|
//! | owner | `warden.region.<action>.own.<id>` or `warden.region.<action>.member.<id>` |
//! | member | `warden.region.<action>.member.<id>` |
//! | neither | `warden.region.<action>.<id>` |
//!
//! Non-actor subjects always pass. If the authorizer fails, the check is
//! denied.

use std::sync::Arc;

use tracing::warn;
use warden_types::{ActorId, Flag};

use crate::error::AuthorizationError;
use crate::region::Region;
use crate::subject::Subject;

/// Prefix of every permission string.
pub const PERMISSION_PREFIX: &str = "warden";

/// The external authorization service.
pub trait Authorizer: Send + Sync {
    /// Whether `actor` holds `permission`.
    fn has_permission(&self, actor: ActorId, permission: &str) -> Result<bool, AuthorizationError>;
}

/// The bypass permission for a world.
pub fn bypass_permission(world: &str) -> String {
    format!("{PERMISSION_PREFIX}.region.bypass.{}", world.to_ascii_lowercase())
}

/// Ask the authorizer, denying on failure.
pub fn check_permission(authorizer: &dyn Authorizer, actor: ActorId, permission: &str) -> bool {
    match authorizer.has_permission(actor, permission) {
        Ok(granted) => granted,
        Err(error) => {
            warn!(%actor, permission, %error, "authorization failed, denying");
            false
        }
    }
}

/// Permission checks for one subject.
#[derive(Clone)]
pub struct RegionPermissionModel {
    authorizer: Arc<dyn Authorizer>,
    subject: Subject,
}

impl core::fmt::Debug for RegionPermissionModel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegionPermissionModel")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl RegionPermissionModel {
    /// Create a model for `subject`.
    pub fn new(authorizer: Arc<dyn Authorizer>, subject: Subject) -> Self {
        Self {
            authorizer,
            subject,
        }
    }

    /// The subject being checked.
    pub const fn subject(&self) -> &Subject {
        &self.subject
    }

    // -----------------------------------------------------------------------
    // Core checks
    // -----------------------------------------------------------------------

    /// Check a plain permission (`warden.<perm>`).
    pub fn has_plugin_permission(&self, perm: &str) -> bool {
        match &self.subject {
            Subject::Console => true,
            Subject::Actor { id, .. } => check_permission(
                self.authorizer.as_ref(),
                *id,
                &format!("{PERMISSION_PREFIX}.{perm}"),
            ),
        }
    }

    /// Check a region-scoped action with the own > member > none fallback.
    pub fn has_pattern_permission(&self, action: &str, region: &Region) -> bool {
        let Subject::Actor { id, groups } = &self.subject else {
            return true;
        };
        let region_id = region.id();

        if region.is_owner(*id, groups) {
            self.has_plugin_permission(&format!("region.{action}.own.{region_id}"))
                || self.has_plugin_permission(&format!("region.{action}.member.{region_id}"))
        } else if region.is_member(*id, groups) {
            self.has_plugin_permission(&format!("region.{action}.member.{region_id}"))
        } else {
            self.has_plugin_permission(&format!("region.{action}.{region_id}"))
        }
    }

    // -----------------------------------------------------------------------
    // Administrative
    // -----------------------------------------------------------------------

    /// Whether the subject ignores region protection in `world`.
    pub fn may_ignore_region_protection(&self, world: &str) -> bool {
        self.has_plugin_permission(&format!("region.bypass.{}", world.to_ascii_lowercase()))
    }

    /// Whether the subject may force a reload of region data.
    pub fn may_force_load_regions(&self) -> bool {
        self.has_plugin_permission("region.load")
    }

    /// Whether the subject may force region data to be saved.
    pub fn may_force_save_regions(&self) -> bool {
        self.has_plugin_permission("region.save")
    }

    /// Whether the subject may define new regions.
    pub fn may_define(&self) -> bool {
        self.has_plugin_permission("region.define")
    }

    /// Whether the subject may claim regions for itself.
    pub fn may_claim(&self) -> bool {
        self.has_plugin_permission("region.claim")
    }

    /// Whether the subject may claim without count or size limits.
    pub fn may_claim_regions_unbounded(&self) -> bool {
        self.has_plugin_permission("region.unlimited")
    }

    /// Whether the subject may list regions.
    ///
    /// Listing one's own regions needs only `region.list.own`.
    pub fn may_list_regions(&self, owner: Option<ActorId>) -> bool {
        match (owner, self.subject.actor_id()) {
            (Some(target), Some(me)) if target == me => {
                self.has_plugin_permission("region.list.own") || self.has_plugin_permission("region.list")
            }
            _ => self.has_plugin_permission("region.list"),
        }
    }

    // -----------------------------------------------------------------------
    // Region-scoped
    // -----------------------------------------------------------------------

    /// Whether the subject may change the region's geometry.
    pub fn may_redefine(&self, region: &Region) -> bool {
        self.has_pattern_permission("redefine", region)
    }

    /// Whether the subject may delete the region.
    pub fn may_delete(&self, region: &Region) -> bool {
        self.has_pattern_permission("remove", region)
    }

    /// Whether the subject may change the region's priority.
    pub fn may_set_priority(&self, region: &Region) -> bool {
        self.has_pattern_permission("setpriority", region)
    }

    /// Whether the subject may set `child`'s parent to `parent` (or clear it).
    pub fn may_set_parent(&self, child: &Region, parent: Option<&Region>) -> bool {
        self.has_pattern_permission("setparent", child)
            && parent.is_none_or(|p| self.has_pattern_permission("setparent", p))
    }

    /// Whether the subject may select the region's geometry.
    pub fn may_select(&self, region: &Region) -> bool {
        self.has_pattern_permission("select", region)
    }

    /// Whether the subject may look up information about the region.
    pub fn may_lookup(&self, region: &Region) -> bool {
        self.has_pattern_permission("info", region)
    }

    /// Whether the subject may teleport to the region.
    pub fn may_teleport_to(&self, region: &Region) -> bool {
        self.has_pattern_permission("teleport", region)
    }

    /// Whether the subject may change any flag on the region.
    pub fn may_set_flag(&self, region: &Region) -> bool {
        self.has_pattern_permission("flag.regions", region)
    }

    /// Whether the subject may change `flag` on the region.
    pub fn may_set_flag_named(&self, region: &Region, flag: &Flag) -> bool {
        self.has_pattern_permission(&format!("flag.flags.{}", flag.name()), region)
    }

    /// Whether the subject may set `flag` to `value` on the region.
    ///
    /// The value is reduced to at most 20 lowercase alphanumerics; `None`
    /// checks the permission to unset the flag.
    pub fn may_set_flag_value(&self, region: &Region, flag: &Flag, value: Option<&str>) -> bool {
        let sanitized = value.map_or_else(
            || String::from("unset"),
            |v| {
                v.trim()
                    .to_ascii_lowercase()
                    .chars()
                    .filter(char::is_ascii_alphanumeric)
                    .take(20)
                    .collect()
            },
        );
        self.has_pattern_permission(&format!("flag.flags.{}.{sanitized}", flag.name()), region)
    }

    /// Whether the subject may add members.
    pub fn may_add_members(&self, region: &Region) -> bool {
        self.has_pattern_permission("addmember", region)
    }

    /// Whether the subject may add owners.
    pub fn may_add_owners(&self, region: &Region) -> bool {
        self.has_pattern_permission("addowner", region)
    }

    /// Whether the subject may remove members.
    pub fn may_remove_members(&self, region: &Region) -> bool {
        self.has_pattern_permission("removemember", region)
    }

    /// Whether the subject may remove owners.
    pub fn may_remove_owners(&self, region: &Region) -> bool {
        self.has_pattern_permission("removeowner", region)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use warden_types::flags;

    use super::*;
    use crate::shape::Shape;

    /// Grants a fixed set of permission strings and records every query.
    #[derive(Default)]
    struct FixedAuthorizer {
        granted: HashSet<String>,
        asked: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FixedAuthorizer {
        fn granting(perms: &[&str]) -> Self {
            Self {
                granted: perms.iter().map(|p| (*p).to_owned()).collect(),
                ..Self::default()
            }
        }
    }

    impl Authorizer for FixedAuthorizer {
        fn has_permission(&self, _actor: ActorId, permission: &str) -> Result<bool, AuthorizationError> {
            if let Ok(mut asked) = self.asked.lock() {
                asked.push(permission.to_owned());
            }
            if self.fail {
                return Err(AuthorizationError::Unavailable(String::from("down")));
            }
            Ok(self.granted.contains(permission))
        }
    }

    fn region_with(owner: Option<ActorId>, member: Option<ActorId>) -> Region {
        let mut region = Region::new("Plot", Shape::Global).unwrap_or_else(|_| Region::global());
        if let Some(o) = owner {
            region.owners_mut().add_player(o);
        }
        if let Some(m) = member {
            region.members_mut().add_player(m);
        }
        region
    }

    fn model(auth: FixedAuthorizer, actor: ActorId) -> RegionPermissionModel {
        RegionPermissionModel::new(Arc::new(auth), Subject::actor(actor))
    }

    #[test]
    fn owner_passes_with_member_scope() {
        let actor = ActorId::new();
        let region = region_with(Some(actor), None);
        let m = model(FixedAuthorizer::granting(&["warden.region.remove.member.plot"]), actor);
        assert!(m.may_delete(&region));
    }

    #[test]
    fn member_is_not_granted_by_own_scope() {
        let actor = ActorId::new();
        let region = region_with(None, Some(actor));
        let m = model(FixedAuthorizer::granting(&["warden.region.remove.own.plot"]), actor);
        assert!(!m.may_delete(&region));
    }

    #[test]
    fn stranger_needs_unscoped_permission() {
        let actor = ActorId::new();
        let region = region_with(None, None);
        let scoped = model(FixedAuthorizer::granting(&["warden.region.remove.member.plot"]), actor);
        assert!(!scoped.may_delete(&region));
        let plain = model(FixedAuthorizer::granting(&["warden.region.remove.plot"]), actor);
        assert!(plain.may_delete(&region));
    }

    #[test]
    fn console_always_passes() {
        let auth: Arc<dyn Authorizer> = Arc::new(FixedAuthorizer::default());
        let m = RegionPermissionModel::new(auth, Subject::Console);
        assert!(m.may_delete(&region_with(None, None)));
        assert!(m.may_ignore_region_protection("world"));
    }

    #[test]
    fn authorizer_failure_denies() {
        let actor = ActorId::new();
        let auth = FixedAuthorizer {
            fail: true,
            ..FixedAuthorizer::granting(&["warden.region.bypass.world"])
        };
        assert!(!model(auth, actor).may_ignore_region_protection("world"));
    }

    #[test]
    fn flag_value_permission_is_sanitized() {
        let actor = ActorId::new();
        let region = region_with(None, None);
        let auth = Arc::new(FixedAuthorizer::granting(&["warden.region.flag.flags.greeting.helloworld"]));
        let m = RegionPermissionModel::new(Arc::clone(&auth) as Arc<dyn Authorizer>, Subject::actor(actor));
        assert!(m.may_set_flag_value(&region, &flags::GREET_MESSAGE, Some(" Hello, World! ")));
        assert!(!m.may_set_flag_value(&region, &flags::GREET_MESSAGE, None));
        let asked = auth.asked.lock().map(|a| a.clone()).unwrap_or_default();
        assert!(asked.contains(&String::from("warden.region.flag.flags.greeting.unset")));
    }

    #[test]
    fn set_parent_checks_both_regions() {
        let actor = ActorId::new();
        let child = region_with(None, None);
        let mut parent = Region::new("Town", Shape::Global).unwrap_or_else(|_| Region::global());
        parent.set_priority(1);
        let m = model(FixedAuthorizer::granting(&["warden.region.setparent.plot"]), actor);
        assert!(m.may_set_parent(&child, None));
        assert!(!m.may_set_parent(&child, Some(&parent)));
    }

    #[test]
    fn listing_own_regions_needs_only_own_permission() {
        let actor = ActorId::new();
        let m = model(FixedAuthorizer::granting(&["warden.region.list.own"]), actor);
        assert!(m.may_list_regions(Some(actor)));
        assert!(!m.may_list_regions(None));
    }

    #[test]
    fn bypass_permission_is_lowercased() {
        assert_eq!(bypass_permission("World_Nether"), "warden.region.bypass.world_nether");
    }
}
