//! Group memberships and the active-users log.

use serde::{Deserialize, Serialize};

use crate::ids::{GroupId, MeetingId, MembershipId, RoleId, UserId};
use crate::time::Timestamp;

/// A user's membership in a group, optionally with a role.
///
/// `votes` is an audit annotation written by the last allocation (or set
/// explicitly by a delegation leader). Role-priority allocators never read
/// it back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub user: UserId,
    pub group: GroupId,
    #[serde(default)]
    pub role: Option<RoleId>,
    #[serde(default)]
    pub votes: Option<u32>,
}

impl Membership {
    pub fn has_role(&self, role: RoleId) -> bool {
        self.role == Some(role)
    }
}

/// An entry in a meeting's active-users log.
///
/// Presence means "currently active"; the log order (by `created`, then by
/// insertion) is the priority order for role-priority allocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveUser {
    pub meeting: MeetingId,
    pub user: UserId,
    pub created: Timestamp,
}
