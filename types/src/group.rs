//! Groups and group roles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ids::{GroupId, MeetingId, RoleId};
use crate::meeting::MeetingRole;

/// A weighted group of meeting participants.
///
/// `delegate_to` forms a forest: a group points at most at one other group
/// in the same meeting. Cycles and self-delegation are rejected by the host
/// before they reach this model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub meeting: MeetingId,
    /// Stable, human-assigned key (e.g. a municipality code).
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    /// Vote capacity. `None` means the group carries no voting power.
    #[serde(default)]
    pub votes: Option<u32>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub delegate_to: Option<GroupId>,
}

impl Group {
    pub fn new(id: GroupId, meeting: MeetingId, key: impl Into<String>) -> Self {
        Self {
            id,
            meeting,
            key: key.into(),
            title: String::new(),
            votes: None,
            tags: BTreeSet::new(),
            delegate_to: None,
        }
    }

    /// Vote capacity, with a missing value read as zero.
    pub fn capacity(&self) -> u32 {
        self.votes.unwrap_or(0)
    }

    pub fn has_votes(&self) -> bool {
        self.capacity() > 0
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A named role scoped to a meeting, e.g. "main" or "substitute".
///
/// Policies find their roles through `role_id`, a fixed string constant of
/// the policy's dialect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRole {
    pub id: RoleId,
    pub meeting: MeetingId,
    pub role_id: String,
    #[serde(default)]
    pub title: String,
    /// Meeting roles granted to holders while group roles are active.
    #[serde(default)]
    pub grants: BTreeSet<MeetingRole>,
}

impl GroupRole {
    pub fn new(id: RoleId, meeting: MeetingId, role_id: impl Into<String>) -> Self {
        Self {
            id,
            meeting,
            role_id: role_id.into(),
            title: String::new(),
            grants: BTreeSet::new(),
        }
    }

    pub fn granting(mut self, role: MeetingRole) -> Self {
        self.grants.insert(role);
        self
    }

    pub fn grants_potential_voter(&self) -> bool {
        self.grants.contains(&MeetingRole::PotentialVoter)
    }
}
