//! JSON snapshots of a whole meeting.
//!
//! The CLI loads a meeting from a snapshot, runs a policy against it and can
//! write the result (updated audit annotations, new register) back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use voteroll_store::StoreError;
use voteroll_types::{
    ActiveUser, ElectoralRegister, Group, GroupRole, Meeting, MeetingId, MeetingRole, Membership,
    UserId, VoteTransfer,
};

use crate::MemoryStore;

/// Directly assigned meeting roles of one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoles {
    pub user: UserId,
    pub roles: BTreeSet<MeetingRole>,
}

/// Every entity owned by one meeting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSnapshot {
    pub meeting: Meeting,
    #[serde(default)]
    pub group_roles: Vec<GroupRole>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
    #[serde(default)]
    pub meeting_roles: Vec<UserRoles>,
    #[serde(default)]
    pub active_users: Vec<ActiveUser>,
    #[serde(default)]
    pub transfers: Vec<VoteTransfer>,
    #[serde(default)]
    pub registers: Vec<ElectoralRegister>,
}

impl MeetingSnapshot {
    pub fn from_json_str(s: &str) -> Result<Self, StoreError> {
        serde_json::from_str(s).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn read_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Backend(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    pub fn write_file(&self, path: &Path) -> Result<(), StoreError> {
        std::fs::write(path, self.to_json_string()?)
            .map_err(|e| StoreError::Backend(format!("{}: {e}", path.display())))
    }
}

impl MemoryStore {
    /// Load a snapshot into the store, replacing any meeting with the same id.
    ///
    /// References are checked before anything is written: every group, role
    /// and membership must belong to the snapshot's meeting, memberships must
    /// be unique per (group, user), each user appears at most once in the
    /// active log and transfers must form a matching.
    pub fn load_snapshot(&self, snapshot: MeetingSnapshot) -> Result<MeetingId, StoreError> {
        let meeting = snapshot.meeting.id;
        validate(&snapshot)?;

        let mut tables = self.tables();
        tables.reserve_id(meeting.get());
        tables.meetings.insert(meeting, snapshot.meeting);
        for role in snapshot.group_roles {
            tables.reserve_id(role.id.get());
            tables.group_roles.insert(role.id, role);
        }
        for group in snapshot.groups {
            tables.reserve_id(group.id.get());
            tables.groups.insert(group.id, group);
        }
        for membership in snapshot.memberships {
            tables.reserve_id(membership.id.get());
            tables.memberships.insert(membership.id, membership);
        }
        for entry in snapshot.meeting_roles {
            tables
                .meeting_roles
                .entry((meeting, entry.user))
                .or_default()
                .extend(entry.roles);
        }
        tables.active.insert(meeting, snapshot.active_users);
        for vt in snapshot.transfers {
            tables.reserve_id(vt.id.get());
            tables.transfers.insert(vt.id, vt);
        }
        for register in snapshot.registers {
            tables.reserve_id(register.id.get());
            tables.registers.insert(register.id, register);
        }
        Ok(meeting)
    }

    /// Export one meeting and everything it owns.
    pub fn snapshot(&self, meeting: MeetingId) -> Result<MeetingSnapshot, StoreError> {
        let tables = self.tables();
        let record = tables.meeting(meeting)?.clone();
        Ok(MeetingSnapshot {
            meeting: record,
            group_roles: tables
                .group_roles
                .values()
                .filter(|r| r.meeting == meeting)
                .cloned()
                .collect(),
            groups: tables
                .groups
                .values()
                .filter(|g| g.meeting == meeting)
                .cloned()
                .collect(),
            memberships: tables.meeting_memberships(meeting).cloned().collect(),
            meeting_roles: tables
                .meeting_roles
                .iter()
                .filter(|((m, _), roles)| *m == meeting && !roles.is_empty())
                .map(|((_, user), roles)| UserRoles {
                    user: *user,
                    roles: roles.clone(),
                })
                .collect(),
            active_users: tables.active.get(&meeting).cloned().unwrap_or_default(),
            transfers: tables
                .transfers
                .values()
                .filter(|vt| vt.meeting == meeting)
                .cloned()
                .collect(),
            registers: tables
                .registers
                .values()
                .filter(|r| r.meeting == meeting)
                .cloned()
                .collect(),
        })
    }
}

fn validate(snapshot: &MeetingSnapshot) -> Result<(), StoreError> {
    let meeting = snapshot.meeting.id;
    let foreign = |kind: &str, id: &dyn std::fmt::Display| {
        StoreError::Constraint(format!("{kind} {id} does not belong to meeting {meeting}"))
    };

    let role_ids: BTreeSet<_> = snapshot.group_roles.iter().map(|r| r.id).collect();
    if let Some(role) = snapshot.group_roles.iter().find(|r| r.meeting != meeting) {
        return Err(foreign("group role", &role.id));
    }
    let group_ids: BTreeSet<_> = snapshot.groups.iter().map(|g| g.id).collect();
    for group in &snapshot.groups {
        if group.meeting != meeting {
            return Err(foreign("group", &group.id));
        }
        if let Some(target) = group.delegate_to {
            if target == group.id || !group_ids.contains(&target) {
                return Err(StoreError::Constraint(format!(
                    "group {} delegates to invalid group {target}",
                    group.id
                )));
            }
        }
    }

    let mut seen = BTreeSet::new();
    for membership in &snapshot.memberships {
        if !group_ids.contains(&membership.group) {
            return Err(foreign("membership", &membership.id));
        }
        if let Some(role) = membership.role {
            if !role_ids.contains(&role) {
                return Err(StoreError::not_found("group role", role));
            }
        }
        if !seen.insert((membership.group, membership.user)) {
            return Err(StoreError::Duplicate(format!(
                "user {} is listed twice in group {}",
                membership.user, membership.group
            )));
        }
    }

    let mut active = BTreeSet::new();
    for entry in &snapshot.active_users {
        if entry.meeting != meeting {
            return Err(foreign("active user", &entry.user));
        }
        if !active.insert(entry.user) {
            return Err(StoreError::Duplicate(format!(
                "user {} is listed twice in the active log",
                entry.user
            )));
        }
    }

    let mut sources = BTreeSet::new();
    let mut targets = BTreeSet::new();
    for vt in &snapshot.transfers {
        if vt.meeting != meeting {
            return Err(foreign("transfer", &vt.id));
        }
        if vt.source == vt.target || !sources.insert(vt.source) || !targets.insert(vt.target) {
            return Err(StoreError::Constraint(format!(
                "transfer {} breaks the one-source-one-target rule",
                vt.id
            )));
        }
    }
    Ok(())
}
