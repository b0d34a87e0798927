//! The in-memory store and its setup helpers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use voteroll_store::{EventBus, StoreError, StoreEvent};
use voteroll_types::{
    ActiveUser, ElectoralRegister, Group, GroupId, GroupRole, Meeting, MeetingId, MeetingRole,
    Membership, MembershipId, RegisterId, RoleId, TransferId, UserId, VoteTransfer,
};

/// All collections, guarded together so cross-collection reads (effective
/// roles, transfer constraints) see one consistent state.
#[derive(Default)]
pub(crate) struct Tables {
    pub(crate) next_id: u64,
    pub(crate) meetings: BTreeMap<MeetingId, Meeting>,
    pub(crate) meeting_roles: BTreeMap<(MeetingId, UserId), BTreeSet<MeetingRole>>,
    pub(crate) groups: BTreeMap<GroupId, Group>,
    pub(crate) group_roles: BTreeMap<RoleId, GroupRole>,
    pub(crate) memberships: BTreeMap<MembershipId, Membership>,
    pub(crate) active: BTreeMap<MeetingId, Vec<ActiveUser>>,
    pub(crate) transfers: BTreeMap<TransferId, VoteTransfer>,
    pub(crate) registers: BTreeMap<RegisterId, ElectoralRegister>,
}

impl Tables {
    pub(crate) fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Make sure freshly allocated ids never collide with `raw`.
    pub(crate) fn reserve_id(&mut self, raw: u64) {
        self.next_id = self.next_id.max(raw);
    }

    pub(crate) fn meeting(&self, meeting: MeetingId) -> Result<&Meeting, StoreError> {
        self.meetings
            .get(&meeting)
            .ok_or_else(|| StoreError::not_found("meeting", meeting))
    }

    pub(crate) fn group(&self, group: GroupId) -> Result<&Group, StoreError> {
        self.groups
            .get(&group)
            .ok_or_else(|| StoreError::not_found("group", group))
    }

    pub(crate) fn membership(&self, membership: MembershipId) -> Result<&Membership, StoreError> {
        self.memberships
            .get(&membership)
            .ok_or_else(|| StoreError::not_found("membership", membership))
    }

    pub(crate) fn meeting_of_membership(
        &self,
        membership: &Membership,
    ) -> Result<MeetingId, StoreError> {
        Ok(self.group(membership.group)?.meeting)
    }

    pub(crate) fn meeting_memberships(
        &self,
        meeting: MeetingId,
    ) -> impl Iterator<Item = &Membership> + '_ {
        self.memberships.values().filter(move |m| {
            self.groups
                .get(&m.group)
                .is_some_and(|g| g.meeting == meeting)
        })
    }

    pub(crate) fn effective_roles(
        &self,
        meeting: MeetingId,
        user: UserId,
    ) -> BTreeSet<MeetingRole> {
        let mut roles = self
            .meeting_roles
            .get(&(meeting, user))
            .cloned()
            .unwrap_or_default();
        let grants_active = self
            .meetings
            .get(&meeting)
            .is_some_and(|m| m.group_roles_active);
        if grants_active {
            for membership in self.meeting_memberships(meeting).filter(|m| m.user == user) {
                if let Some(role) = membership.role.and_then(|r| self.group_roles.get(&r)) {
                    roles.extend(role.grants.iter().copied());
                }
            }
        }
        roles
    }

    /// Enforce the transfer matching constraint, ignoring `except`.
    pub(crate) fn check_transfer_slots(
        &self,
        meeting: MeetingId,
        source: UserId,
        target: UserId,
        except: Option<TransferId>,
    ) -> Result<(), StoreError> {
        if source == target {
            return Err(StoreError::Constraint(format!(
                "user {source} cannot transfer to themselves"
            )));
        }
        for vt in self
            .transfers
            .values()
            .filter(|vt| vt.meeting == meeting && Some(vt.id) != except)
        {
            if vt.source == source {
                return Err(StoreError::Constraint(format!(
                    "user {source} is already source of transfer {}",
                    vt.id
                )));
            }
            if vt.target == target {
                return Err(StoreError::Constraint(format!(
                    "user {target} is already target of transfer {}",
                    vt.id
                )));
            }
        }
        Ok(())
    }
}

/// Thread-safe in-memory implementation of every store trait.
///
/// Used by the CLI (loaded from a JSON snapshot) and throughout the tests.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    events: RwLock<EventBus>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            events: RwLock::new(EventBus::new()),
        }
    }

    /// Register a listener for every subsequent write.
    pub fn subscribe(&self, listener: Box<dyn Fn(&StoreEvent) + Send + Sync>) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribe(listener);
    }

    pub(crate) fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit after the table lock has been released.
    pub(crate) fn emit(&self, event: StoreEvent) {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .emit(&event);
    }

    // ── Setup helpers (host configuration / import) ────────────────────

    pub fn create_meeting(&self, title: &str) -> Meeting {
        let mut tables = self.tables();
        let meeting = Meeting::new(MeetingId::new(tables.allocate_id()), title);
        tables.meetings.insert(meeting.id, meeting.clone());
        meeting
    }

    pub fn create_group(
        &self,
        meeting: MeetingId,
        key: &str,
        votes: Option<u32>,
    ) -> Result<Group, StoreError> {
        let mut tables = self.tables();
        tables.meeting(meeting)?;
        if tables
            .groups
            .values()
            .any(|g| g.meeting == meeting && !key.is_empty() && g.key == key)
        {
            return Err(StoreError::Duplicate(format!("group key {key}")));
        }
        let mut group = Group::new(GroupId::new(tables.allocate_id()), meeting, key);
        group.votes = votes;
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    pub fn create_group_role(
        &self,
        meeting: MeetingId,
        role_id: &str,
        grants: &[MeetingRole],
    ) -> Result<GroupRole, StoreError> {
        let mut tables = self.tables();
        tables.meeting(meeting)?;
        let mut role = GroupRole::new(RoleId::new(tables.allocate_id()), meeting, role_id);
        role.grants.extend(grants.iter().copied());
        tables.group_roles.insert(role.id, role.clone());
        Ok(role)
    }

    /// Find a group by its key within a meeting.
    pub fn group_by_key(&self, meeting: MeetingId, key: &str) -> Option<Group> {
        self.tables()
            .groups
            .values()
            .find(|g| g.meeting == meeting && g.key == key)
            .cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
