//! In-memory implementation of MembershipStore.

use voteroll_store::{MembershipStore, StoreError, StoreEvent};
use voteroll_types::{GroupId, MeetingId, Membership, MembershipId, RoleId, UserId};

use crate::MemoryStore;

impl MembershipStore for MemoryStore {
    fn memberships(&self, meeting: MeetingId) -> Result<Vec<Membership>, StoreError> {
        let tables = self.tables();
        tables.meeting(meeting)?;
        Ok(tables.meeting_memberships(meeting).cloned().collect())
    }

    fn group_memberships(&self, group: GroupId) -> Result<Vec<Membership>, StoreError> {
        let tables = self.tables();
        tables.group(group)?;
        Ok(tables
            .memberships
            .values()
            .filter(|m| m.group == group)
            .cloned()
            .collect())
    }

    fn get_membership(&self, membership: MembershipId) -> Result<Membership, StoreError> {
        self.tables().membership(membership).cloned()
    }

    fn find_membership(
        &self,
        group: GroupId,
        user: UserId,
    ) -> Result<Option<Membership>, StoreError> {
        Ok(self
            .tables()
            .memberships
            .values()
            .find(|m| m.group == group && m.user == user)
            .cloned())
    }

    fn add_membership(
        &self,
        group: GroupId,
        user: UserId,
        role: Option<RoleId>,
    ) -> Result<Membership, StoreError> {
        let (membership, meeting) = {
            let mut tables = self.tables();
            let meeting = tables.group(group)?.meeting;
            if tables
                .memberships
                .values()
                .any(|m| m.group == group && m.user == user)
            {
                return Err(StoreError::Duplicate(format!(
                    "user {user} is already a member of group {group}"
                )));
            }
            if let Some(role) = role {
                if !tables.group_roles.contains_key(&role) {
                    return Err(StoreError::not_found("group role", role));
                }
            }
            let membership = Membership {
                id: MembershipId::new(tables.allocate_id()),
                user,
                group,
                role,
                votes: None,
            };
            tables.memberships.insert(membership.id, membership.clone());
            (membership, meeting)
        };
        self.emit(StoreEvent::MembershipAdded {
            meeting,
            membership: membership.id,
            user,
            group,
        });
        Ok(membership)
    }

    fn remove_membership(&self, membership: MembershipId) -> Result<Membership, StoreError> {
        let (removed, meeting) = {
            let mut tables = self.tables();
            let meeting = tables.meeting_of_membership(tables.membership(membership)?)?;
            let removed = tables
                .memberships
                .remove(&membership)
                .ok_or_else(|| StoreError::not_found("membership", membership))?;
            (removed, meeting)
        };
        self.emit(StoreEvent::MembershipRemoved {
            meeting,
            membership,
            user: removed.user,
            group: removed.group,
        });
        Ok(removed)
    }

    fn set_membership_role(
        &self,
        membership: MembershipId,
        role: Option<RoleId>,
    ) -> Result<Membership, StoreError> {
        let (previous, meeting) = {
            let mut tables = self.tables();
            if let Some(role) = role {
                if !tables.group_roles.contains_key(&role) {
                    return Err(StoreError::not_found("group role", role));
                }
            }
            let meeting = tables.meeting_of_membership(tables.membership(membership)?)?;
            let record = tables
                .memberships
                .get_mut(&membership)
                .ok_or_else(|| StoreError::not_found("membership", membership))?;
            let previous = record.clone();
            record.role = role;
            (previous, meeting)
        };
        self.emit(StoreEvent::MembershipRoleChanged {
            meeting,
            membership,
            user: previous.user,
            group: previous.group,
            old: previous.role,
            new: role,
        });
        Ok(previous)
    }

    fn set_membership_votes(
        &self,
        membership: MembershipId,
        votes: Option<u32>,
    ) -> Result<Membership, StoreError> {
        let (previous, meeting) = {
            let mut tables = self.tables();
            let meeting = tables.meeting_of_membership(tables.membership(membership)?)?;
            let record = tables
                .memberships
                .get_mut(&membership)
                .ok_or_else(|| StoreError::not_found("membership", membership))?;
            let previous = record.clone();
            record.votes = votes;
            (previous, meeting)
        };
        self.emit(StoreEvent::MembershipVotesChanged {
            meeting,
            membership,
            user: previous.user,
            group: previous.group,
            old: previous.votes,
            new: votes,
        });
        Ok(previous)
    }
}
