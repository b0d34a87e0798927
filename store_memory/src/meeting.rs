//! In-memory implementation of MeetingStore.

use std::collections::BTreeSet;

use voteroll_store::{MeetingStore, StoreError};
use voteroll_types::{Meeting, MeetingId, MeetingRole, UserId};

use crate::MemoryStore;

impl MeetingStore for MemoryStore {
    fn get_meeting(&self, meeting: MeetingId) -> Result<Meeting, StoreError> {
        self.tables().meeting(meeting).cloned()
    }

    fn put_meeting(&self, meeting: &Meeting) -> Result<(), StoreError> {
        let mut tables = self.tables();
        tables.reserve_id(meeting.id.get());
        tables.meetings.insert(meeting.id, meeting.clone());
        Ok(())
    }

    fn assign_meeting_roles(
        &self,
        meeting: MeetingId,
        user: UserId,
        roles: &[MeetingRole],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables();
        tables.meeting(meeting)?;
        tables
            .meeting_roles
            .entry((meeting, user))
            .or_default()
            .extend(roles.iter().copied());
        Ok(())
    }

    fn revoke_meeting_roles(
        &self,
        meeting: MeetingId,
        user: UserId,
        roles: &[MeetingRole],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables();
        tables.meeting(meeting)?;
        if let Some(assigned) = tables.meeting_roles.get_mut(&(meeting, user)) {
            for role in roles {
                assigned.remove(role);
            }
        }
        Ok(())
    }

    fn meeting_roles(
        &self,
        meeting: MeetingId,
        user: UserId,
    ) -> Result<BTreeSet<MeetingRole>, StoreError> {
        let tables = self.tables();
        tables.meeting(meeting)?;
        Ok(tables.effective_roles(meeting, user))
    }

    fn users_with_role(
        &self,
        meeting: MeetingId,
        role: MeetingRole,
    ) -> Result<BTreeSet<UserId>, StoreError> {
        let tables = self.tables();
        tables.meeting(meeting)?;
        let candidates: BTreeSet<UserId> = tables
            .meeting_roles
            .keys()
            .filter(|(m, _)| *m == meeting)
            .map(|(_, user)| *user)
            .chain(tables.meeting_memberships(meeting).map(|m| m.user))
            .collect();
        Ok(candidates
            .into_iter()
            .filter(|user| tables.effective_roles(meeting, *user).contains(&role))
            .collect())
    }
}
