//! In-memory implementation of GroupStore.

use voteroll_store::{GroupStore, StoreError};
use voteroll_types::{Group, GroupId, GroupRole, MeetingId, RoleId};

use crate::MemoryStore;

impl GroupStore for MemoryStore {
    fn groups(&self, meeting: MeetingId) -> Result<Vec<Group>, StoreError> {
        let tables = self.tables();
        tables.meeting(meeting)?;
        Ok(tables
            .groups
            .values()
            .filter(|g| g.meeting == meeting)
            .cloned()
            .collect())
    }

    fn get_group(&self, group: GroupId) -> Result<Group, StoreError> {
        self.tables().group(group).cloned()
    }

    fn put_group(&self, group: &Group) -> Result<(), StoreError> {
        let mut tables = self.tables();
        tables.meeting(group.meeting)?;
        if group.delegate_to == Some(group.id) {
            return Err(StoreError::Constraint(format!(
                "group {} cannot delegate to itself",
                group.id
            )));
        }
        tables.reserve_id(group.id.get());
        tables.groups.insert(group.id, group.clone());
        Ok(())
    }

    fn group_roles(&self, meeting: MeetingId) -> Result<Vec<GroupRole>, StoreError> {
        let tables = self.tables();
        tables.meeting(meeting)?;
        Ok(tables
            .group_roles
            .values()
            .filter(|r| r.meeting == meeting)
            .cloned()
            .collect())
    }

    fn get_group_role(&self, role: RoleId) -> Result<GroupRole, StoreError> {
        self.tables()
            .group_roles
            .get(&role)
            .cloned()
            .ok_or_else(|| StoreError::not_found("group role", role))
    }

    fn put_group_role(&self, role: &GroupRole) -> Result<(), StoreError> {
        let mut tables = self.tables();
        tables.meeting(role.meeting)?;
        tables.reserve_id(role.id.get());
        tables.group_roles.insert(role.id, role.clone());
        Ok(())
    }
}
