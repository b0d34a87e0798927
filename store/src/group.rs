//! Group and group-role storage trait.

use crate::StoreError;
use voteroll_types::{Group, GroupId, GroupRole, MeetingId, RoleId};

pub trait GroupStore {
    /// All groups of a meeting, ordered by id.
    fn groups(&self, meeting: MeetingId) -> Result<Vec<Group>, StoreError>;

    fn get_group(&self, group: GroupId) -> Result<Group, StoreError>;

    /// Insert or replace a group.
    fn put_group(&self, group: &Group) -> Result<(), StoreError>;

    /// All group roles of a meeting, ordered by id.
    fn group_roles(&self, meeting: MeetingId) -> Result<Vec<GroupRole>, StoreError>;

    fn get_group_role(&self, role: RoleId) -> Result<GroupRole, StoreError>;

    /// Insert or replace a group role.
    fn put_group_role(&self, role: &GroupRole) -> Result<(), StoreError>;
}
