//! Membership storage trait.

use crate::StoreError;
use voteroll_types::{GroupId, MeetingId, Membership, MembershipId, RoleId, UserId};

/// Storage for group memberships.
///
/// Writes are always per record; each one emits its own change event.
pub trait MembershipStore {
    /// All memberships in a meeting, ordered by id.
    fn memberships(&self, meeting: MeetingId) -> Result<Vec<Membership>, StoreError>;

    /// Memberships of one group, ordered by id.
    fn group_memberships(&self, group: GroupId) -> Result<Vec<Membership>, StoreError>;

    fn get_membership(&self, membership: MembershipId) -> Result<Membership, StoreError>;

    /// The membership of `user` in `group`, if any.
    fn find_membership(
        &self,
        group: GroupId,
        user: UserId,
    ) -> Result<Option<Membership>, StoreError>;

    /// Add a user to a group. Fails with `Duplicate` if already a member.
    fn add_membership(
        &self,
        group: GroupId,
        user: UserId,
        role: Option<RoleId>,
    ) -> Result<Membership, StoreError>;

    /// Remove a membership, returning the removed record.
    fn remove_membership(&self, membership: MembershipId) -> Result<Membership, StoreError>;

    /// Change a membership's role, returning the record as it was before.
    fn set_membership_role(
        &self,
        membership: MembershipId,
        role: Option<RoleId>,
    ) -> Result<Membership, StoreError>;

    /// Change a membership's `votes` annotation, returning the record as it
    /// was before.
    fn set_membership_votes(
        &self,
        membership: MembershipId,
        votes: Option<u32>,
    ) -> Result<Membership, StoreError>;
}
