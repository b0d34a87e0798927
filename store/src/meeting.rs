//! Meeting storage trait.

use crate::StoreError;
use std::collections::BTreeSet;
use voteroll_types::{Meeting, MeetingId, MeetingRole, UserId};

/// Storage for meetings and meeting-level role assignments.
pub trait MeetingStore {
    /// Get a meeting by id.
    fn get_meeting(&self, meeting: MeetingId) -> Result<Meeting, StoreError>;

    /// Insert or replace a meeting.
    fn put_meeting(&self, meeting: &Meeting) -> Result<(), StoreError>;

    /// Assign meeting roles directly to a user (idempotent).
    fn assign_meeting_roles(
        &self,
        meeting: MeetingId,
        user: UserId,
        roles: &[MeetingRole],
    ) -> Result<(), StoreError>;

    /// Remove directly assigned meeting roles from a user.
    fn revoke_meeting_roles(
        &self,
        meeting: MeetingId,
        user: UserId,
        roles: &[MeetingRole],
    ) -> Result<(), StoreError>;

    /// Effective meeting roles of a user: direct assignments plus roles
    /// granted by the user's group roles while the meeting has group roles
    /// active.
    fn meeting_roles(
        &self,
        meeting: MeetingId,
        user: UserId,
    ) -> Result<BTreeSet<MeetingRole>, StoreError>;

    /// All users whose effective roles contain `role`.
    fn users_with_role(
        &self,
        meeting: MeetingId,
        role: MeetingRole,
    ) -> Result<BTreeSet<UserId>, StoreError>;
}
