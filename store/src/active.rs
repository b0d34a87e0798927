//! Active-users log storage trait.

use crate::StoreError;
use voteroll_types::{ActiveUser, MeetingId, Timestamp, UserId};

pub trait ActiveUserStore {
    /// The active log of a meeting in insertion order.
    fn active_users(&self, meeting: MeetingId) -> Result<Vec<ActiveUser>, StoreError>;

    /// Append a user to the log. Returns `false` if the user was already
    /// active (the existing entry keeps its position).
    fn mark_active(
        &self,
        meeting: MeetingId,
        user: UserId,
        created: Timestamp,
    ) -> Result<bool, StoreError>;

    /// Remove a user from the log. Returns `false` if the user was not active.
    fn mark_inactive(&self, meeting: MeetingId, user: UserId) -> Result<bool, StoreError>;
}
