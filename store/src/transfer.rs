//! Vote-transfer storage trait.

use crate::StoreError;
use voteroll_types::{MeetingId, TransferId, UserId, VoteTransfer};

/// Storage for vote transfers.
///
/// Implementations must refuse writes that would make a user source of two
/// transfers or target of two transfers (`StoreError::Constraint`).
pub trait VoteTransferStore {
    /// All transfers of a meeting, ordered by id.
    fn transfers(&self, meeting: MeetingId) -> Result<Vec<VoteTransfer>, StoreError>;

    fn get_transfer(&self, transfer: TransferId) -> Result<VoteTransfer, StoreError>;

    fn create_transfer(
        &self,
        meeting: MeetingId,
        source: UserId,
        target: UserId,
    ) -> Result<VoteTransfer, StoreError>;

    fn update_transfer(
        &self,
        transfer: TransferId,
        source: UserId,
        target: UserId,
    ) -> Result<VoteTransfer, StoreError>;

    /// Delete a transfer, returning the removed record.
    fn delete_transfer(&self, transfer: TransferId) -> Result<VoteTransfer, StoreError>;
}
