//! Electoral register storage trait.

use crate::StoreError;
use voteroll_types::{ElectoralRegister, MeetingId, RegisterId, Timestamp, VoterWeights};

/// Append-only storage for electoral registers.
pub trait RegisterStore {
    /// Persist a new register and record it as the meeting's latest.
    fn create_register(
        &self,
        meeting: MeetingId,
        source: &str,
        created: Timestamp,
        weights: VoterWeights,
    ) -> Result<ElectoralRegister, StoreError>;

    fn get_register(&self, register: RegisterId) -> Result<ElectoralRegister, StoreError>;

    /// The meeting's latest register, if one was ever created.
    fn latest_register(&self, meeting: MeetingId)
        -> Result<Option<ElectoralRegister>, StoreError>;

    /// All registers of a meeting, oldest first.
    fn registers(&self, meeting: MeetingId) -> Result<Vec<ElectoralRegister>, StoreError>;
}
