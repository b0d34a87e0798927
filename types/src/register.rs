//! Vote transfers, electoral registers and cast votes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::{MeetingId, RegisterId, TransferId, UserId};
use crate::time::Timestamp;

/// Voter → weight mapping produced by an allocation policy.
pub type VoterWeights = BTreeMap<UserId, u32>;

/// A directed delegation edge: `source`'s vote power flows to `target`.
///
/// Meeting-wide, a user is source of at most one transfer and target of at
/// most one transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTransfer {
    pub id: TransferId,
    pub meeting: MeetingId,
    pub source: UserId,
    pub target: UserId,
}

impl VoteTransfer {
    pub fn involves(&self, user: UserId) -> bool {
        self.source == user || self.target == user
    }
}

/// Immutable snapshot of who may vote and with what weight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectoralRegister {
    pub id: RegisterId,
    pub meeting: MeetingId,
    /// Name of the policy that produced the snapshot.
    pub source: String,
    pub created: Timestamp,
    pub weight_dict: VoterWeights,
}

impl ElectoralRegister {
    pub fn weight(&self, user: UserId) -> Option<u32> {
        self.weight_dict.get(&user).copied()
    }

    /// Sum of all weights in the register.
    pub fn total_weight(&self) -> u64 {
        self.weight_dict.values().map(|w| u64::from(*w)).sum()
    }

    pub fn voter_count(&self) -> usize {
        self.weight_dict.len()
    }
}

/// A vote as recorded by the poll subsystem, reduced to what reporting needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVote {
    pub user: UserId,
    /// Opaque, comparable representation of the ballot content.
    pub vote_data: String,
    #[serde(default)]
    pub abstain: bool,
}
