//! Working state shared by the allocators: the local capacity pool and the
//! computed result with its per-membership audit fan-out.

use std::collections::BTreeMap;

use tracing::debug;
use voteroll_store::MembershipStore;
use voteroll_types::{Group, GroupId, MeetingId, Membership, MembershipId, VoterWeights};

use crate::RegisterError;

/// Remaining vote capacity per group, read once per invocation and
/// decremented locally. Groups without capacity are not tracked.
#[derive(Clone, Debug, Default)]
pub struct CapacityPool {
    remaining: BTreeMap<GroupId, u32>,
}

impl CapacityPool {
    pub fn new<'a>(groups: impl IntoIterator<Item = &'a Group>) -> Self {
        Self {
            remaining: groups
                .into_iter()
                .filter(|g| g.has_votes())
                .map(|g| (g.id, g.capacity()))
                .collect(),
        }
    }

    pub fn remaining(&self, group: GroupId) -> u32 {
        self.remaining.get(&group).copied().unwrap_or(0)
    }

    pub fn is_exhausted(&self, group: GroupId) -> bool {
        self.remaining(group) == 0
    }

    /// Consume one unit of `group`'s capacity. Returns `false` if none was left.
    pub fn take(&mut self, group: GroupId) -> bool {
        match self.remaining.get_mut(&group) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Result of one allocation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Allocation {
    pub voters: VoterWeights,
    /// Audit value each membership should carry afterwards. Memberships
    /// missing here should carry none.
    pub membership_votes: BTreeMap<MembershipId, u32>,
}

impl Allocation {
    /// Record `weight` more for the user through `membership`.
    pub fn add(&mut self, membership: &Membership, weight: u32) {
        *self.voters.entry(membership.user).or_default() += weight;
        *self.membership_votes.entry(membership.id).or_default() += weight;
    }

    pub fn contains(&self, membership: &Membership) -> bool {
        self.voters.contains_key(&membership.user)
    }

    pub fn total_weight(&self) -> u64 {
        self.voters.values().map(|w| u64::from(*w)).sum()
    }
}

/// Bring every membership's audit `votes` in line with `wanted`.
///
/// Writes go one record at a time and only where the value differs, so each
/// change emits its own store event. Returns the number of writes.
pub fn sync_membership_votes<S: MembershipStore>(
    store: &S,
    meeting: MeetingId,
    wanted: &BTreeMap<MembershipId, u32>,
) -> Result<usize, RegisterError> {
    let mut writes = 0;
    for membership in store.memberships(meeting)? {
        let target = wanted.get(&membership.id).copied();
        if membership.votes != target {
            store.set_membership_votes(membership.id, target)?;
            writes += 1;
        }
    }
    debug!(%meeting, writes, "membership votes synchronised");
    Ok(writes)
}
