//! Explicit group weights set before a poll starts.
//!
//! Membership `votes` are the source of truth here: a delegation leader (or
//! moderator) distributes each group's capacity among its members ahead of
//! the poll, and the register simply collects those numbers.

use std::collections::{BTreeMap, BTreeSet};

use voteroll_store::EntityStore;
use voteroll_types::{Group, GroupId, MeetingId, Membership, UserId};

use crate::allocation::Allocation;
use crate::roles::potential_voters;
use crate::{ElectoralRegisterPolicy, RegisterError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupVotesBeforePoll {
    meeting: MeetingId,
}

impl GroupVotesBeforePoll {
    pub const NAME: &'static str = "gv_auto_before_p";

    pub fn new(meeting: MeetingId) -> Self {
        Self { meeting }
    }

    fn weighted<'a>(
        memberships: &'a [Membership],
        groups: &BTreeMap<GroupId, Group>,
        eligible: &'a BTreeSet<UserId>,
    ) -> impl Iterator<Item = (&'a Membership, u32)> + 'a {
        let with_votes: BTreeSet<GroupId> = groups
            .values()
            .filter(|g| g.has_votes())
            .map(|g| g.id)
            .collect();
        memberships.iter().filter_map(move |m| match m.votes {
            Some(w) if w > 0 && with_votes.contains(&m.group) && eligible.contains(&m.user) => {
                Some((m, w))
            }
            _ => None,
        })
    }
}

impl ElectoralRegisterPolicy for GroupVotesBeforePoll {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn meeting(&self) -> MeetingId {
        self.meeting
    }

    fn annotates_memberships(&self) -> bool {
        false
    }

    fn allocate<S: EntityStore>(&self, store: &S) -> Result<Allocation, RegisterError> {
        let groups: BTreeMap<GroupId, Group> = store
            .groups(self.meeting)?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();
        let eligible = potential_voters(store, self.meeting)?;
        let memberships = store.memberships(self.meeting)?;

        let mut allocation = Allocation::default();
        let mut per_group: BTreeMap<GroupId, u32> = BTreeMap::new();
        for (m, weight) in Self::weighted(&memberships, &groups, &eligible) {
            let used = per_group.entry(m.group).or_insert(0);
            *used = used.saturating_add(weight);
            allocation.add(m, weight);
        }
        for (group, used) in per_group {
            let capacity = groups.get(&group).map(Group::capacity).unwrap_or(0);
            if used > capacity {
                return Err(RegisterError::Consistency(format!(
                    "group {group} hands out {used} votes but has {capacity}"
                )));
            }
        }
        Ok(allocation)
    }

    fn poll_will_have_voters<S: EntityStore>(&self, store: &S) -> Result<bool, RegisterError> {
        let groups: BTreeMap<GroupId, Group> = store
            .groups(self.meeting)?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();
        let eligible = potential_voters(store, self.meeting)?;
        let memberships = store.memberships(self.meeting)?;
        let found = Self::weighted(&memberships, &groups, &eligible).next().is_some();
        Ok(found)
    }
}
