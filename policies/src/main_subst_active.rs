//! Main/substitute allocation ordered by presence.
//!
//! Each group with capacity hands out one vote per unit of capacity: first
//! to its present "main" members, then to its present "substitutes", in
//! active-log order. A user is picked at most once meeting-wide.

use std::collections::BTreeSet;

use tracing::debug;
use voteroll_store::EntityStore;
use voteroll_types::{Group, GroupRole, MeetingId, Membership, UserId};

use crate::allocation::{Allocation, CapacityPool};
use crate::roles::{potential_voters, resolve_roles, Presence, MAIN_ROLE_ID, SUBSTITUTE_ROLE_ID};
use crate::{ElectoralRegisterPolicy, RegisterError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MainSubstActivePolicy {
    meeting: MeetingId,
}

impl MainSubstActivePolicy {
    pub const NAME: &'static str = "main_subst_active";

    pub fn new(meeting: MeetingId) -> Self {
        Self { meeting }
    }
}

/// Candidates of one group for one role, in priority order.
fn candidates<'a>(
    memberships: &'a [Membership],
    group: &Group,
    role: &GroupRole,
    eligible: &BTreeSet<UserId>,
    presence: &Presence,
) -> Vec<&'a Membership> {
    let mut found: Vec<&Membership> = memberships
        .iter()
        .filter(|m| m.group == group.id && m.has_role(role.id))
        .filter(|m| eligible.contains(&m.user) && presence.is_present(m.user))
        .collect();
    found.sort_by_key(|m| presence.rank(m.user));
    found
}

impl ElectoralRegisterPolicy for MainSubstActivePolicy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn meeting(&self) -> MeetingId {
        self.meeting
    }

    fn allocate<S: EntityStore>(&self, store: &S) -> Result<Allocation, RegisterError> {
        let meeting = store.get_meeting(self.meeting)?;
        let roles = resolve_roles(store, meeting.id, &[MAIN_ROLE_ID, SUBSTITUTE_ROLE_ID])?;
        let presence = Presence::load(store, &meeting)?;
        let eligible = potential_voters(store, meeting.id)?;
        let groups: Vec<Group> = store
            .groups(meeting.id)?
            .into_iter()
            .filter(Group::has_votes)
            .collect();
        let memberships = store.memberships(meeting.id)?;

        let mut pool = CapacityPool::new(&groups);
        let mut allocation = Allocation::default();
        for role in &roles {
            for group in &groups {
                let mut picked = 0;
                for m in candidates(&memberships, group, role, &eligible, &presence) {
                    if pool.is_exhausted(group.id) {
                        break;
                    }
                    if allocation.contains(m) {
                        continue;
                    }
                    pool.take(group.id);
                    allocation.add(m, 1);
                    picked += 1;
                }
                debug!(
                    group = %group.id,
                    role = %role.role_id,
                    picked,
                    remaining = pool.remaining(group.id),
                    "allocation pass"
                );
            }
        }
        Ok(allocation)
    }

    fn poll_will_have_voters<S: EntityStore>(&self, store: &S) -> Result<bool, RegisterError> {
        let meeting = store.get_meeting(self.meeting)?;
        let roles = resolve_roles(store, meeting.id, &[MAIN_ROLE_ID, SUBSTITUTE_ROLE_ID])?;
        let presence = Presence::load(store, &meeting)?;
        let eligible = potential_voters(store, meeting.id)?;
        let with_votes: BTreeSet<_> = store
            .groups(meeting.id)?
            .into_iter()
            .filter(Group::has_votes)
            .map(|g| g.id)
            .collect();
        Ok(store.memberships(meeting.id)?.iter().any(|m| {
            with_votes.contains(&m.group)
                && roles.iter().any(|r| m.has_role(r.id))
                && eligible.contains(&m.user)
                && presence.is_present(m.user)
        }))
    }
}
