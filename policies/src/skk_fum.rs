//! Three-tier allocation: delegates with proxy, delegates, substitutes.
//!
//! Delegates can absorb a second vote before any substitute gets a first
//! one. No user ends up with more than two votes.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;
use voteroll_store::EntityStore;
use voteroll_types::{Group, MeetingId, Membership, RoleId, UserId};

use crate::allocation::{Allocation, CapacityPool};
use crate::roles::{
    potential_voters, resolve_roles, Presence, DELEGATE_ROLE_ID, PROXY_DELEGATE_ROLE_ID,
    TIER_SUBSTITUTE_ROLE_ID,
};
use crate::{ElectoralRegisterPolicy, RegisterError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkkFumPolicy {
    meeting: MeetingId,
}

impl SkkFumPolicy {
    pub const NAME: &'static str = "skk_kfum";

    pub fn new(meeting: MeetingId) -> Self {
        Self { meeting }
    }
}

/// Eligible memberships in groups with capacity, in priority order.
struct Candidates<'a> {
    ordered: Vec<&'a Membership>,
}

impl<'a> Candidates<'a> {
    fn with_role(&self, role: RoleId) -> impl Iterator<Item = &'a Membership> + '_ {
        self.ordered.iter().copied().filter(move |m| m.has_role(role))
    }
}

/// One pass over `candidates`: anyone not yet in `pickset` whose group has
/// capacity left takes one unit of it.
fn pick_round<'a>(
    pool: &mut CapacityPool,
    candidates: impl Iterator<Item = &'a Membership>,
    pickset: &mut HashSet<UserId>,
    allocation: &mut Allocation,
) {
    for m in candidates {
        if pickset.contains(&m.user) {
            continue;
        }
        if pool.take(m.group) {
            pickset.insert(m.user);
            *allocation.membership_votes.entry(m.id).or_default() += 1;
        }
    }
}

impl SkkFumPolicy {
    fn eligible<S: EntityStore>(
        &self,
        store: &S,
    ) -> Result<(BTreeSet<UserId>, Presence), RegisterError> {
        let meeting = store.get_meeting(self.meeting)?;
        let presence = Presence::load(store, &meeting)?;
        let eligible = potential_voters(store, self.meeting)?
            .into_iter()
            .filter(|u| presence.is_present(*u))
            .collect();
        Ok((eligible, presence))
    }
}

impl ElectoralRegisterPolicy for SkkFumPolicy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn meeting(&self) -> MeetingId {
        self.meeting
    }

    fn allocate<S: EntityStore>(&self, store: &S) -> Result<Allocation, RegisterError> {
        let roles = resolve_roles(
            store,
            self.meeting,
            &[PROXY_DELEGATE_ROLE_ID, DELEGATE_ROLE_ID, TIER_SUBSTITUTE_ROLE_ID],
        )?;
        let (proxy, delegate, substitute) = (roles[0].id, roles[1].id, roles[2].id);
        let (eligible, presence) = self.eligible(store)?;
        let groups: Vec<Group> = store
            .groups(self.meeting)?
            .into_iter()
            .filter(Group::has_votes)
            .collect();
        let mut pool = CapacityPool::new(&groups);

        let memberships = store.memberships(self.meeting)?;
        let mut ordered: Vec<&Membership> = memberships
            .iter()
            .filter(|m| !pool.is_exhausted(m.group) && eligible.contains(&m.user))
            .collect();
        ordered.sort_by_key(|m| (presence.rank(m.user), m.id));
        let candidates = Candidates { ordered };

        let mut allocation = Allocation::default();
        let mut primary = HashSet::new();
        let mut secondary = HashSet::new();
        for pickset in [&mut primary, &mut secondary] {
            pick_round(&mut pool, candidates.with_role(proxy), pickset, &mut allocation);
            pick_round(&mut pool, candidates.with_role(delegate), pickset, &mut allocation);
        }
        for pickset in [&mut primary, &mut secondary] {
            pick_round(&mut pool, candidates.with_role(substitute), pickset, &mut allocation);
        }

        // A second pick requires a first one, so the secondary set supersedes.
        for user in &primary {
            let weight = if secondary.contains(user) { 2 } else { 1 };
            allocation.voters.insert(*user, weight);
        }
        debug!(
            meeting = %self.meeting,
            primary = primary.len(),
            secondary = secondary.len(),
            "three-tier allocation"
        );
        Ok(allocation)
    }

    fn poll_will_have_voters<S: EntityStore>(&self, store: &S) -> Result<bool, RegisterError> {
        let roles = resolve_roles(
            store,
            self.meeting,
            &[PROXY_DELEGATE_ROLE_ID, DELEGATE_ROLE_ID, TIER_SUBSTITUTE_ROLE_ID],
        )?;
        let (eligible, _) = self.eligible(store)?;
        let with_votes: BTreeSet<_> = store
            .groups(self.meeting)?
            .into_iter()
            .filter(Group::has_votes)
            .map(|g| g.id)
            .collect();
        Ok(store.memberships(self.meeting)?.iter().any(|m| {
            with_votes.contains(&m.group)
                && eligible.contains(&m.user)
                && roles.iter().any(|r| m.has_role(r.id))
        }))
    }
}
