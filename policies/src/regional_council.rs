//! Regional council allocation over a one-level delegation forest.
//!
//! Groups tagged "municipality" or "region" either vote themselves or
//! delegate to another group. A voting group weighs 1 plus the number of
//! groups delegating to it, and that weight goes to its sole present
//! member. The hub group's occupant gets the sum of all other weights plus
//! two per group delegating to the hub, minus one. Delegations are counted
//! from every group of the meeting, tagged or not.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use voteroll_store::EntityStore;
use voteroll_types::{CastVote, ElectoralRegister, Group, GroupId, MeetingId, Membership, UserId};

use crate::allocation::Allocation;
use crate::roles::{potential_voters, Presence};
use crate::{ElectoralRegisterPolicy, RegisterError};

pub const MUNICIPALITY_TAG: &str = "municipality";
pub const REGION_TAG: &str = "region";

/// Voter category used when reporting how vote power was cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteCategory {
    Municipality,
    Region,
    Hub,
    Unknown,
}

impl fmt::Display for VoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Municipality => "municipality",
            Self::Region => "region",
            Self::Hub => "hub",
            Self::Unknown => "unknown",
        })
    }
}

/// Cast weight per vote value and voter category.
pub type CategorizedVotes = BTreeMap<String, BTreeMap<VoteCategory, u64>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionalCouncilPolicy {
    meeting: MeetingId,
    hub_group: String,
}

/// The meeting's groups split by role in the forest.
struct Forest {
    hub: Group,
    tagged: Vec<Group>,
    incoming: BTreeMap<GroupId, u32>,
}

impl Forest {
    fn load<S: EntityStore>(
        store: &S,
        meeting: MeetingId,
        hub_key: &str,
    ) -> Result<Self, RegisterError> {
        let groups = store.groups(meeting)?;
        let hub = groups
            .iter()
            .find(|g| g.key == hub_key)
            .cloned()
            .ok_or_else(|| {
                RegisterError::Configuration(format!(
                    "meeting {meeting} has no hub group '{hub_key}'"
                ))
            })?;
        let overlap = groups
            .iter()
            .filter(|g| g.has_tag(MUNICIPALITY_TAG) && g.has_tag(REGION_TAG))
            .count();
        if overlap > 0 {
            return Err(RegisterError::Consistency(format!(
                "{overlap} group(s) carry both the '{MUNICIPALITY_TAG}' and '{REGION_TAG}' tag"
            )));
        }
        let mut incoming = BTreeMap::new();
        for target in groups.iter().filter_map(|g| g.delegate_to) {
            *incoming.entry(target).or_insert(0) += 1;
        }
        let tagged = groups
            .into_iter()
            .filter(|g| g.has_tag(MUNICIPALITY_TAG) || g.has_tag(REGION_TAG))
            .collect();
        Ok(Self {
            hub,
            tagged,
            incoming,
        })
    }

    /// Groups delegating to `group`.
    fn incoming(&self, group: GroupId) -> u32 {
        self.incoming.get(&group).copied().unwrap_or(0)
    }
}

/// The single eligible, present member of a group, if any.
fn sole_occupant<'a>(
    memberships: &'a [Membership],
    group: &Group,
    eligible: &BTreeSet<UserId>,
    presence: &Presence,
) -> Result<Option<&'a Membership>, RegisterError> {
    let present: Vec<&Membership> = memberships
        .iter()
        .filter(|m| m.group == group.id)
        .filter(|m| eligible.contains(&m.user) && presence.is_present(m.user))
        .collect();
    match present.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        [a, b, ..] => Err(RegisterError::Consistency(format!(
            "group {} ({}) has more than one present member: {} and {}",
            group.id, group.key, a.user, b.user
        ))),
    }
}

impl RegionalCouncilPolicy {
    pub const NAME: &'static str = "skr_agarrad";

    pub fn new(meeting: MeetingId, hub_group: impl Into<String>) -> Self {
        Self {
            meeting,
            hub_group: hub_group.into(),
        }
    }

    pub fn hub_group(&self) -> &str {
        &self.hub_group
    }

    /// Bucket the weight behind each non-abstaining vote by the voter's
    /// category. Voters missing from the register are skipped.
    ///
    /// Reflects current group membership, which may differ from the time
    /// the votes were cast.
    pub fn categorize_vote_power<S: EntityStore>(
        &self,
        store: &S,
        votes: &[CastVote],
        register: &ElectoralRegister,
    ) -> Result<CategorizedVotes, RegisterError> {
        let forest = Forest::load(store, self.meeting, &self.hub_group)?;
        let memberships = store.memberships(self.meeting)?;
        let members_of = |pred: &dyn Fn(&Group) -> bool| -> BTreeSet<UserId> {
            let groups: BTreeSet<GroupId> = forest
                .tagged
                .iter()
                .chain(std::iter::once(&forest.hub))
                .filter(|g| pred(g))
                .map(|g| g.id)
                .collect();
            memberships
                .iter()
                .filter(|m| groups.contains(&m.group))
                .map(|m| m.user)
                .collect()
        };
        let municipality = members_of(&|g| g.has_tag(MUNICIPALITY_TAG));
        let region = members_of(&|g| g.has_tag(REGION_TAG));
        let hub = members_of(&|g| g.id == forest.hub.id);

        let mut categorized = CategorizedVotes::new();
        for vote in votes.iter().filter(|v| !v.abstain) {
            let category = if municipality.contains(&vote.user) {
                VoteCategory::Municipality
            } else if region.contains(&vote.user) {
                VoteCategory::Region
            } else if hub.contains(&vote.user) {
                VoteCategory::Hub
            } else {
                VoteCategory::Unknown
            };
            let counter = categorized.entry(vote.vote_data.clone()).or_default();
            let Some(weight) = register.weight(vote.user) else {
                warn!(user = %vote.user, register = %register.id, "voter not found in register");
                continue;
            };
            *counter.entry(category).or_insert(0) += u64::from(weight);
        }
        Ok(categorized)
    }
}

impl ElectoralRegisterPolicy for RegionalCouncilPolicy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn meeting(&self) -> MeetingId {
        self.meeting
    }

    fn allocate<S: EntityStore>(&self, store: &S) -> Result<Allocation, RegisterError> {
        let meeting = store.get_meeting(self.meeting)?;
        let forest = Forest::load(store, meeting.id, &self.hub_group)?;
        let presence = Presence::load(store, &meeting)?;
        let eligible = potential_voters(store, meeting.id)?;
        let memberships = store.memberships(meeting.id)?;

        let mut allocation = Allocation::default();
        for group in forest.tagged.iter().filter(|g| g.delegate_to.is_none()) {
            let Some(occupant) = sole_occupant(&memberships, group, &eligible, &presence)? else {
                continue;
            };
            if allocation.contains(occupant) {
                return Err(RegisterError::Consistency(format!(
                    "user {} occupies more than one voting group",
                    occupant.user
                )));
            }
            let weight = 1 + forest.incoming(group.id);
            allocation.add(occupant, weight);
        }

        let Some(hub_occupant) = sole_occupant(&memberships, &forest.hub, &eligible, &presence)?
        else {
            return Ok(allocation);
        };
        if allocation.contains(hub_occupant) {
            return Err(RegisterError::Consistency(format!(
                "hub occupant {} also occupies another voting group",
                hub_occupant.user
            )));
        }
        let to_hub = i64::from(forest.incoming(forest.hub.id));
        let hub_weight = allocation.total_weight() as i64 + 2 * to_hub - 1;
        match u32::try_from(hub_weight) {
            Ok(weight) if weight > 0 => {
                debug!(hub = %forest.hub.id, weight, "hub weight");
                allocation.add(hub_occupant, weight);
            }
            _ => warn!(
                meeting = %meeting.id,
                hub = %forest.hub.id,
                weight = hub_weight,
                "hub weight is not positive, hub occupant excluded"
            ),
        }
        Ok(allocation)
    }

    fn poll_will_have_voters<S: EntityStore>(&self, store: &S) -> Result<bool, RegisterError> {
        let meeting = store.get_meeting(self.meeting)?;
        let forest = Forest::load(store, meeting.id, &self.hub_group)?;
        let presence = Presence::load(store, &meeting)?;
        let eligible = potential_voters(store, meeting.id)?;
        let voting: BTreeSet<GroupId> = forest
            .tagged
            .iter()
            .filter(|g| g.delegate_to.is_none())
            .map(|g| g.id)
            .collect();
        Ok(store.memberships(meeting.id)?.iter().any(|m| {
            voting.contains(&m.group) && eligible.contains(&m.user) && presence.is_present(m.user)
        }))
    }
}
