//! Delegation leader command: distribute a group's votes among its members.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;
use voteroll_store::EntityStore;
use voteroll_types::{Group, GroupId, MeetingRole, Membership, UserId};

use crate::group_votes::GroupVotesBeforePoll;
use crate::roles::{potential_voters, DELEGATION_LEADER_ROLE_ID};
use crate::RegisterError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterWeight {
    pub user: UserId,
    pub weight: u32,
}

/// Payload of the command: the complete set of weights for one group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDelegationVotes {
    pub meeting_group: GroupId,
    pub weights: Vec<VoterWeight>,
}

/// What applying the command changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DelegationVotesOutcome {
    /// Members whose previous votes were cleared.
    pub cleared: Vec<UserId>,
    /// Members whose votes were written.
    pub set: Vec<VoterWeight>,
}

fn join_ids(ids: &BTreeSet<UserId>) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl SetDelegationVotes {
    pub const NAME: &'static str = "set_delegation_voters";

    /// Run every check; nothing is written here.
    ///
    /// `policy` is the name of the policy in effect for the group's meeting,
    /// which may come from a configured default rather than the meeting.
    pub fn validate<S: EntityStore>(
        &self,
        store: &S,
        policy: Option<&str>,
        caller: UserId,
    ) -> Result<(Group, Vec<Membership>), RegisterError> {
        let group = store.get_group(self.meeting_group)?;
        let meeting = store.get_meeting(group.meeting)?;
        if meeting.state.is_finished() {
            return Err(RegisterError::validation(
                "meeting",
                "The meeting is finished.",
            ));
        }
        if !group.has_votes() {
            return Err(RegisterError::validation(
                "meeting_group",
                "This group has no votes.",
            ));
        }
        let total: u64 = self.weights.iter().map(|w| u64::from(w.weight)).sum();
        if total != u64::from(group.capacity()) {
            return Err(RegisterError::validation(
                "weights",
                format!(
                    "Bad vote sum. You've set {total} but the group has {} votes.",
                    group.capacity()
                ),
            ));
        }
        if policy != Some(GroupVotesBeforePoll::NAME) {
            return Err(RegisterError::validation(
                "meeting",
                format!(
                    "This message is only valid while using {} electoral register policy.",
                    GroupVotesBeforePoll::NAME
                ),
            ));
        }

        let members = store.group_memberships(group.id)?;
        let leader_roles: BTreeSet<_> = store
            .group_roles(meeting.id)?
            .into_iter()
            .filter(|r| r.role_id == DELEGATION_LEADER_ROLE_ID)
            .map(|r| r.id)
            .collect();
        let is_leader = members.iter().any(|m| {
            m.user == caller && m.role.is_some_and(|role| leader_roles.contains(&role))
        });
        if !is_leader
            && !store
                .meeting_roles(meeting.id, caller)?
                .contains(&MeetingRole::Moderator)
        {
            return Err(RegisterError::validation(
                "user",
                "You're not delegation leader or moderator.",
            ));
        }

        let named: BTreeSet<UserId> = self.weights.iter().map(|w| w.user).collect();
        let member_ids: BTreeSet<UserId> = members.iter().map(|m| m.user).collect();
        let non_members: BTreeSet<UserId> = named.difference(&member_ids).copied().collect();
        if !non_members.is_empty() {
            return Err(RegisterError::validation(
                "weights",
                format!(
                    "The following user PKs aren't members of that group: {}.",
                    join_ids(&non_members)
                ),
            ));
        }
        let eligible = potential_voters(store, meeting.id)?;
        let non_voters: BTreeSet<UserId> = named.difference(&eligible).copied().collect();
        if !non_voters.is_empty() {
            return Err(RegisterError::validation(
                "weights",
                format!(
                    "The following user PKs aren't potential voters: {}.",
                    join_ids(&non_voters)
                ),
            ));
        }
        if named.len() != self.weights.len() {
            return Err(RegisterError::validation(
                "weights",
                "Each user may only be listed once.",
            ));
        }
        if self.weights.iter().any(|w| w.weight == 0) {
            return Err(RegisterError::validation(
                "weights",
                "Every listed user must get at least one vote.",
            ));
        }
        Ok((group, members))
    }

    /// Validate, then replace the group's explicit weights with the
    /// submitted ones. Members left out lose their votes.
    pub fn apply<S: EntityStore>(
        &self,
        store: &S,
        policy: Option<&str>,
        caller: UserId,
    ) -> Result<DelegationVotesOutcome, RegisterError> {
        let (group, members) = self.validate(store, policy, caller)?;
        let mut outcome = DelegationVotesOutcome::default();
        for m in &members {
            let named = self.weights.iter().any(|w| w.user == m.user);
            if !named && m.votes.is_some() {
                store.set_membership_votes(m.id, None)?;
                outcome.cleared.push(m.user);
            }
        }
        for w in &self.weights {
            let current = members.iter().find(|m| m.user == w.user);
            if let Some(m) = current {
                if m.votes != Some(w.weight) {
                    store.set_membership_votes(m.id, Some(w.weight))?;
                }
            }
            outcome.set.push(*w);
        }
        info!(
            group = %group.id,
            %caller,
            set = outcome.set.len(),
            cleared = outcome.cleared.len(),
            "delegation votes set"
        );
        Ok(outcome)
    }
}
