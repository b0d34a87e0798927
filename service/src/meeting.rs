//! Meeting-level orchestration of policies, role changes and commands.

use tracing::{debug, info};
use voteroll_policies::{
    CategorizedVotes, DelegationVotesOutcome, ElectoralRegisterPolicy, MainAndSubstTransfers,
    Policy, PolicySettings, PollTransition, RegisterError, RoleEvent, SetDelegationVotes,
};
use voteroll_store::EntityStore;
use voteroll_types::{
    CastVote, Clock, ElectoralRegister, GroupId, MeetingId, Membership, MembershipId, RoleId,
    TransferId, UserId, VoteTransfer, VoterWeights,
};

use crate::{ServiceConfig, ServiceError};

/// Runs the configured policy of each meeting against one store.
///
/// Role mutations go through the service so the vote-transfer policy sees
/// every change as a [`RoleEvent`] within the same call.
pub struct MeetingService<S, C> {
    store: S,
    clock: C,
    settings: PolicySettings,
    default_policy: Option<String>,
}

impl<S: EntityStore, C: Clock> MeetingService<S, C> {
    pub fn new(store: S, clock: C, config: &ServiceConfig) -> Self {
        Self {
            store,
            clock,
            settings: config.policies.clone(),
            default_policy: config.default_policy.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn policy_name(&self, meeting: MeetingId) -> Result<Option<String>, ServiceError> {
        let record = self.store.get_meeting(meeting)?;
        Ok(record.policy_name.or_else(|| self.default_policy.clone()))
    }

    /// The policy bound to `meeting`, falling back to the configured default.
    pub fn policy(&self, meeting: MeetingId) -> Result<Policy, ServiceError> {
        let name = self.policy_name(meeting)?.ok_or_else(|| {
            RegisterError::Configuration(format!(
                "meeting {meeting} has no electoral register policy"
            ))
        })?;
        Ok(Policy::by_name(&name, meeting, &self.settings)?)
    }

    pub fn get_voters(
        &self,
        meeting: MeetingId,
        update_memberships: bool,
    ) -> Result<VoterWeights, ServiceError> {
        Ok(self
            .policy(meeting)?
            .get_voters(&self.store, update_memberships)?)
    }

    pub fn poll_will_have_voters(&self, meeting: MeetingId) -> Result<bool, ServiceError> {
        Ok(self.policy(meeting)?.poll_will_have_voters(&self.store)?)
    }

    pub fn create_register(
        &self,
        meeting: MeetingId,
        force: bool,
    ) -> Result<ElectoralRegister, ServiceError> {
        Ok(self
            .policy(meeting)?
            .create_er(&self.store, &self.clock, force)?)
    }

    pub fn on_poll_transition(
        &self,
        meeting: MeetingId,
        transition: PollTransition,
    ) -> Result<ElectoralRegister, ServiceError> {
        Ok(self
            .policy(meeting)?
            .pre_apply(&self.store, &self.clock, transition)?)
    }

    // ── Role changes ───────────────────────────────────────────────────

    /// The vote-transfer policy that must see role changes in `meeting`,
    /// with its roles already resolved.
    ///
    /// Called before the store write: a configuration error leaves the
    /// store untouched.
    fn role_watcher(
        &self,
        meeting: MeetingId,
    ) -> Result<Option<MainAndSubstTransfers>, ServiceError> {
        if self.policy_name(meeting)?.is_none() {
            return Ok(None);
        }
        match self.policy(meeting)?.transfers() {
            Some(transfers) => {
                transfers.check_configuration(&self.store)?;
                Ok(Some(transfers))
            }
            None => {
                debug!(%meeting, "no vote-transfer policy, role changes ignored");
                Ok(None)
            }
        }
    }

    fn role_changed(
        &self,
        watcher: Option<&MainAndSubstTransfers>,
        event: RoleEvent,
    ) -> Result<Vec<TransferId>, ServiceError> {
        match watcher {
            Some(transfers) => Ok(transfers.on_role_event(&self.store, &event)?),
            None => Ok(Vec::new()),
        }
    }

    /// Add a member. Returns the membership and any transfers deleted as a
    /// consequence of the role it brings.
    pub fn add_membership(
        &self,
        group: GroupId,
        user: UserId,
        role: Option<RoleId>,
    ) -> Result<(Membership, Vec<TransferId>), ServiceError> {
        let meeting = self.store.get_group(group)?.meeting;
        let watcher = match role {
            Some(_) => self.role_watcher(meeting)?,
            None => None,
        };
        let membership = self.store.add_membership(group, user, role)?;
        let deleted = match role {
            Some(role) => {
                self.role_changed(watcher.as_ref(), RoleEvent::Gained { user, group, role })?
            }
            None => Vec::new(),
        };
        Ok((membership, deleted))
    }

    pub fn remove_membership(
        &self,
        membership: MembershipId,
    ) -> Result<(Membership, Vec<TransferId>), ServiceError> {
        let existing = self.store.get_membership(membership)?;
        let watcher = match existing.role {
            Some(_) => {
                let meeting = self.store.get_group(existing.group)?.meeting;
                self.role_watcher(meeting)?
            }
            None => None,
        };
        let removed = self.store.remove_membership(membership)?;
        let deleted = match removed.role {
            Some(role) => self.role_changed(
                watcher.as_ref(),
                RoleEvent::Lost {
                    user: removed.user,
                    group: removed.group,
                    role,
                },
            )?,
            None => Vec::new(),
        };
        Ok((removed, deleted))
    }

    /// Change a membership's role. The old role is reported lost before the
    /// new one is reported gained.
    pub fn assign_role(
        &self,
        membership: MembershipId,
        role: Option<RoleId>,
    ) -> Result<Vec<TransferId>, ServiceError> {
        let current = self.store.get_membership(membership)?;
        if current.role == role {
            return Ok(Vec::new());
        }
        let meeting = self.store.get_group(current.group)?.meeting;
        let watcher = self.role_watcher(meeting)?;
        let previous = self.store.set_membership_role(membership, role)?;
        let (user, group) = (previous.user, previous.group);
        let mut deleted = Vec::new();
        if let Some(old) = previous.role {
            let event = RoleEvent::Lost {
                user,
                group,
                role: old,
            };
            deleted.extend(self.role_changed(watcher.as_ref(), event)?);
        }
        if let Some(new) = role {
            let event = RoleEvent::Gained {
                user,
                group,
                role: new,
            };
            deleted.extend(self.role_changed(watcher.as_ref(), event)?);
        }
        Ok(deleted)
    }

    // ── Vote transfers ─────────────────────────────────────────────────

    fn transfers(&self, meeting: MeetingId) -> Result<MainAndSubstTransfers, ServiceError> {
        let policy = self.policy(meeting)?;
        policy.transfers().ok_or_else(|| {
            RegisterError::Configuration(format!(
                "policy {} does not support vote transfers",
                policy.name()
            ))
            .into()
        })
    }

    pub fn create_transfer(
        &self,
        meeting: MeetingId,
        source: UserId,
        target: UserId,
    ) -> Result<VoteTransfer, ServiceError> {
        Ok(self
            .transfers(meeting)?
            .create_transfer(&self.store, source, target)?)
    }

    pub fn update_transfer(
        &self,
        meeting: MeetingId,
        transfer: TransferId,
        source: UserId,
        target: UserId,
    ) -> Result<VoteTransfer, ServiceError> {
        Ok(self
            .transfers(meeting)?
            .update_transfer(&self.store, transfer, source, target)?)
    }

    pub fn delete_transfer(
        &self,
        meeting: MeetingId,
        transfer: TransferId,
    ) -> Result<VoteTransfer, ServiceError> {
        Ok(self
            .transfers(meeting)?
            .delete_transfer(&self.store, transfer)?)
    }

    // ── Commands and reports ───────────────────────────────────────────

    /// Run the leader command against the policy in effect for the
    /// group's meeting.
    pub fn set_delegation_votes(
        &self,
        caller: UserId,
        command: &SetDelegationVotes,
    ) -> Result<DelegationVotesOutcome, ServiceError> {
        let meeting = self.store.get_group(command.meeting_group)?.meeting;
        let policy = self.policy_name(meeting)?;
        Ok(command.apply(&self.store, policy.as_deref(), caller)?)
    }

    /// Categorize cast votes against a register, defaulting to the
    /// meeting's latest one.
    pub fn categorize_vote_power(
        &self,
        meeting: MeetingId,
        votes: &[CastVote],
        register: Option<&ElectoralRegister>,
    ) -> Result<CategorizedVotes, ServiceError> {
        let policy = self.policy(meeting)?;
        let council = policy.as_regional_council().ok_or_else(|| {
            RegisterError::Configuration(format!(
                "policy {} does not categorize vote power",
                policy.name()
            ))
        })?;
        let latest;
        let register = match register {
            Some(register) => register,
            None => {
                latest = self.store.latest_register(meeting)?.ok_or_else(|| {
                    RegisterError::Configuration(format!(
                        "meeting {meeting} has no electoral register"
                    ))
                })?;
                &latest
            }
        };
        let categorized = council.categorize_vote_power(&self.store, votes, register)?;
        info!(
            %meeting,
            register = %register.id,
            values = categorized.len(),
            "vote power categorized"
        );
        Ok(categorized)
    }
}
