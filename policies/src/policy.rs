use tracing::{debug, info};
use voteroll_store::EntityStore;
use voteroll_types::{Clock, ElectoralRegister, MeetingId, VoterWeights};

use crate::allocation::{sync_membership_votes, Allocation};
use crate::RegisterError;

/// Poll lifecycle transitions that must see an up-to-date register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollTransition {
    Upcoming,
    Ongoing,
}

/// A named algorithm computing voter weights for one meeting.
///
/// Implementors provide [`allocate`](Self::allocate) and the cheap
/// [`poll_will_have_voters`](Self::poll_will_have_voters) check; register
/// handling is shared.
pub trait ElectoralRegisterPolicy {
    /// Registered name, recorded as the `source` of every register.
    fn name(&self) -> &'static str;

    fn meeting(&self) -> MeetingId;

    /// Compute voters and the audit value of every membership. Never writes.
    fn allocate<S: EntityStore>(&self, store: &S) -> Result<Allocation, RegisterError>;

    fn poll_will_have_voters<S: EntityStore>(&self, store: &S) -> Result<bool, RegisterError>;

    /// Whether `get_voters(update_memberships = true)` writes audit values.
    fn annotates_memberships(&self) -> bool {
        true
    }

    fn get_voters<S: EntityStore>(
        &self,
        store: &S,
        update_memberships: bool,
    ) -> Result<VoterWeights, RegisterError> {
        let allocation = self.allocate(store)?;
        if update_memberships && self.annotates_memberships() {
            sync_membership_votes(store, self.meeting(), &allocation.membership_votes)?;
        }
        Ok(allocation.voters)
    }

    /// A new register is needed when none exists, the latest came from
    /// another policy, or its weights no longer match the current state.
    fn new_er_needed<S: EntityStore>(&self, store: &S) -> Result<bool, RegisterError> {
        match store.latest_register(self.meeting())? {
            None => Ok(true),
            Some(latest) if latest.source != self.name() => Ok(true),
            Some(latest) => Ok(latest.weight_dict != self.get_voters(store, false)?),
        }
    }

    /// Return the latest register, creating a new one first if it is stale
    /// or `force` is set.
    fn create_er<S: EntityStore, C: Clock>(
        &self,
        store: &S,
        clock: &C,
        force: bool,
    ) -> Result<ElectoralRegister, RegisterError> {
        if !force && !self.new_er_needed(store)? {
            if let Some(latest) = store.latest_register(self.meeting())? {
                return Ok(latest);
            }
        }
        let weights = self.get_voters(store, true)?;
        let register = store.create_register(self.meeting(), self.name(), clock.now(), weights)?;
        info!(
            meeting = %self.meeting(),
            register = %register.id,
            policy = self.name(),
            voters = register.voter_count(),
            total_weight = register.total_weight(),
            "electoral register created"
        );
        Ok(register)
    }

    fn pre_apply<S: EntityStore, C: Clock>(
        &self,
        store: &S,
        clock: &C,
        transition: PollTransition,
    ) -> Result<ElectoralRegister, RegisterError> {
        debug!(meeting = %self.meeting(), ?transition, "poll transition");
        self.create_er(store, clock, false)
    }
}
