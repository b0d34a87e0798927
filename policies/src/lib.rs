//! Electoral register policies.
//!
//! Each policy turns a meeting's groups, roles, memberships, presence log
//! and vote transfers into a `user -> weight` mapping, and materializes it
//! as an immutable [`ElectoralRegister`](voteroll_types::ElectoralRegister).
//! Policies are bound to one meeting and read everything through an
//! [`EntityStore`](voteroll_store::EntityStore).

pub mod allocation;
pub mod error;
pub mod group_votes;
pub mod leader_weights;
pub mod main_subst_active;
pub mod main_subst_delegate;
pub mod policy;
pub mod regional_council;
pub mod registry;
pub mod roles;
pub mod skk_fum;
pub mod vote_transfer;

#[cfg(test)]
mod test_support;

pub use allocation::{Allocation, CapacityPool};
pub use error::RegisterError;
pub use group_votes::GroupVotesBeforePoll;
pub use leader_weights::{DelegationVotesOutcome, SetDelegationVotes, VoterWeight};
pub use main_subst_active::MainSubstActivePolicy;
pub use main_subst_delegate::MainSubstDelegatePolicy;
pub use policy::{ElectoralRegisterPolicy, PollTransition};
pub use regional_council::{CategorizedVotes, RegionalCouncilPolicy, VoteCategory};
pub use registry::{Policy, PolicyInfo, PolicyKind, PolicySettings};
pub use skk_fum::SkkFumPolicy;
pub use vote_transfer::{MainAndSubstTransfers, RoleEvent};
