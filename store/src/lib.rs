//! Abstract entity-store traits for meeting data.
//!
//! The host's relational store, the in-memory store and any test double
//! implement these traits. Allocation policies depend only on
//! [`EntityStore`].

pub mod active;
pub mod error;
pub mod event;
pub mod group;
pub mod meeting;
pub mod membership;
pub mod register;
pub mod transfer;

pub use active::ActiveUserStore;
pub use error::StoreError;
pub use event::{EventBus, StoreEvent};
pub use group::GroupStore;
pub use meeting::MeetingStore;
pub use membership::MembershipStore;
pub use register::RegisterStore;
pub use transfer::VoteTransferStore;

/// Everything a policy needs from the host store.
pub trait EntityStore:
    MeetingStore + GroupStore + MembershipStore + ActiveUserStore + VoteTransferStore + RegisterStore
{
}

impl<T> EntityStore for T where
    T: MeetingStore
        + GroupStore
        + MembershipStore
        + ActiveUserStore
        + VoteTransferStore
        + RegisterStore
{
}
