//! In-memory entity store.
//!
//! Implements every `voteroll-store` trait on top of mutex-guarded maps and
//! emits one [`voteroll_store::StoreEvent`] per write. Meetings can be loaded
//! from and exported to JSON snapshots.

mod active;
mod group;
mod meeting;
mod membership;
mod register;
pub mod snapshot;
mod store;
mod transfer;

pub use snapshot::{MeetingSnapshot, UserRoles};
pub use store::MemoryStore;
