//! Entity model shared by every crate in the workspace.
//!
//! A meeting owns groups with vote capacity, group roles, memberships,
//! an active-users log, vote transfers and immutable electoral registers.
//! This crate holds the plain data; allocation logic lives in
//! `voteroll-policies`.

pub mod error;
pub mod group;
pub mod ids;
pub mod meeting;
pub mod membership;
pub mod register;
pub mod time;

pub use error::TypesError;
pub use group::{Group, GroupRole};
pub use ids::{GroupId, MeetingId, MembershipId, RegisterId, RoleId, TransferId, UserId};
pub use meeting::{Meeting, MeetingRole, MeetingState};
pub use membership::{ActiveUser, Membership};
pub use register::{CastVote, ElectoralRegister, VoteTransfer, VoterWeights};
pub use time::{Clock, SystemClock, Timestamp};
