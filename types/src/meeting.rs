//! The meeting aggregate and meeting-level roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;
use crate::ids::{MeetingId, RegisterId};

/// Lifecycle state of a meeting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingState {
    #[default]
    Upcoming,
    Ongoing,
    Closed,
    /// No further changes to voting power are accepted.
    Finished,
}

impl MeetingState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl FromStr for MeetingState {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" => Ok(Self::Upcoming),
            "ongoing" => Ok(Self::Ongoing),
            "closed" => Ok(Self::Closed),
            "finished" => Ok(Self::Finished),
            other => Err(TypesError::UnknownMeetingState(other.to_string())),
        }
    }
}

/// Meeting-wide roles a user can hold, either assigned directly or granted
/// through a group role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingRole {
    Participant,
    /// Eligible to receive voting power. Necessary, never sufficient.
    PotentialVoter,
    Proposer,
    Discusser,
    /// May change meeting settings, including other groups' vote weights.
    Moderator,
}

impl MeetingRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::PotentialVoter => "potential_voter",
            Self::Proposer => "proposer",
            Self::Discusser => "discusser",
            Self::Moderator => "moderator",
        }
    }
}

impl fmt::Display for MeetingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingRole {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "participant" => Ok(Self::Participant),
            "potential_voter" => Ok(Self::PotentialVoter),
            "proposer" => Ok(Self::Proposer),
            "discusser" => Ok(Self::Discusser),
            "moderator" => Ok(Self::Moderator),
            other => Err(TypesError::UnknownMeetingRole(other.to_string())),
        }
    }
}

/// Root aggregate owning groups, roles, memberships, the active log,
/// vote transfers and electoral registers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: MeetingState,
    /// Name of the configured electoral register policy, if any.
    #[serde(default)]
    pub policy_name: Option<String>,
    /// Group roles grant their meeting roles to members while this is set.
    #[serde(default)]
    pub group_roles_active: bool,
    /// Whether the active-users log is tracked for this meeting.
    #[serde(default)]
    pub active_users_enabled: bool,
    #[serde(default)]
    pub latest_register: Option<RegisterId>,
}

impl Meeting {
    pub fn new(id: MeetingId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            state: MeetingState::default(),
            policy_name: None,
            group_roles_active: false,
            active_users_enabled: false,
            latest_register: None,
        }
    }

    pub fn with_policy(mut self, name: impl Into<String>) -> Self {
        self.policy_name = Some(name.into());
        self
    }
}
