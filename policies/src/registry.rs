//! Static table of the registered policies and the sealed dispatch enum.

use serde::{Deserialize, Serialize};
use voteroll_store::EntityStore;
use voteroll_types::{Meeting, MeetingId};

use crate::allocation::Allocation;
use crate::group_votes::GroupVotesBeforePoll;
use crate::main_subst_active::MainSubstActivePolicy;
use crate::main_subst_delegate::MainSubstDelegatePolicy;
use crate::regional_council::RegionalCouncilPolicy;
use crate::skk_fum::SkkFumPolicy;
use crate::vote_transfer::MainAndSubstTransfers;
use crate::{ElectoralRegisterPolicy, RegisterError};

/// Per-deployment policy settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySettings {
    /// Key of the hub group used by the regional council policy.
    #[serde(default = "default_hub_group")]
    pub hub_group: String,
}

fn default_hub_group() -> String {
    "skr".to_string()
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            hub_group: default_hub_group(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    MainSubstActive,
    MainSubstDelegate,
    SkkFum,
    RegionalCouncil,
    GroupVotesBeforePoll,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolicyInfo {
    pub kind: PolicyKind,
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

impl PolicyKind {
    pub const ALL: &[PolicyInfo] = &[
        PolicyInfo {
            kind: PolicyKind::MainSubstActive,
            name: MainSubstActivePolicy::NAME,
            title: "Main/Substitute with active",
            description: "Groups with votes hand them to present main members first, \
                then to present substitutes, in the order they became active.",
        },
        PolicyInfo {
            kind: PolicyKind::MainSubstDelegate,
            name: MainSubstDelegatePolicy::NAME,
            title: "Main/Substitute + delegate votes",
            description: "Group members with main have votes and can transfer them to \
                users with the substitute role in the same group.",
        },
        PolicyInfo {
            kind: PolicyKind::SkkFum,
            name: SkkFumPolicy::NAME,
            title: "Three-tier delegates",
            description: "Delegates with proxy, then delegates, then substitutes. Nobody \
                gets more than 2 votes; delegates get 2 votes before substitutes get 1.",
        },
        PolicyInfo {
            kind: PolicyKind::RegionalCouncil,
            name: RegionalCouncilPolicy::NAME,
            title: "Regional council",
            description: "Municipality and region groups vote through their sole present \
                member, weighted by delegations. The hub group balances the total.",
        },
        PolicyInfo {
            kind: PolicyKind::GroupVotesBeforePoll,
            name: GroupVotesBeforePoll::NAME,
            title: "Group votes set before poll",
            description: "Delegation leaders distribute their group's votes among its \
                members before the poll starts.",
        },
    ];

    pub fn info(self) -> &'static PolicyInfo {
        match self {
            Self::MainSubstActive => &Self::ALL[0],
            Self::MainSubstDelegate => &Self::ALL[1],
            Self::SkkFum => &Self::ALL[2],
            Self::RegionalCouncil => &Self::ALL[3],
            Self::GroupVotesBeforePoll => &Self::ALL[4],
        }
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().find(|i| i.name == name).map(|i| i.kind)
    }

    /// Whether registers from this policy carry weights other than 1.
    pub fn handles_vote_weight(self) -> bool {
        matches!(
            self,
            Self::SkkFum | Self::RegionalCouncil | Self::GroupVotesBeforePoll
        )
    }

    /// Name of the vote-transfer policy paired with this allocator.
    pub fn vote_transfer_policy(self) -> Option<&'static str> {
        match self {
            Self::MainSubstDelegate => Some(MainAndSubstTransfers::NAME),
            _ => None,
        }
    }
}

/// One policy bound to one meeting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Policy {
    MainSubstActive(MainSubstActivePolicy),
    MainSubstDelegate(MainSubstDelegatePolicy),
    SkkFum(SkkFumPolicy),
    RegionalCouncil(RegionalCouncilPolicy),
    GroupVotesBeforePoll(GroupVotesBeforePoll),
}

macro_rules! dispatch {
    ($self:ident, $p:ident => $body:expr) => {
        match $self {
            Policy::MainSubstActive($p) => $body,
            Policy::MainSubstDelegate($p) => $body,
            Policy::SkkFum($p) => $body,
            Policy::RegionalCouncil($p) => $body,
            Policy::GroupVotesBeforePoll($p) => $body,
        }
    };
}

impl Policy {
    pub fn new(kind: PolicyKind, meeting: MeetingId, settings: &PolicySettings) -> Self {
        match kind {
            PolicyKind::MainSubstActive => {
                Self::MainSubstActive(MainSubstActivePolicy::new(meeting))
            }
            PolicyKind::MainSubstDelegate => {
                Self::MainSubstDelegate(MainSubstDelegatePolicy::new(meeting))
            }
            PolicyKind::SkkFum => Self::SkkFum(SkkFumPolicy::new(meeting)),
            PolicyKind::RegionalCouncil => Self::RegionalCouncil(RegionalCouncilPolicy::new(
                meeting,
                settings.hub_group.clone(),
            )),
            PolicyKind::GroupVotesBeforePoll => {
                Self::GroupVotesBeforePoll(GroupVotesBeforePoll::new(meeting))
            }
        }
    }

    /// Bind the policy named on the meeting.
    pub fn for_meeting(
        meeting: &Meeting,
        settings: &PolicySettings,
    ) -> Result<Self, RegisterError> {
        let name = meeting.policy_name.as_deref().ok_or_else(|| {
            RegisterError::Configuration(format!(
                "meeting {} has no electoral register policy",
                meeting.id
            ))
        })?;
        Self::by_name(name, meeting.id, settings)
    }

    pub fn by_name(
        name: &str,
        meeting: MeetingId,
        settings: &PolicySettings,
    ) -> Result<Self, RegisterError> {
        let kind = PolicyKind::from_name(name).ok_or_else(|| {
            RegisterError::Configuration(format!("unknown electoral register policy '{name}'"))
        })?;
        Ok(Self::new(kind, meeting, settings))
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::MainSubstActive(_) => PolicyKind::MainSubstActive,
            Self::MainSubstDelegate(_) => PolicyKind::MainSubstDelegate,
            Self::SkkFum(_) => PolicyKind::SkkFum,
            Self::RegionalCouncil(_) => PolicyKind::RegionalCouncil,
            Self::GroupVotesBeforePoll(_) => PolicyKind::GroupVotesBeforePoll,
        }
    }

    /// The vote-transfer policy, for allocators that honour transfers.
    pub fn transfers(&self) -> Option<MainAndSubstTransfers> {
        match self {
            Self::MainSubstDelegate(p) => Some(p.transfers()),
            _ => None,
        }
    }

    pub fn as_regional_council(&self) -> Option<&RegionalCouncilPolicy> {
        match self {
            Self::RegionalCouncil(p) => Some(p),
            _ => None,
        }
    }
}

impl ElectoralRegisterPolicy for Policy {
    fn name(&self) -> &'static str {
        dispatch!(self, p => p.name())
    }

    fn meeting(&self) -> MeetingId {
        dispatch!(self, p => p.meeting())
    }

    fn allocate<S: EntityStore>(&self, store: &S) -> Result<Allocation, RegisterError> {
        dispatch!(self, p => p.allocate(store))
    }

    fn poll_will_have_voters<S: EntityStore>(&self, store: &S) -> Result<bool, RegisterError> {
        dispatch!(self, p => p.poll_will_have_voters(store))
    }

    fn annotates_memberships(&self) -> bool {
        dispatch!(self, p => p.annotates_memberships())
    }
}
