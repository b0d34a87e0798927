//! Change notifications emitted by store implementations.
//!
//! Every individual write emits exactly one [`StoreEvent`]. Observers (audit
//! trail, UI push) subscribe through an [`EventBus`].

use voteroll_types::{GroupId, MeetingId, MembershipId, RegisterId, RoleId, TransferId, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// A membership's audit `votes` annotation changed.
    MembershipVotesChanged {
        meeting: MeetingId,
        membership: MembershipId,
        user: UserId,
        group: GroupId,
        old: Option<u32>,
        new: Option<u32>,
    },
    MembershipRoleChanged {
        meeting: MeetingId,
        membership: MembershipId,
        user: UserId,
        group: GroupId,
        old: Option<RoleId>,
        new: Option<RoleId>,
    },
    MembershipAdded {
        meeting: MeetingId,
        membership: MembershipId,
        user: UserId,
        group: GroupId,
    },
    MembershipRemoved {
        meeting: MeetingId,
        membership: MembershipId,
        user: UserId,
        group: GroupId,
    },
    TransferCreated {
        meeting: MeetingId,
        transfer: TransferId,
        source: UserId,
        target: UserId,
    },
    TransferUpdated {
        meeting: MeetingId,
        transfer: TransferId,
        source: UserId,
        target: UserId,
    },
    TransferDeleted {
        meeting: MeetingId,
        transfer: TransferId,
        source: UserId,
        target: UserId,
    },
    RegisterCreated {
        meeting: MeetingId,
        register: RegisterId,
        source: String,
    },
}

impl StoreEvent {
    pub fn meeting(&self) -> MeetingId {
        match self {
            Self::MembershipVotesChanged { meeting, .. }
            | Self::MembershipRoleChanged { meeting, .. }
            | Self::MembershipAdded { meeting, .. }
            | Self::MembershipRemoved { meeting, .. }
            | Self::TransferCreated { meeting, .. }
            | Self::TransferUpdated { meeting, .. }
            | Self::TransferDeleted { meeting, .. }
            | Self::RegisterCreated { meeting, .. } => *meeting,
        }
    }
}

/// Synchronous fan-out event bus for store events.
///
/// Listeners are invoked inline on the writing thread; keep handlers fast
/// and never call back into the store from a listener.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&StoreEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&StoreEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &StoreEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
