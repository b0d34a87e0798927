//! Vote transfers between a "main" holder and a "substitute" of the same
//! group.
//!
//! Transfers are validated before every write and cleaned up when a role
//! change removes the group-level relationship that justified them.

use tracing::info;
use voteroll_store::EntityStore;
use voteroll_types::{GroupId, MeetingId, Membership, RoleId, TransferId, UserId, VoteTransfer};

use crate::roles::{resolve_roles, MAIN_ROLE_ID, SUBSTITUTE_ROLE_ID};
use crate::RegisterError;

/// A membership gained or lost a group role.
///
/// Produced after the store write, so the store already reflects the change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleEvent {
    Gained {
        user: UserId,
        group: GroupId,
        role: RoleId,
    },
    Lost {
        user: UserId,
        group: GroupId,
        role: RoleId,
    },
}

impl RoleEvent {
    pub fn user(&self) -> UserId {
        match self {
            Self::Gained { user, .. } | Self::Lost { user, .. } => *user,
        }
    }

    pub fn role(&self) -> RoleId {
        match self {
            Self::Gained { role, .. } | Self::Lost { role, .. } => *role,
        }
    }
}

/// The membership of `target` that justifies a transfer from `source`: a
/// substitute membership in a group where `source` holds main.
pub(crate) fn justifying_membership<'a>(
    memberships: &'a [Membership],
    main: RoleId,
    substitute: RoleId,
    source: UserId,
    target: UserId,
) -> Option<&'a Membership> {
    memberships
        .iter()
        .filter(|m| m.user == target && m.has_role(substitute))
        .find(|tm| {
            memberships
                .iter()
                .any(|m| m.user == source && m.group == tm.group && m.has_role(main))
        })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MainAndSubstTransfers {
    meeting: MeetingId,
}

impl MainAndSubstTransfers {
    pub const NAME: &'static str = "main_and_subst";

    pub fn new(meeting: MeetingId) -> Self {
        Self { meeting }
    }

    fn roles<S: EntityStore>(&self, store: &S) -> Result<(RoleId, RoleId), RegisterError> {
        let roles = resolve_roles(store, self.meeting, &[MAIN_ROLE_ID, SUBSTITUTE_ROLE_ID])?;
        Ok((roles[0].id, roles[1].id))
    }

    /// Fail with a configuration error if the meeting lacks the main or
    /// substitute role. Reads only.
    pub fn check_configuration<S: EntityStore>(&self, store: &S) -> Result<(), RegisterError> {
        self.roles(store).map(|_| ())
    }

    /// Validate a transfer before it is created, or before transfer
    /// `modifying` is changed to it.
    pub fn check<S: EntityStore>(
        &self,
        store: &S,
        source: UserId,
        target: UserId,
        modifying: Option<TransferId>,
    ) -> Result<(), RegisterError> {
        if source == target {
            return Err(RegisterError::validation(
                "target",
                "A user can't transfer their vote to themselves.",
            ));
        }
        let others: Vec<VoteTransfer> = store
            .transfers(self.meeting)?
            .into_iter()
            .filter(|vt| Some(vt.id) != modifying)
            .collect();
        for (field, user) in [("source", source), ("target", target)] {
            if others.iter().any(|vt| vt.involves(user)) {
                return Err(RegisterError::validation(
                    field,
                    format!(
                        "User {user} already delegates their vote or has received a vote from someone else."
                    ),
                ));
            }
        }

        let (main, substitute) = self.roles(store)?;
        let memberships = store.memberships(self.meeting)?;
        if memberships
            .iter()
            .any(|m| m.user == target && m.has_role(main))
        {
            return Err(RegisterError::validation(
                "target",
                format!("User {target} already holds a main role and can't receive another vote."),
            ));
        }
        if justifying_membership(&memberships, main, substitute, source, target).is_none() {
            return Err(RegisterError::validation(
                "target",
                "Source and target user must have roles within the same group.",
            ));
        }
        Ok(())
    }

    pub fn create_transfer<S: EntityStore>(
        &self,
        store: &S,
        source: UserId,
        target: UserId,
    ) -> Result<VoteTransfer, RegisterError> {
        self.check(store, source, target, None)?;
        let vt = store.create_transfer(self.meeting, source, target)?;
        info!(meeting = %self.meeting, transfer = %vt.id, %source, %target, "vote transfer created");
        Ok(vt)
    }

    pub fn update_transfer<S: EntityStore>(
        &self,
        store: &S,
        transfer: TransferId,
        source: UserId,
        target: UserId,
    ) -> Result<VoteTransfer, RegisterError> {
        let existing = self.owned(store, transfer)?;
        self.check(store, source, target, Some(existing.id))?;
        let vt = store.update_transfer(existing.id, source, target)?;
        info!(meeting = %self.meeting, transfer = %vt.id, %source, %target, "vote transfer updated");
        Ok(vt)
    }

    pub fn delete_transfer<S: EntityStore>(
        &self,
        store: &S,
        transfer: TransferId,
    ) -> Result<VoteTransfer, RegisterError> {
        let existing = self.owned(store, transfer)?;
        let vt = store.delete_transfer(existing.id)?;
        info!(meeting = %self.meeting, transfer = %vt.id, "vote transfer deleted");
        Ok(vt)
    }

    fn owned<S: EntityStore>(
        &self,
        store: &S,
        transfer: TransferId,
    ) -> Result<VoteTransfer, RegisterError> {
        let vt = store.get_transfer(transfer)?;
        if vt.meeting != self.meeting {
            return Err(RegisterError::validation(
                "transfer",
                format!("Transfer {transfer} belongs to another meeting."),
            ));
        }
        Ok(vt)
    }

    /// Delete the transfers a role change invalidated. Returns their ids.
    ///
    /// Gaining main removes transfers targeting the user. Losing main or
    /// substitute removes transfers involving the user that no group still
    /// justifies. Running it twice for the same event deletes nothing more.
    pub fn on_role_event<S: EntityStore>(
        &self,
        store: &S,
        event: &RoleEvent,
    ) -> Result<Vec<TransferId>, RegisterError> {
        let (main, substitute) = self.roles(store)?;
        let role = event.role();
        if role != main && role != substitute {
            return Ok(Vec::new());
        }
        let user = event.user();
        let transfers = store.transfers(self.meeting)?;
        let stale: Vec<&VoteTransfer> = match event {
            RoleEvent::Gained { .. } if role == main => {
                transfers.iter().filter(|vt| vt.target == user).collect()
            }
            RoleEvent::Gained { .. } => Vec::new(),
            RoleEvent::Lost { .. } => {
                let memberships = store.memberships(self.meeting)?;
                transfers
                    .iter()
                    .filter(|vt| {
                        let affected = if role == main {
                            vt.source == user
                        } else {
                            vt.target == user
                        };
                        affected
                            && justifying_membership(
                                &memberships,
                                main,
                                substitute,
                                vt.source,
                                vt.target,
                            )
                            .is_none()
                    })
                    .collect()
            }
        };

        let mut deleted = Vec::with_capacity(stale.len());
        for vt in stale {
            store.delete_transfer(vt.id)?;
            info!(
                meeting = %self.meeting,
                transfer = %vt.id,
                source = %vt.source,
                target = %vt.target,
                ?event,
                "vote transfer no longer justified, deleted"
            );
            deleted.push(vt.id);
        }
        Ok(deleted)
    }
}
