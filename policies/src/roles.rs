//! Group-role vocabulary and the per-meeting views every allocator needs:
//! role resolution, potential-voter eligibility and presence ordering.

use std::collections::{BTreeSet, HashMap};

use voteroll_store::{ActiveUserStore, GroupStore, MeetingStore};
use voteroll_types::{GroupRole, Meeting, MeetingId, MeetingRole, UserId};

use crate::RegisterError;

/// Main/substitute dialect.
pub const MAIN_ROLE_ID: &str = "main";
pub const SUBSTITUTE_ROLE_ID: &str = "substitute";

/// Three-tier dialect: delegate with proxy, delegate, substitute.
pub const PROXY_DELEGATE_ROLE_ID: &str = "del_2";
pub const DELEGATE_ROLE_ID: &str = "del_1";
pub const TIER_SUBSTITUTE_ROLE_ID: &str = "suppleant";

/// Delegation leader, allowed to set explicit member weights for a group.
pub const DELEGATION_LEADER_ROLE_ID: &str = "leader";

/// Look up the meeting's group roles named by `role_ids`, in the order given.
///
/// Every role id must match exactly one group role; anything else means the
/// meeting was not set up for the dialect.
pub fn resolve_roles<S: GroupStore>(
    store: &S,
    meeting: MeetingId,
    role_ids: &[&str],
) -> Result<Vec<GroupRole>, RegisterError> {
    let roles = store.group_roles(meeting)?;
    role_ids
        .iter()
        .map(|wanted| {
            let mut matching = roles.iter().filter(|r| r.role_id == *wanted);
            match (matching.next(), matching.next()) {
                (Some(role), None) => Ok(role.clone()),
                (None, _) => Err(RegisterError::Configuration(format!(
                    "meeting {meeting} has no group role '{wanted}'"
                ))),
                (Some(_), Some(_)) => Err(RegisterError::Configuration(format!(
                    "meeting {meeting} has more than one group role '{wanted}'"
                ))),
            }
        })
        .collect()
}

/// Users holding potential-voter status in the meeting.
pub fn potential_voters<S: MeetingStore>(
    store: &S,
    meeting: MeetingId,
) -> Result<BTreeSet<UserId>, RegisterError> {
    Ok(store.users_with_role(meeting, MeetingRole::PotentialVoter)?)
}

/// Presence view over the active-users log.
///
/// With active tracking disabled every user counts as present and the
/// priority order falls back to user id, since the real order is unknown.
#[derive(Clone, Debug, Default)]
pub struct Presence {
    tracking: bool,
    position: HashMap<UserId, usize>,
}

impl Presence {
    pub fn load<S: ActiveUserStore>(store: &S, meeting: &Meeting) -> Result<Self, RegisterError> {
        if !meeting.active_users_enabled {
            return Ok(Self::default());
        }
        let mut log = store.active_users(meeting.id)?;
        log.sort_by_key(|entry| entry.created);
        let mut position = HashMap::with_capacity(log.len());
        // A user's first entry fixes their rank.
        for (i, entry) in log.into_iter().enumerate() {
            position.entry(entry.user).or_insert(i);
        }
        Ok(Self {
            tracking: true,
            position,
        })
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn is_present(&self, user: UserId) -> bool {
        !self.tracking || self.position.contains_key(&user)
    }

    /// Sort key for priority order. Absent users sort last.
    pub fn rank(&self, user: UserId) -> (usize, UserId) {
        if !self.tracking {
            return (0, user);
        }
        (self.position.get(&user).copied().unwrap_or(usize::MAX), user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voteroll_store::MeetingStore;
    use voteroll_store_memory::MemoryStore;
    use voteroll_types::Timestamp;

    #[test]
    fn resolve_roles_requires_exactly_one_match() {
        let store = MemoryStore::new();
        let meeting = store.create_meeting("m");
        store.create_group_role(meeting.id, "main", &[]).unwrap();

        let err = resolve_roles(&store, meeting.id, &["main", "substitute"]).unwrap_err();
        assert!(matches!(err, RegisterError::Configuration(_)));

        store.create_group_role(meeting.id, "substitute", &[]).unwrap();
        let roles = resolve_roles(&store, meeting.id, &["substitute", "main"]).unwrap();
        assert_eq!(roles[0].role_id, "substitute");
        assert_eq!(roles[1].role_id, "main");

        store.create_group_role(meeting.id, "main", &[]).unwrap();
        let err = resolve_roles(&store, meeting.id, &["main"]).unwrap_err();
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn presence_orders_by_log_creation() {
        let store = MemoryStore::new();
        let mut meeting = store.create_meeting("m");
        let (a, b, c) = (UserId::new(10), UserId::new(20), UserId::new(30));
        store.mark_active(meeting.id, b, Timestamp::new(5)).unwrap();
        store.mark_active(meeting.id, a, Timestamp::new(9)).unwrap();

        let off = Presence::load(&store, &meeting).unwrap();
        assert!(!off.is_tracking());
        assert!(off.is_present(c));
        assert!(off.rank(a) < off.rank(b));

        meeting.active_users_enabled = true;
        store.put_meeting(&meeting).unwrap();
        let on = Presence::load(&store, &meeting).unwrap();
        assert!(on.is_present(a) && on.is_present(b));
        assert!(!on.is_present(c));
        assert!(on.rank(b) < on.rank(a));
        assert!(on.rank(a) < on.rank(c));
    }
}
