//! Main/substitute allocation with vote transfers.
//!
//! Every potential voter holding "main" in some group votes with weight 1.
//! A main holder with an outgoing transfer is replaced by the transfer's
//! target. There is no capacity pool here: the number of main memberships
//! per group is the configured vote count.

use std::collections::BTreeMap;

use voteroll_store::EntityStore;
use voteroll_types::{MeetingId, Membership, UserId};

use crate::allocation::Allocation;
use crate::roles::{potential_voters, resolve_roles, MAIN_ROLE_ID, SUBSTITUTE_ROLE_ID};
use crate::vote_transfer::{justifying_membership, MainAndSubstTransfers};
use crate::{ElectoralRegisterPolicy, RegisterError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MainSubstDelegatePolicy {
    meeting: MeetingId,
}

impl MainSubstDelegatePolicy {
    pub const NAME: &'static str = "main_subst_delegate";

    pub fn new(meeting: MeetingId) -> Self {
        Self { meeting }
    }

    /// The transfer policy paired with this allocator.
    pub fn transfers(&self) -> MainAndSubstTransfers {
        MainAndSubstTransfers::new(self.meeting)
    }
}

fn admit(allocation: &mut Allocation, user: UserId, membership: Option<&Membership>) {
    if allocation.voters.contains_key(&user) {
        return;
    }
    match membership {
        Some(m) => allocation.add(m, 1),
        None => {
            allocation.voters.insert(user, 1);
        }
    }
}

impl ElectoralRegisterPolicy for MainSubstDelegatePolicy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn meeting(&self) -> MeetingId {
        self.meeting
    }

    fn allocate<S: EntityStore>(&self, store: &S) -> Result<Allocation, RegisterError> {
        let roles = resolve_roles(store, self.meeting, &[MAIN_ROLE_ID, SUBSTITUTE_ROLE_ID])?;
        let (main, substitute) = (roles[0].id, roles[1].id);
        let eligible = potential_voters(store, self.meeting)?;
        let memberships = store.memberships(self.meeting)?;
        let transfers = store.transfers(self.meeting)?;

        // First main membership per user justifies their own vote.
        let mut mains: BTreeMap<UserId, &Membership> = BTreeMap::new();
        for m in memberships
            .iter()
            .filter(|m| m.has_role(main) && eligible.contains(&m.user))
        {
            mains.entry(m.user).or_insert(m);
        }

        let mut allocation = Allocation::default();
        for (user, membership) in &mains {
            match transfers.iter().find(|vt| vt.source == *user) {
                Some(vt) => {
                    let justifying =
                        justifying_membership(&memberships, main, substitute, vt.source, vt.target);
                    admit(&mut allocation, vt.target, justifying);
                }
                None => admit(&mut allocation, *user, Some(*membership)),
            }
        }
        Ok(allocation)
    }

    fn poll_will_have_voters<S: EntityStore>(&self, store: &S) -> Result<bool, RegisterError> {
        let roles = resolve_roles(store, self.meeting, &[MAIN_ROLE_ID, SUBSTITUTE_ROLE_ID])?;
        let eligible = potential_voters(store, self.meeting)?;
        Ok(store
            .memberships(self.meeting)?
            .iter()
            .any(|m| m.has_role(roles[0].id) && eligible.contains(&m.user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;
    use voteroll_store::MembershipStore;

    #[test]
    fn test_transfer_replaces_source() {
        let fx = Fixture::new(MainSubstDelegatePolicy::NAME);
        let main = fx.role("main");
        let subst = fx.role("substitute");
        let group = fx.group("delegation", Some(2));
        let (a, b, c) = (fx.voter(1), fx.voter(2), fx.voter(3));
        fx.member(&group, a, Some(&main));
        fx.member(&group, b, Some(&main));
        let c_subst = fx.member(&group, c, Some(&subst));
        let policy = MainSubstDelegatePolicy::new(fx.meeting);

        assert_eq!(
            policy.get_voters(&fx.store, false).unwrap(),
            BTreeMap::from([(a, 1), (b, 1)])
        );

        policy.transfers().create_transfer(&fx.store, a, c).unwrap();
        assert_eq!(
            policy.get_voters(&fx.store, true).unwrap(),
            BTreeMap::from([(b, 1), (c, 1)])
        );
        assert_eq!(fx.store.get_membership(c_subst.id).unwrap().votes, Some(1));
    }

    #[test]
    fn test_only_potential_voters_hold_main_votes() {
        let fx = Fixture::new(MainSubstDelegatePolicy::NAME);
        let main = fx.role("main");
        let subst = fx.role("substitute");
        let group = fx.group("delegation", Some(2));
        let a = fx.voter(1);
        let outsider = UserId::new(2);
        let target = UserId::new(3);
        fx.member(&group, a, Some(&main));
        fx.member(&group, outsider, Some(&main));
        fx.member(&group, target, Some(&subst));
        let policy = MainSubstDelegatePolicy::new(fx.meeting);
        assert!(policy.poll_will_have_voters(&fx.store).unwrap());

        // The target votes on the source's behalf without being a potential voter.
        policy.transfers().create_transfer(&fx.store, a, target).unwrap();
        assert_eq!(
            policy.get_voters(&fx.store, false).unwrap(),
            BTreeMap::from([(target, 1)])
        );
    }

    #[test]
    fn test_no_main_holders_means_no_voters() {
        let fx = Fixture::new(MainSubstDelegatePolicy::NAME);
        fx.role("main");
        let subst = fx.role("substitute");
        let group = fx.group("delegation", Some(2));
        fx.member(&group, fx.voter(1), Some(&subst));
        let policy = MainSubstDelegatePolicy::new(fx.meeting);
        assert!(!policy.poll_will_have_voters(&fx.store).unwrap());
        assert!(policy.get_voters(&fx.store, false).unwrap().is_empty());
    }

    #[test]
    fn test_missing_substitute_role_fails_both_ways() {
        let fx = Fixture::new(MainSubstDelegatePolicy::NAME);
        let main = fx.role("main");
        let group = fx.group("delegation", Some(1));
        fx.member(&group, fx.voter(1), Some(&main));
        let policy = MainSubstDelegatePolicy::new(fx.meeting);
        assert!(matches!(
            policy.poll_will_have_voters(&fx.store),
            Err(RegisterError::Configuration(_))
        ));
        assert!(matches!(
            policy.get_voters(&fx.store, false),
            Err(RegisterError::Configuration(_))
        ));
    }
}
