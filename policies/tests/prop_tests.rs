use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use voteroll_nullables::NullClock;
use voteroll_store::{
    ActiveUserStore, GroupStore, MeetingStore, MembershipStore, VoteTransferStore,
};
use voteroll_store_memory::MemoryStore;
use voteroll_policies::{
    ElectoralRegisterPolicy, MainAndSubstTransfers, MainSubstActivePolicy,
    MainSubstDelegatePolicy, RegionalCouncilPolicy, SkkFumPolicy,
};
use voteroll_types::{GroupId, MeetingId, MeetingRole, Timestamp, UserId};

/// A randomly populated meeting: groups with capacity and memberships with
/// one of the dialect's roles (or none).
#[derive(Clone, Debug)]
struct Layout {
    capacities: Vec<u32>,
    /// (group index, user, role index) where role index 0 means no role.
    memberships: Vec<(usize, u64, usize)>,
    active: Vec<u64>,
    tracking: bool,
}

fn layout() -> impl Strategy<Value = Layout> {
    (
        prop::collection::vec(0u32..5, 1..4),
        prop::collection::vec((0usize..4, 1u64..9, 0usize..4), 0..16),
        prop::collection::vec(1u64..9, 0..9),
        any::<bool>(),
    )
        .prop_map(|(capacities, memberships, active, tracking)| Layout {
            memberships: memberships
                .into_iter()
                .map(|(g, u, r)| (g % capacities.len(), u, r))
                .collect(),
            capacities,
            active,
            tracking,
        })
}

fn build(layout: &Layout, role_ids: &[&str]) -> (MemoryStore, MeetingId, Vec<GroupId>) {
    let store = MemoryStore::new();
    let mut meeting = store.create_meeting("prop");
    meeting.active_users_enabled = layout.tracking;
    store.put_meeting(&meeting).unwrap();
    let roles: Vec<_> = role_ids
        .iter()
        .map(|r| store.create_group_role(meeting.id, r, &[]).unwrap())
        .collect();
    let groups: Vec<GroupId> = layout
        .capacities
        .iter()
        .enumerate()
        .map(|(i, c)| {
            store
                .create_group(meeting.id, &format!("g{i}"), Some(*c))
                .unwrap()
                .id
        })
        .collect();
    let mut seen = BTreeSet::new();
    for (g, u, r) in &layout.memberships {
        if !seen.insert((*g, *u)) {
            continue;
        }
        let role = r.checked_sub(1).and_then(|i| roles.get(i)).map(|r| r.id);
        store
            .add_membership(groups[*g], UserId::new(*u), role)
            .unwrap();
    }
    for u in 1..9 {
        if u % 4 != 0 {
            store
                .assign_meeting_roles(meeting.id, UserId::new(u), &[MeetingRole::PotentialVoter])
                .unwrap();
        }
    }
    for (t, u) in layout.active.iter().enumerate() {
        store
            .mark_active(meeting.id, UserId::new(*u), Timestamp::new(t as u64))
            .unwrap();
    }
    (store, meeting.id, groups)
}

/// A regional council meeting: the hub plus one tagged group per layout
/// group, alternating municipality and region. Groups with capacity 0
/// delegate to the first group, capacity 1 delegates to the hub. Each group
/// gets at most one member and each user sits in at most one group.
fn build_regional(layout: &Layout) -> (MemoryStore, MeetingId) {
    let store = MemoryStore::new();
    let mut meeting = store.create_meeting("council");
    meeting.active_users_enabled = layout.tracking;
    store.put_meeting(&meeting).unwrap();
    let hub = store.create_group(meeting.id, "skr", None).unwrap();
    let mut groups = Vec::new();
    for (i, capacity) in layout.capacities.iter().enumerate() {
        let mut group = store.create_group(meeting.id, &format!("g{i}"), None).unwrap();
        let tag = if i % 2 == 0 { "municipality" } else { "region" };
        group.tags.insert(tag.to_string());
        group.delegate_to = match (i, capacity) {
            (0, _) => None,
            (_, 0) => Some(groups[0]),
            (_, 1) => Some(hub.id),
            _ => None,
        };
        store.put_group(&group).unwrap();
        groups.push(group.id);
    }
    let mut filled = BTreeSet::new();
    let mut placed = BTreeSet::new();
    for (g, u, r) in &layout.memberships {
        let group = if *r == 0 { hub.id } else { groups[*g] };
        if filled.contains(&group) || placed.contains(u) {
            continue;
        }
        store.add_membership(group, UserId::new(*u), None).unwrap();
        filled.insert(group);
        placed.insert(*u);
    }
    for u in 1..9 {
        if u % 4 != 0 {
            store
                .assign_meeting_roles(meeting.id, UserId::new(u), &[MeetingRole::PotentialVoter])
                .unwrap();
        }
    }
    for (t, u) in layout.active.iter().enumerate() {
        store
            .mark_active(meeting.id, UserId::new(*u), Timestamp::new(t as u64))
            .unwrap();
    }
    (store, meeting.id)
}

/// Audit votes handed out per group after `get_voters(update_memberships)`.
fn group_totals(store: &MemoryStore, groups: &[GroupId]) -> Vec<(u32, u32)> {
    groups
        .iter()
        .map(|g| {
            let used = store
                .group_memberships(*g)
                .unwrap()
                .iter()
                .filter_map(|m| m.votes)
                .sum();
            (used, store.get_group(*g).unwrap().capacity())
        })
        .collect()
}

proptest! {
    /// Capacity bound, at-most-once and weight 1 for the active-ordered
    /// main/substitute allocator.
    #[test]
    fn main_subst_active_respects_capacity(layout in layout()) {
        let (store, meeting, groups) = build(&layout, &["main", "substitute", "other"]);
        let policy = MainSubstActivePolicy::new(meeting);
        let voters = policy.get_voters(&store, true).unwrap();

        prop_assert!(voters.values().all(|w| *w == 1));
        for (used, capacity) in group_totals(&store, &groups) {
            prop_assert!(used <= capacity);
        }
        let annotated: Vec<UserId> = store
            .memberships(meeting)
            .unwrap()
            .into_iter()
            .filter(|m| m.votes.is_some())
            .map(|m| m.user)
            .collect();
        let unique: BTreeSet<_> = annotated.iter().copied().collect();
        prop_assert_eq!(annotated.len(), unique.len());
        prop_assert_eq!(unique, voters.keys().copied().collect::<BTreeSet<_>>());
    }

    /// Three-tier allocation never exceeds capacity or two votes per user.
    #[test]
    fn skk_fum_respects_capacity_and_cap(layout in layout()) {
        let (store, meeting, groups) = build(&layout, &["del_2", "del_1", "suppleant"]);
        let policy = SkkFumPolicy::new(meeting);
        let voters = policy.get_voters(&store, true).unwrap();

        prop_assert!(voters.values().all(|w| (1..=2).contains(w)));
        for (used, capacity) in group_totals(&store, &groups) {
            prop_assert!(used <= capacity);
        }
        let eligible = store.users_with_role(meeting, MeetingRole::PotentialVoter).unwrap();
        prop_assert!(voters.keys().all(|u| eligible.contains(u)));
    }

    /// Repeated computation is stable and the audit write does not change
    /// the result.
    #[test]
    fn get_voters_is_idempotent(layout in layout()) {
        let (store, meeting, _) = build(&layout, &["del_2", "del_1", "suppleant"]);
        let skk = SkkFumPolicy::new(meeting);
        let first = skk.get_voters(&store, false).unwrap();
        prop_assert_eq!(&skk.get_voters(&store, true).unwrap(), &first);
        prop_assert_eq!(&skk.get_voters(&store, false).unwrap(), &first);

        let (store, meeting, _) = build(&layout, &["main", "substitute"]);
        let active = MainSubstActivePolicy::new(meeting);
        let first = active.get_voters(&store, false).unwrap();
        prop_assert_eq!(&active.get_voters(&store, true).unwrap(), &first);
        prop_assert_eq!(&active.get_voters(&store, false).unwrap(), &first);
    }

    /// Transfers change who votes, never the stability of the result.
    #[test]
    fn main_subst_delegate_is_idempotent(
        layout in layout(),
        pairs in prop::collection::vec((1u64..9, 1u64..9), 0..8),
    ) {
        let (store, meeting, _) = build(&layout, &["main", "substitute"]);
        let policy = MainSubstDelegatePolicy::new(meeting);
        for (source, target) in pairs {
            let _ = policy
                .transfers()
                .create_transfer(&store, UserId::new(source), UserId::new(target));
        }
        let first = policy.get_voters(&store, false).unwrap();
        prop_assert!(first.values().all(|w| *w == 1));
        prop_assert_eq!(&policy.get_voters(&store, true).unwrap(), &first);
        prop_assert_eq!(&policy.get_voters(&store, false).unwrap(), &first);
    }

    /// The regional council result is stable and unaffected by its own
    /// audit write.
    #[test]
    fn regional_council_is_idempotent(layout in layout()) {
        let (store, meeting) = build_regional(&layout);
        let policy = RegionalCouncilPolicy::new(meeting, "skr");
        let first = policy.get_voters(&store, false).unwrap();
        prop_assert_eq!(&policy.get_voters(&store, true).unwrap(), &first);
        prop_assert_eq!(&policy.get_voters(&store, false).unwrap(), &first);
        prop_assert!(first.values().all(|w| *w > 0));
    }

    /// Registers are only recreated when the weights change.
    #[test]
    fn create_er_reuses_fresh_register(layout in layout()) {
        let (store, meeting, _) = build(&layout, &["main", "substitute"]);
        let policy = MainSubstActivePolicy::new(meeting);
        let clock = NullClock::ticking(100);
        let first = policy.create_er(&store, &clock, false).unwrap();
        let again = policy.create_er(&store, &clock, false).unwrap();
        prop_assert_eq!(first.id, again.id);
        let forced = policy.create_er(&store, &clock, true).unwrap();
        prop_assert_ne!(first.id, forced.id);
        prop_assert_eq!(first.weight_dict, forced.weight_dict);
    }

    /// Whatever sequence of transfer operations is attempted, transfers
    /// stay a matching.
    #[test]
    fn transfers_stay_unique(
        layout in layout(),
        ops in prop::collection::vec((0u8..3, 1u64..9, 1u64..9, 0usize..4), 0..24),
    ) {
        let (store, meeting, _) = build(&layout, &["main", "substitute"]);
        let transfers = MainAndSubstTransfers::new(meeting);
        for (op, source, target, pick) in ops {
            let (source, target) = (UserId::new(source), UserId::new(target));
            let existing = store.transfers(meeting).unwrap();
            let chosen = existing.get(pick % existing.len().max(1)).map(|vt| vt.id);
            let _ = match (op, chosen) {
                (0, _) => transfers.create_transfer(&store, source, target).map(|_| ()),
                (1, Some(id)) => transfers.update_transfer(&store, id, source, target).map(|_| ()),
                (2, Some(id)) => transfers.delete_transfer(&store, id).map(|_| ()),
                _ => Ok(()),
            };
        }
        let all = store.transfers(meeting).unwrap();
        let mut slots: BTreeMap<(bool, UserId), usize> = BTreeMap::new();
        for vt in &all {
            *slots.entry((true, vt.source)).or_default() += 1;
            *slots.entry((false, vt.target)).or_default() += 1;
        }
        prop_assert!(slots.values().all(|n| *n == 1));
        let involved: BTreeSet<UserId> = all.iter().flat_map(|vt| [vt.source, vt.target]).collect();
        prop_assert_eq!(involved.len(), all.len() * 2);
    }
}
