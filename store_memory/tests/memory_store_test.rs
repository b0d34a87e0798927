//! Behavior of the in-memory store: constraints, effective roles, events
//! and snapshot files.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use voteroll_store::{
    ActiveUserStore, GroupStore, MeetingStore, MembershipStore, RegisterStore, StoreError,
    StoreEvent, VoteTransferStore,
};
use voteroll_store_memory::{MeetingSnapshot, MemoryStore};
use voteroll_types::{MeetingId, MeetingRole, Timestamp, UserId};

fn user(n: u64) -> UserId {
    UserId::new(1000 + n)
}

fn recorded(store: &MemoryStore) -> Arc<Mutex<Vec<StoreEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    store.subscribe(Box::new(move |event| sink.lock().unwrap().push(event.clone())));
    events
}

#[test]
fn group_roles_grant_potential_voter_only_while_active() {
    let store = MemoryStore::new();
    let meeting = store.create_meeting("annual");
    let main = store
        .create_group_role(meeting.id, "main", &[MeetingRole::PotentialVoter])
        .unwrap();
    let group = store.create_group(meeting.id, "voters", Some(2)).unwrap();
    store.add_membership(group.id, user(1), Some(main.id)).unwrap();
    store
        .assign_meeting_roles(meeting.id, user(2), &[MeetingRole::PotentialVoter])
        .unwrap();

    let voters = store
        .users_with_role(meeting.id, MeetingRole::PotentialVoter)
        .unwrap();
    assert_eq!(voters.into_iter().collect::<Vec<_>>(), vec![user(2)]);

    let mut m = store.get_meeting(meeting.id).unwrap();
    m.group_roles_active = true;
    store.put_meeting(&m).unwrap();
    let voters = store
        .users_with_role(meeting.id, MeetingRole::PotentialVoter)
        .unwrap();
    assert_eq!(voters.into_iter().collect::<Vec<_>>(), vec![user(1), user(2)]);
    assert!(store
        .meeting_roles(meeting.id, user(1))
        .unwrap()
        .contains(&MeetingRole::PotentialVoter));
}

#[test]
fn duplicate_membership_is_rejected() {
    let store = MemoryStore::new();
    let meeting = store.create_meeting("m");
    let group = store.create_group(meeting.id, "g", None).unwrap();
    store.add_membership(group.id, user(1), None).unwrap();
    let err = store.add_membership(group.id, user(1), None).unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[test]
fn transfers_form_a_matching() {
    let store = MemoryStore::new();
    let meeting = store.create_meeting("m");
    let vt = store.create_transfer(meeting.id, user(1), user(2)).unwrap();

    let same_source = store.create_transfer(meeting.id, user(1), user(3));
    assert!(matches!(same_source, Err(StoreError::Constraint(_))));
    let same_target = store.create_transfer(meeting.id, user(4), user(2));
    assert!(matches!(same_target, Err(StoreError::Constraint(_))));
    let to_self = store.create_transfer(meeting.id, user(5), user(5));
    assert!(matches!(to_self, Err(StoreError::Constraint(_))));

    // Updating the existing transfer does not conflict with itself.
    let updated = store.update_transfer(vt.id, user(1), user(3)).unwrap();
    assert_eq!(updated.target, user(3));
    store.create_transfer(meeting.id, user(4), user(2)).unwrap();
    assert_eq!(store.transfers(meeting.id).unwrap().len(), 2);
}

#[test]
fn active_log_is_append_once_per_user() {
    let store = MemoryStore::new();
    let meeting = store.create_meeting("m");
    assert!(store.mark_active(meeting.id, user(2), Timestamp::new(5)).unwrap());
    assert!(store.mark_active(meeting.id, user(1), Timestamp::new(6)).unwrap());
    assert!(!store.mark_active(meeting.id, user(2), Timestamp::new(7)).unwrap());

    let log: Vec<_> = store
        .active_users(meeting.id)
        .unwrap()
        .into_iter()
        .map(|a| (a.user, a.created))
        .collect();
    assert_eq!(log, vec![(user(2), Timestamp::new(5)), (user(1), Timestamp::new(6))]);

    assert!(store.mark_inactive(meeting.id, user(2)).unwrap());
    assert!(!store.mark_inactive(meeting.id, user(2)).unwrap());
    assert_eq!(store.active_users(meeting.id).unwrap().len(), 1);
}

#[test]
fn every_write_emits_one_event() {
    let store = MemoryStore::new();
    let meeting = store.create_meeting("m");
    let group = store.create_group(meeting.id, "g", Some(1)).unwrap();
    let events = recorded(&store);

    let membership = store.add_membership(group.id, user(1), None).unwrap();
    store.set_membership_votes(membership.id, Some(1)).unwrap();
    store.set_membership_votes(membership.id, None).unwrap();
    store.remove_membership(membership.id).unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], StoreEvent::MembershipAdded { .. }));
    assert_eq!(
        events[1],
        StoreEvent::MembershipVotesChanged {
            meeting: meeting.id,
            membership: membership.id,
            user: user(1),
            group: group.id,
            old: None,
            new: Some(1),
        }
    );
    assert!(matches!(
        events[2],
        StoreEvent::MembershipVotesChanged { old: Some(1), new: None, .. }
    ));
    assert!(matches!(events[3], StoreEvent::MembershipRemoved { .. }));
}

#[test]
fn register_becomes_latest() {
    let store = MemoryStore::new();
    let meeting = store.create_meeting("m");
    assert!(store.latest_register(meeting.id).unwrap().is_none());

    let first = store
        .create_register(meeting.id, "skk_kfum", Timestamp::new(1), BTreeMap::new())
        .unwrap();
    let second = store
        .create_register(
            meeting.id,
            "skk_kfum",
            Timestamp::new(2),
            BTreeMap::from([(user(1), 2)]),
        )
        .unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(store.latest_register(meeting.id).unwrap(), Some(second.clone()));
    assert_eq!(store.get_meeting(meeting.id).unwrap().latest_register, Some(second.id));
    assert_eq!(store.registers(meeting.id).unwrap().len(), 2);
}

#[test]
fn snapshot_file_round_trip() {
    let store = MemoryStore::new();
    let meeting = store.create_meeting("snap");
    let main = store
        .create_group_role(meeting.id, "main", &[MeetingRole::PotentialVoter])
        .unwrap();
    let group = store.create_group(meeting.id, "voters", Some(3)).unwrap();
    store.add_membership(group.id, user(1), Some(main.id)).unwrap();
    store.mark_active(meeting.id, user(1), Timestamp::new(3)).unwrap();
    store
        .assign_meeting_roles(meeting.id, user(9), &[MeetingRole::Moderator])
        .unwrap();

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("meeting.json");
    store.snapshot(meeting.id).unwrap().write_file(&path).unwrap();

    let loaded = MemoryStore::new();
    let id = loaded
        .load_snapshot(MeetingSnapshot::read_file(&path).unwrap())
        .unwrap();
    assert_eq!(id, meeting.id);
    assert_eq!(loaded.snapshot(id).unwrap(), store.snapshot(meeting.id).unwrap());

    // Fresh ids never collide with loaded ones.
    let extra = loaded.create_group(id, "extra", None).unwrap();
    assert!(extra.id > group.id);
    assert!(loaded.group_by_key(id, "voters").is_some());
    assert_eq!(loaded.groups(id).unwrap().len(), 2);
}

#[test]
fn snapshot_with_duplicate_targets_is_rejected() {
    let json = r#"{
        "meeting": {"id": 1},
        "transfers": [
            {"id": 2, "meeting": 1, "source": 10, "target": 20},
            {"id": 3, "meeting": 1, "source": 11, "target": 20}
        ]
    }"#;
    let snapshot = MeetingSnapshot::from_json_str(json).unwrap();
    let err = MemoryStore::new().load_snapshot(snapshot).unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));
}

#[test]
fn snapshot_active_log_must_be_append_once() {
    let duplicate = r#"{
        "meeting": {"id": 1},
        "active_users": [
            {"meeting": 1, "user": 7, "created": 1},
            {"meeting": 1, "user": 8, "created": 2},
            {"meeting": 1, "user": 7, "created": 3}
        ]
    }"#;
    let snapshot = MeetingSnapshot::from_json_str(duplicate).unwrap();
    let store = MemoryStore::new();
    let err = store.load_snapshot(snapshot).unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
    assert!(store.get_meeting(MeetingId::new(1)).is_err());

    let foreign = r#"{
        "meeting": {"id": 1},
        "active_users": [
            {"meeting": 1, "user": 7, "created": 1},
            {"meeting": 99, "user": 8, "created": 2}
        ]
    }"#;
    let snapshot = MeetingSnapshot::from_json_str(foreign).unwrap();
    let err = MemoryStore::new().load_snapshot(snapshot).unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));
}
