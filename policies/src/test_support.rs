//! Meeting fixtures for the policy unit tests.

use voteroll_nullables::NullClock;
use voteroll_store::{ActiveUserStore, GroupStore, MeetingStore, MembershipStore};
use voteroll_store_memory::MemoryStore;
use voteroll_types::{
    Group, GroupId, GroupRole, Meeting, MeetingId, MeetingRole, Membership, UserId,
};

pub(crate) struct Fixture {
    pub store: MemoryStore,
    pub meeting: MeetingId,
    pub clock: NullClock,
}

impl Fixture {
    pub fn new(policy: &str) -> Self {
        let store = MemoryStore::new();
        let meeting = store.create_meeting("fixture").with_policy(policy);
        store.put_meeting(&meeting).unwrap();
        Self {
            meeting: meeting.id,
            store,
            clock: NullClock::ticking(1_700_000_000),
        }
    }

    pub fn meeting(&self) -> Meeting {
        self.store.get_meeting(self.meeting).unwrap()
    }

    pub fn role(&self, role_id: &str) -> GroupRole {
        self.store
            .create_group_role(self.meeting, role_id, &[])
            .unwrap()
    }

    pub fn group(&self, key: &str, votes: Option<u32>) -> Group {
        self.store.create_group(self.meeting, key, votes).unwrap()
    }

    pub fn tagged_group(&self, key: &str, tag: &str) -> Group {
        let mut group = self.group(key, None);
        group.tags.insert(tag.to_string());
        self.store.put_group(&group).unwrap();
        group
    }

    pub fn delegate(&self, from: &Group, to: &Group) {
        let mut group = self.store.get_group(from.id).unwrap();
        group.delegate_to = Some(to.id);
        self.store.put_group(&group).unwrap();
    }

    pub fn set_votes(&self, group: GroupId, votes: Option<u32>) {
        let mut group = self.store.get_group(group).unwrap();
        group.votes = votes;
        self.store.put_group(&group).unwrap();
    }

    /// A new user holding potential-voter status.
    pub fn voter(&self, raw: u64) -> UserId {
        let user = UserId::new(raw);
        self.store
            .assign_meeting_roles(self.meeting, user, &[MeetingRole::PotentialVoter])
            .unwrap();
        user
    }

    pub fn member(&self, group: &Group, user: UserId, role: Option<&GroupRole>) -> Membership {
        self.store
            .add_membership(group.id, user, role.map(|r| r.id))
            .unwrap()
    }

    pub fn enable_active(&self) {
        let mut meeting = self.meeting();
        meeting.active_users_enabled = true;
        self.store.put_meeting(&meeting).unwrap();
    }

    /// Mark users active in the given order.
    pub fn activate(&self, users: &[UserId]) {
        use voteroll_types::Clock;
        for user in users {
            self.store
                .mark_active(self.meeting, *user, self.clock.now())
                .unwrap();
        }
    }

    pub fn deactivate(&self, user: UserId) {
        self.store.mark_inactive(self.meeting, user).unwrap();
    }
}
