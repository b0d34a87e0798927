use proptest::prelude::*;

use voteroll_types::{GroupId, Timestamp, UserId};

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// elapsed_since never underflows.
    #[test]
    fn timestamp_elapsed_saturates(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let elapsed = Timestamp::new(a).elapsed_since(Timestamp::new(b));
        prop_assert_eq!(elapsed, b.saturating_sub(a));
    }

    /// Id ordering follows the raw numeric order, which is the fallback
    /// priority order for allocation.
    #[test]
    fn user_id_ordering(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(UserId::new(a) < UserId::new(b), a < b);
    }

    /// Display and FromStr agree.
    #[test]
    fn group_id_display_parses_back(raw in any::<u64>()) {
        let id = GroupId::new(raw);
        let parsed: GroupId = id.to_string().parse().unwrap();
        prop_assert_eq!(parsed, id);
    }
}
