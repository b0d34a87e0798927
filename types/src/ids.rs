//! Numeric identifiers for every entity in a meeting.
//!
//! Ids are assigned by the host store and are stable for the lifetime of the
//! entity. Their numeric order is used as the deterministic fallback order
//! wherever no better priority signal exists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| TypesError::InvalidId {
                        kind: $label,
                        value: s.to_string(),
                    })
            }
        }
    };
}

entity_id!(
    /// Identifies a meeting (the root aggregate).
    MeetingId,
    "meeting"
);
entity_id!(
    /// Identifies a participant.
    UserId,
    "user"
);
entity_id!(
    /// Identifies a group within a meeting.
    GroupId,
    "group"
);
entity_id!(
    /// Identifies a group role definition within a meeting.
    RoleId,
    "role"
);
entity_id!(MembershipId, "membership");
entity_id!(TransferId, "transfer");
entity_id!(
    /// Identifies an electoral register snapshot.
    RegisterId,
    "register"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_user_id() {
        assert_eq!("42".parse::<UserId>().unwrap(), UserId::new(42));
        assert_eq!(" 7 ".parse::<GroupId>().unwrap(), GroupId::new(7));
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "abc".parse::<UserId>().unwrap_err();
        assert_eq!(err.to_string(), "invalid user id: abc");
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&UserId::new(5)).unwrap();
        assert_eq!(json, "5");
    }
}
