//! Viewer identity and privilege level.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Privilege level the server assigns after the username handshake.
///
/// On the wire this is the integer `0` or `1`; any other value is rejected
/// when the `connected` message is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum UserRank {
    /// Must queue for a turn before sending input.
    RegularUser = 0,
    /// Has permanent control and bypasses turn arbitration.
    AdminUser = 1,
}

impl UserRank {
    /// Returns `true` if this rank may send input without holding the turn.
    pub fn bypasses_turn(self) -> bool {
        match self {
            UserRank::RegularUser => false,
            UserRank::AdminUser => true,
        }
    }
}

/// Error returned when a wire integer is not a known rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownRank(pub u8);

impl fmt::Display for UnknownRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown user rank: {}", self.0)
    }
}

impl std::error::Error for UnknownRank {}

impl TryFrom<u8> for UserRank {
    type Error = UnknownRank;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UserRank::RegularUser),
            1 => Ok(UserRank::AdminUser),
            other => Err(UnknownRank(other)),
        }
    }
}

impl From<UserRank> for u8 {
    fn from(rank: UserRank) -> Self {
        rank as u8
    }
}

impl fmt::Display for UserRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRank::RegularUser => write!(f, "regular"),
            UserRank::AdminUser => write!(f, "admin"),
        }
    }
}

/// A viewer as seen by the server.  Value semantics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub rank: UserRank,
}

impl User {
    pub fn new(username: impl Into<String>, rank: UserRank) -> Self {
        Self {
            username: username.into(),
            rank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_from_wire_integer() {
        assert_eq!(UserRank::try_from(0), Ok(UserRank::RegularUser));
        assert_eq!(UserRank::try_from(1), Ok(UserRank::AdminUser));
        assert_eq!(UserRank::try_from(2), Err(UnknownRank(2)));
    }

    #[test]
    fn test_rank_into_wire_integer() {
        assert_eq!(u8::from(UserRank::RegularUser), 0);
        assert_eq!(u8::from(UserRank::AdminUser), 1);
    }

    #[test]
    fn test_only_admin_bypasses_turn() {
        assert!(UserRank::AdminUser.bypasses_turn());
        assert!(!UserRank::RegularUser.bypasses_turn());
    }

    #[test]
    fn test_users_compare_by_value() {
        let a = User::new("rgb", UserRank::RegularUser);
        let b = User::new("rgb".to_string(), UserRank::RegularUser);
        assert_eq!(a, b);
        assert_ne!(a, User::new("rgb", UserRank::AdminUser));
    }
}
