use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    pub fn new_v4() -> Self {
        UserId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

/// Unordered pair of accounts, normalized so that `min() <= max()`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UserPair(UserId, UserId);

impl UserPair {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a < b { Self(a, b) } else { Self(b, a) }
    }

    pub fn min(&self) -> UserId {
        self.0
    }

    pub fn max(&self) -> UserId {
        self.1
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.0 == user || self.1 == user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_direction_independent() {
        let a = UserId::new_v4();
        let b = UserId::new_v4();
        assert_eq!(UserPair::new(a, b), UserPair::new(b, a));
        let pair = UserPair::new(a, b);
        assert!(pair.min() <= pair.max());
        assert!(pair.contains(a) && pair.contains(b));
    }

    #[test]
    fn user_id_round_trips_through_display() {
        let id = UserId::new_v4();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }
}
