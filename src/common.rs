use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

pub type NotificationId = i64;

/// Identity of the signed-in user. `0` means nobody is signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    pub const ANONYMOUS: UserId = UserId(0);

    pub fn is_present(self) -> bool {
        self.0 != 0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
