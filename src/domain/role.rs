use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of actor. Each role has its own signing secret and its own
/// backing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Captain,
}

impl Role {
    /// Key under which the actor is returned in JSON responses.
    pub fn key(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Captain => "captain",
        }
    }

    /// Message for a valid token whose subject is gone.
    pub fn not_found_message(&self) -> &'static str {
        match self {
            Role::User => "User not found",
            Role::Captain => "Captain not found",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Captain).unwrap(), "\"captain\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
