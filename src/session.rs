use crate::User;
use std::fmt::{self, Debug, Formatter};

/// An authenticated user together with the bearer token that proves who they
/// are.
///
/// Both halves always travel together, there is no way to hold a token
/// without the identity it was issued for.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl Session {
    pub fn new(user: User, token: impl Into<String>) -> Self {
        Session {
            user,
            token: token.into(),
        }
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_never_show_up_in_logs() {
        let user = User {
            id: "9".into(),
            email: String::from("ravi@pes.edu"),
            name: String::from("Ravi"),
            phone: String::from("1234567890"),
            is_driver: false,
            is_admin: false,
            created_at: None,
        };
        let session = Session::new(user, "SUPER-SECRET-TOKEN");

        let got = format!("{:?}", session);

        assert!(!got.contains("SUPER-SECRET-TOKEN"));
        assert!(got.contains("ravi@pes.edu"));
    }
}
