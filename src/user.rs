use crate::{Capabilities, Id};
use serde_derive::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};

/// The identity of an account, as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub name: String,
    pub phone: String,
    /// May this user offer rides?
    #[serde(default)]
    pub is_driver: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    /// Everything this user is allowed to do.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_user(self)
    }

    /// The name to greet the user with, falling back to `"User"` when the
    /// account has no name.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("User")
    }
}

/// The profile submitted when creating a new account.
#[derive(Clone, PartialEq, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub is_driver: bool,
}

impl Debug for Registration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("is_driver", &self.is_driver)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_role_flags_default_to_passenger() {
        let src = r#"{
            "id": "7",
            "email": "asha@pes.edu",
            "name": "Asha Rao",
            "phone": "9999999999"
        }"#;

        let got: User = serde_json::from_str(src).unwrap();

        assert!(!got.is_driver);
        assert!(!got.is_admin);
        assert_eq!(got.created_at, None);
    }

    #[test]
    fn greet_by_first_name() {
        let mut user: User = serde_json::from_str(
            r#"{"id": "1", "email": "a@b.c", "name": "Asha Rao", "phone": ""}"#,
        )
        .unwrap();
        assert_eq!(user.first_name(), "Asha");

        user.name = String::from("   ");
        assert_eq!(user.first_name(), "User");
    }

    #[test]
    fn registration_debug_hides_the_password() {
        let registration = Registration {
            name: String::from("Asha Rao"),
            email: String::from("asha@pes.edu"),
            phone: String::from("9999999999"),
            password: String::from("hunter2"),
            is_driver: true,
        };

        let got = format!("{:?}", registration);

        assert!(!got.contains("hunter2"));
        assert!(got.contains("asha@pes.edu"));
    }
}
