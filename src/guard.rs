//! Checks protecting the parts of the application that need a logged-in
//! user.

use crate::{AuthState, Capability, Route, SessionContext};

/// A requirement on the current session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Anybody who is logged in.
    Authenticated,
    /// Logged in, and allowed to do something in particular.
    Capability(Capability),
}

/// What to do about a protected page.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The session is still being verified. Show something neutral and ask
    /// again later.
    Placeholder,
    Render,
    Redirect(Route),
}

impl Guard {
    pub fn evaluate(self, state: &AuthState) -> Decision {
        match (self, state) {
            // never redirect before we know who the user is
            (_, AuthState::Loading) => Decision::Placeholder,
            (_, AuthState::Anonymous) => Decision::Redirect(Route::Login),
            (Guard::Authenticated, AuthState::Authenticated(_)) => {
                Decision::Render
            },
            (Guard::Capability(required), AuthState::Authenticated(user)) => {
                if user.capabilities().contains(required) {
                    Decision::Render
                } else {
                    Decision::Redirect(Route::Home)
                }
            },
        }
    }

    pub fn check(self, context: &SessionContext) -> Decision {
        self.evaluate(&context.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::User;

    fn user(is_driver: bool) -> User {
        User {
            id: "9".into(),
            email: String::from("ravi@pes.edu"),
            name: String::from("Ravi"),
            phone: String::from("1234567890"),
            is_driver,
            is_admin: false,
            created_at: None,
        }
    }

    const GUARDS: [Guard; 3] = [
        Guard::Authenticated,
        Guard::Capability(Capability::PostRides),
        Guard::Capability(Capability::ViewMetrics),
    ];

    #[test]
    fn never_redirect_while_loading() {
        for guard in GUARDS.iter() {
            assert_eq!(guard.evaluate(&AuthState::Loading), Decision::Placeholder);
        }
    }

    #[test]
    fn anonymous_users_are_sent_to_login() {
        for guard in GUARDS.iter() {
            assert_eq!(
                guard.evaluate(&AuthState::Anonymous),
                Decision::Redirect(Route::Login)
            );
        }
    }

    #[test]
    fn passengers_cannot_post_rides() {
        let state = AuthState::Authenticated(user(false));

        assert_eq!(Guard::Authenticated.evaluate(&state), Decision::Render);
        assert_eq!(
            Guard::Capability(Capability::PostRides).evaluate(&state),
            Decision::Redirect(Route::Home)
        );
    }

    #[test]
    fn drivers_can_post_rides() {
        let state = AuthState::Authenticated(user(true));

        assert_eq!(
            Guard::Capability(Capability::PostRides).evaluate(&state),
            Decision::Render
        );
    }
}
