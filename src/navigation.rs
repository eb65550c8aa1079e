use crate::{AuthEvent, SessionContext};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// The entry points the session machinery may send somebody to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Ride search, where everyone starts.
    Home,
    Login,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
        }
    }

    /// Where to go after something happens to the session, if anywhere.
    pub fn after(event: &AuthEvent) -> Route {
        match event {
            AuthEvent::LoggedIn(_) | AuthEvent::LoggedOut => Route::Home,
            AuthEvent::Expired => Route::Login,
        }
    }
}

/// Turns session events into navigation requests for whatever is acting as
/// the application's router.
#[derive(Debug)]
pub struct Navigator {
    events: broadcast::Receiver<AuthEvent>,
}

impl Navigator {
    pub fn new(context: &SessionContext) -> Self {
        Navigator {
            events: context.subscribe(),
        }
    }

    /// Wait until the session wants the user somewhere else.
    ///
    /// Returns `None` once the [`SessionContext`] has been dropped.
    pub async fn next(&mut self) -> Option<Route> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(Route::after(&event)),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Missed {} session events", skipped);
                },
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// The most recent navigation request that has not been handled yet,
    /// without waiting.
    ///
    /// Older requests are superseded by newer ones, so only the last matters.
    pub fn pending(&mut self) -> Option<Route> {
        let mut latest = None;

        loop {
            match self.events.try_recv() {
                Ok(event) => latest = Some(Route::after(&event)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => {
                    return latest
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn expiry_sends_people_to_the_login_page() {
        assert_eq!(Route::after(&AuthEvent::Expired), Route::Login);
        assert_eq!(Route::after(&AuthEvent::LoggedOut), Route::Home);
        assert_eq!(Route::Login.path(), "/login");
    }

    #[test]
    fn only_the_latest_request_is_pending() {
        let context = SessionContext::new(MemoryStore::new());
        let mut navigator = Navigator::new(&context);

        assert_eq!(navigator.pending(), None);

        context.logout().unwrap();
        context.evict(None);

        assert_eq!(navigator.pending(), Some(Route::Login));
        assert_eq!(navigator.pending(), None);
    }

    #[tokio::test]
    async fn wait_for_the_next_request() {
        let context = SessionContext::new(MemoryStore::new());
        let mut navigator = Navigator::new(&context);

        context.evict(None);

        assert_eq!(navigator.next().await, Some(Route::Login));
    }
}
