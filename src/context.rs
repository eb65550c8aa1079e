//! Process-wide authentication state.
//!
//! A [`SessionContext`] is the single source of truth for who is logged in.
//! It owns the [`CredentialStore`], and every change to the logged-in user
//! goes through one of its entry points: [`SessionContext::initialize()`],
//! [`SessionContext::login()`], [`SessionContext::register()`],
//! [`SessionContext::logout()`], or eviction by the [`ApiClient`] when the
//! server stops accepting our token.
//!
//! Each entry point updates the in-memory session and the persisted record
//! while holding the same lock, so nobody can observe a token without the
//! identity it belongs to.

use crate::{
    endpoints, ApiClient, ApiError, Capabilities, Capability, CredentialStore,
    Id, Registration, Session, StorageError, User,
};
use parking_lot::Mutex;
use std::{
    fmt::{self, Debug, Formatter},
    future::Future,
    sync::Arc,
};
use tokio::sync::broadcast;

tokio::task_local! {
    static CURRENT: Arc<SessionContext>;
}

/// How many unread [`AuthEvent`]s a slow subscriber may fall behind by.
const EVENT_BACKLOG: usize = 16;

/// Something that happened to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    LoggedIn(Id),
    LoggedOut,
    /// The server rejected our token and the session was thrown away.
    Expired,
}

/// What the rest of the application may assume about the current user.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// A stored session is being checked with the server, it is not yet
    /// known whether anybody is logged in.
    Loading,
    Authenticated(User),
    Anonymous,
}

/// A point-in-time copy of the session's observable state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The logged-in user. While `loading` this is the identity cached by
    /// a previous run, which has not been verified yet.
    pub user: Option<User>,
    pub loading: bool,
}

#[derive(Debug, Default)]
struct State {
    session: Option<Session>,
    loading: bool,
    /// Bumped on every change, so late verification results can tell
    /// whether the session they were checking is still the current one.
    generation: u64,
}

impl State {
    fn replace(&mut self, session: Option<Session>) {
        self.session = session;
        self.loading = false;
        self.generation += 1;
    }

    fn auth_state(&self) -> AuthState {
        match (&self.session, self.loading) {
            (_, true) => AuthState::Loading,
            (Some(session), false) => {
                AuthState::Authenticated(session.user.clone())
            },
            (None, false) => AuthState::Anonymous,
        }
    }
}

/// Shared authentication state.
pub struct SessionContext {
    store: Box<dyn CredentialStore>,
    state: Mutex<State>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionContext {
    /// Create an empty context backed by `store`.
    ///
    /// Nothing is read from the store until [`SessionContext::initialize()`]
    /// is called.
    pub fn new<S>(store: S) -> Arc<SessionContext>
    where
        S: CredentialStore + 'static,
    {
        let (events, _) = broadcast::channel(EVENT_BACKLOG);

        Arc::new(SessionContext {
            store: Box::new(store),
            state: Mutex::new(State::default()),
            events,
        })
    }

    /// Restore the session saved by a previous run and check it is still
    /// valid.
    ///
    /// The cached identity is exposed straight away and the context reports
    /// [`AuthState::Loading`] until the server has answered. If the server
    /// does not confirm the token, the session is thrown away.
    pub async fn initialize(&self, client: &ApiClient) -> AuthState {
        let generation = {
            let mut state = self.state.lock();

            match self.store.load() {
                Ok(Some(session)) => {
                    log::debug!(
                        "Restored a cached session for {}",
                        session.user.email
                    );
                    state.replace(Some(session));
                    state.loading = true;
                    state.generation
                },
                Ok(None) => {
                    state.replace(None);
                    return AuthState::Anonymous;
                },
                Err(StorageError::Io(e)) => {
                    // the record may be fine, we just can't get at it
                    log::warn!("Unable to read the stored credentials: {}", e);
                    state.replace(None);
                    return AuthState::Anonymous;
                },
                Err(e) => {
                    log::warn!("Discarding unreadable credentials: {}", e);
                    if let Err(e) = self.store.clear() {
                        log::error!("Unable to remove credentials: {}", e);
                    }
                    state.replace(None);
                    return AuthState::Anonymous;
                },
            }
        };

        let verified = endpoints::me(client).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            log::debug!("The session changed while it was being verified");
            return state.auth_state();
        }

        match verified {
            Ok(user) => {
                if let Some(session) = state.session.as_mut() {
                    session.user = user;
                    if let Err(e) = self.store.save(session) {
                        log::warn!("Unable to refresh the cached user: {}", e);
                    }
                }
                state.loading = false;
                state.auth_state()
            },
            Err(e) => {
                log::warn!("The stored session failed verification: {}", e);
                self.discard(&mut state);
                drop(state);
                self.publish(AuthEvent::Expired);
                AuthState::Anonymous
            },
        }
    }

    /// Log in with an email address and password.
    ///
    /// If the server refuses, its error is returned and the current session
    /// is left exactly as it was.
    pub async fn login(
        &self,
        client: &ApiClient,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let session = endpoints::login(client, email, password).await?;
        self.establish(session)
    }

    /// Create a new account and log straight into it.
    pub async fn register(
        &self,
        client: &ApiClient,
        registration: &Registration,
    ) -> Result<User, ApiError> {
        let session = endpoints::register(client, registration).await?;
        self.establish(session)
    }

    /// Forget the current user.
    ///
    /// The in-memory session is always cleared, even when removing the
    /// persisted record fails.
    pub fn logout(&self) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        let was_logged_in = state.session.is_some();
        state.replace(None);
        let cleared = self.store.clear();
        drop(state);

        if was_logged_in {
            log::info!("Logged out");
        }
        self.publish(AuthEvent::LoggedOut);

        cleared
    }

    /// Throw the session away because the server rejected `token`.
    ///
    /// A rejection for a token which has since been replaced by a login or
    /// logout is ignored.
    pub(crate) fn evict(&self, token: Option<&str>) {
        let mut state = self.state.lock();

        let current = self.store.token().unwrap_or_else(|e| {
            log::warn!("Unable to read the stored token: {}", e);
            state.session.as_ref().map(|s| s.token.clone())
        });
        if current.as_deref() != token {
            log::debug!("Ignoring a rejection for a token that was replaced");
            return;
        }

        self.discard(&mut state);
        drop(state);

        log::info!("The session has expired");
        self.publish(AuthEvent::Expired);
    }

    fn establish(&self, session: Session) -> Result<User, ApiError> {
        let user = session.user.clone();

        let mut state = self.state.lock();
        self.store.save(&session)?;
        state.replace(Some(session));
        drop(state);

        log::info!("Logged in as {}", user.email);
        self.publish(AuthEvent::LoggedIn(user.id.clone()));

        Ok(user)
    }

    fn discard(&self, state: &mut State) {
        if let Err(e) = self.store.clear() {
            log::error!("Unable to remove the stored credentials: {}", e);
        }
        state.replace(None);
    }

    fn publish(&self, event: AuthEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }

    /// The token requests should be authenticated with, as currently
    /// persisted.
    ///
    /// Stores replace the token and user together, so this doesn't need the
    /// state lock.
    pub(crate) fn stored_token(&self) -> Option<String> {
        match self.store.token() {
            Ok(token) => token,
            Err(e) => {
                log::warn!("Unable to read the stored token: {}", e);
                None
            },
        }
    }

    pub fn user(&self) -> Option<User> {
        self.state.lock().session.as_ref().map(|s| s.user.clone())
    }

    pub fn is_loading(&self) -> bool { self.state.lock().loading }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();

        Snapshot {
            user: state.session.as_ref().map(|s| s.user.clone()),
            loading: state.loading,
        }
    }

    pub fn state(&self) -> AuthState { self.state.lock().auth_state() }

    /// What the current user may do. Nobody may do anything while the
    /// session is still being verified.
    pub fn capabilities(&self) -> Capabilities {
        match self.state() {
            AuthState::Authenticated(user) => user.capabilities(),
            AuthState::Loading | AuthState::Anonymous => Capabilities::NONE,
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(capability)
    }

    /// Get notified whenever the session changes.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Make this context available to everything `task` calls through
    /// [`SessionContext::current()`].
    pub async fn scope<F>(self: Arc<Self>, task: F) -> F::Output
    where
        F: Future,
    {
        CURRENT.scope(self, task).await
    }

    /// The context installed by the enclosing [`SessionContext::scope()`].
    ///
    /// # Panics
    ///
    /// Calling this outside a scope is a wiring mistake, so it panics instead
    /// of handing out an empty session. Use [`SessionContext::try_current()`]
    /// if you need to check.
    pub fn current() -> Arc<SessionContext> {
        match SessionContext::try_current() {
            Ok(context) => context,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_current() -> Result<Arc<SessionContext>, MissingProvider> {
        CURRENT.try_with(Arc::clone).map_err(|_| MissingProvider)
    }
}

impl Debug for SessionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();

        f.debug_struct("SessionContext")
            .field("session", &state.session)
            .field("loading", &state.loading)
            .finish()
    }
}

/// The session was requested outside of [`SessionContext::scope()`].
#[derive(Debug, Copy, Clone, PartialEq, thiserror::Error)]
#[error("The session context was used outside of SessionContext::scope()")]
pub struct MissingProvider;
