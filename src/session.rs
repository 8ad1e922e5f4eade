mod claims;
mod store;

pub use claims::{access_expiry, is_usable_at};
pub use store::{FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};

use tracing::{info, warn};

use crate::api::types::{Role, User};
use crate::api::Backend;
use crate::error::{Error, Result};

/// What `bootstrap` found in the token store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// nothing stored
    NoToken,
    /// stored access token expired or unreadable; no request was made
    Expired,
    /// profile fetch failed
    Rejected,
    /// profile fetched, session live
    Restored,
}

type Observer = Box<dyn FnMut(Option<&User>)>;

/// The client's belief about who is logged in.
///
/// Holds the token pair in memory, mirrors it into a [`TokenStore`], and is
/// the only writer of that store. `current_user` is `Some` only while an
/// access token is held.
pub struct Session<S: TokenStore> {
    store: S,
    tokens: Option<TokenPair>,
    user: Option<User>,
    ready: bool,
    observers: Vec<Observer>,
}

impl<S: TokenStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            tokens: None,
            user: None,
            ready: false,
            observers: Vec::new(),
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and(self.tokens.as_ref())
            .map(|t| t.access.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.refresh.as_str())
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    /// False until `bootstrap` (or a login/register) has settled the session.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a callback run after every session transition.
    pub fn on_change(&mut self, observer: impl FnMut(Option<&User>) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Access token and user together, or `Unauthenticated`.
    pub fn require(&self) -> Result<(&str, &User)> {
        match (self.tokens.as_ref(), self.user.as_ref()) {
            (Some(tokens), Some(user)) => Ok((tokens.access.as_str(), user)),
            _ => Err(Error::Unauthenticated),
        }
    }

    pub fn bootstrap(&mut self, api: &impl Backend) -> Bootstrap {
        self.bootstrap_at(api, chrono::Utc::now().timestamp())
    }

    /// Restores the session from the store, validating the access token's
    /// expiry locally before spending a request on the profile.
    pub fn bootstrap_at(&mut self, api: &impl Backend, now: i64) -> Bootstrap {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "token store unreadable, starting logged out");
                None
            }
        };

        let Some(tokens) = stored else {
            self.ready = true;
            self.notify();
            return Bootstrap::NoToken;
        };

        if !is_usable_at(&tokens.access, now) {
            info!("stored access token expired");
            self.logout();
            return Bootstrap::Expired;
        }

        match api.me(&tokens.access) {
            Ok(user) => {
                info!(username = %user.username, role = %user.role, "session restored");
                self.tokens = Some(tokens);
                self.user = Some(user);
                self.ready = true;
                self.notify();
                Bootstrap::Restored
            }
            Err(e) => {
                info!(error = %e, "stored token rejected");
                self.logout();
                Bootstrap::Rejected
            }
        }
    }

    /// Logs in and fetches the profile. A failed profile fetch fails the login
    /// and leaves nothing stored.
    pub fn login(&mut self, api: &impl Backend, username: &str, password: &str) -> Result<User> {
        let tokens = api.login(username, password)?;
        let tokens = TokenPair {
            access: tokens.access,
            refresh: tokens.refresh,
        };

        let user = match self.persist(&tokens).and_then(|_| api.me(&tokens.access)) {
            Ok(user) => user,
            Err(e) => {
                self.logout();
                return Err(e);
            }
        };

        info!(username = %user.username, "logged in");
        self.establish(tokens, user.clone());
        Ok(user)
    }

    /// Registers; the user in the response is used directly.
    pub fn register(
        &mut self,
        api: &impl Backend,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User> {
        let registration = api.register(username, email, password, role)?;
        let tokens = TokenPair {
            access: registration.access,
            refresh: registration.refresh,
        };

        if let Err(e) = self.persist(&tokens) {
            self.logout();
            return Err(e);
        }

        info!(username = %registration.user.username, role = %role, "registered");
        self.establish(tokens, registration.user.clone());
        Ok(registration.user)
    }

    /// Clears tokens and user. Never fails; storage errors are only logged.
    pub fn logout(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear token store");
        }
        if self.user.is_some() {
            info!("logged out");
        }
        self.tokens = None;
        self.user = None;
        self.ready = true;
        self.notify();
    }

    pub fn check_expiry(&mut self) -> bool {
        self.check_expiry_at(chrono::Utc::now().timestamp())
    }

    /// On-demand validation: an expired access token ends the session.
    /// Returns whether a usable session remains. There is no refresh exchange.
    pub fn check_expiry_at(&mut self, now: i64) -> bool {
        let usable = match self.tokens.as_ref() {
            None => return false,
            Some(tokens) => is_usable_at(&tokens.access, now),
        };
        if usable {
            return self.user.is_some();
        }

        info!("access token expired, session ended");
        self.logout();
        false
    }

    /// Ends the session when a request reports the token is no longer accepted.
    pub fn observe_failure(&mut self, error: &Error) {
        if matches!(error, Error::Status { status: 401, .. }) && self.user.is_some() {
            info!("server rejected access token");
            self.logout();
        }
    }

    fn persist(&mut self, tokens: &TokenPair) -> Result<()> {
        self.store.save(tokens)
    }

    fn establish(&mut self, tokens: TokenPair, user: User) {
        self.tokens = Some(tokens);
        self.user = Some(user);
        self.ready = true;
        self.notify();
    }

    fn notify(&mut self) {
        let user = self.user.as_ref();
        for observer in self.observers.iter_mut() {
            observer(user);
        }
    }
}
