//! Session-aware auth state shared with the rest of the application.
//!
//! The provider mirrors the backend's current session into an [`AuthState`], keeps the
//! admin flag in step with it, and turns backend failures into [`Notice`]s.

use log::{error, info, warn};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::backend::AuthBackend;
use crate::auth::errors::AuthError;
use crate::auth::notify::{Notice, NoticeSender};
use crate::auth::types::{AuthEvent, AuthState, Metadata, Profile, Role, Session, UserRole};

pub struct AuthProvider<B: AuthBackend> {
    backend: B,
    state: RwLock<AuthState>,
    notices: NoticeSender,
}

impl<B: AuthBackend> AuthProvider<B> {
    /// Starts in the loading state; call [`initialize`](Self::initialize) next.
    pub fn new(backend: B, notices: NoticeSender) -> Self {
        Self {
            backend,
            state: RwLock::new(AuthState::default()),
            notices,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Subscribe before `initialize` so no session change is missed.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.backend.subscribe()
    }

    pub async fn snapshot(&self) -> AuthState {
        self.state.read().await.clone()
    }

    /// Load any existing session and settle the loading flag.
    pub async fn initialize(&self) {
        let session = match self.backend.current_session().await {
            Ok(session) => session,
            Err(e) => {
                error!("Error loading session: {}", e);
                None
            }
        };
        let user_id = session.as_ref().map(|s| s.user.id);
        {
            let mut state = self.state.write().await;
            apply_session(&mut state, session);
            state.is_loading = false;
        }
        if let Some(id) = user_id {
            self.check_is_admin(id).await;
        }
    }

    /// Ask the backend whether `user_id` is an admin and record the answer.
    ///
    /// Any backend error counts as "not admin". The flag is only written while
    /// `user_id` is still the signed-in user.
    pub async fn check_is_admin(&self, user_id: Uuid) -> bool {
        let is_admin = match self.backend.has_role(user_id, Role::Admin).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Error checking admin status: {}", e);
                false
            }
        };
        let mut state = self.state.write().await;
        if state.user.as_ref().map(|u| u.id) == Some(user_id) {
            state.is_admin = is_admin;
        }
        is_admin
    }

    pub async fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) => {
                let id = session.user.id;
                apply_session(&mut *self.state.write().await, Some(session));
                self.check_is_admin(id).await;
            }
            AuthEvent::SignedOut => {
                apply_session(&mut *self.state.write().await, None);
            }
        }
    }

    /// Apply every event already queued on `rx`. Returns how many were handled.
    pub async fn drain_events(&self, rx: &mut broadcast::Receiver<AuthEvent>) -> usize {
        let mut handled = 0;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    self.handle_event(event).await;
                    handled += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Auth event stream lagged, {} event(s) skipped", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        handled
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        match self.backend.sign_in(email, password).await {
            Ok(session) => {
                self.handle_event(AuthEvent::SignedIn(session)).await;
                Ok(())
            }
            Err(e) => {
                self.notices.send(Notice::destructive("Login failed", &e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str, metadata: Metadata) -> Result<(), AuthError> {
        match self.backend.sign_up(email, password, metadata).await {
            Ok(user) => {
                info!("Registration accepted for {}", user.id);
                self.notices.send(Notice::info(
                    "Registration successful",
                    "Please check your email to confirm your account.",
                ));
                Ok(())
            }
            Err(e) => {
                self.notices
                    .send(Notice::destructive("Registration failed", &e.to_string()));
                Err(e)
            }
        }
    }

    /// Sign out. Failures are reported as a notice, never returned.
    pub async fn sign_out(&self) {
        match self.backend.sign_out().await {
            Ok(()) => self.handle_event(AuthEvent::SignedOut).await,
            Err(e) => {
                self.notices.send(Notice::destructive("Sign out failed", &e.to_string()));
            }
        }
    }

    /// Profile of the signed-in user; `None` when signed out or on backend error.
    pub async fn get_profile(&self) -> Option<Profile> {
        let user_id = self.state.read().await.user.as_ref().map(|u| u.id)?;
        match self.backend.fetch_profile(user_id).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                error!("Error fetching profile: {}", e);
                None
            }
        }
    }

    /// Roles of the signed-in user; empty when signed out or on backend error.
    pub async fn get_user_roles(&self) -> Vec<UserRole> {
        let Some(user_id) = self.state.read().await.user.as_ref().map(|u| u.id) else {
            return Vec::new();
        };
        match self.backend.fetch_user_roles(user_id).await {
            Ok(roles) => roles,
            Err(e) => {
                error!("Error fetching user roles: {}", e);
                Vec::new()
            }
        }
    }
}

fn apply_session(state: &mut AuthState, session: Option<Session>) {
    state.user = session.as_ref().map(|s| s.user.clone());
    if state.user.is_none() {
        state.is_admin = false;
    }
    state.session = session;
}
