//! Authentication backends.
//!
//! [`AuthBackend`] is the seam to whatever service owns accounts. [`LocalAuthBackend`]
//! keeps accounts in process with argon2-hashed passwords, which is enough for a
//! single-user install and for tests.

use argon2::{Algorithm, Argon2, Version};
use chrono::{Duration, Utc};
use log::{debug, info, warn};
use password_hash::{PasswordHasher, PasswordVerifier};
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::types::{AuthEvent, Metadata, Profile, Role, Session, User, UserRole};
use crate::config::AuthConfig;
use crate::logutil::loggable;

pub const DEFAULT_PLAN: &str = "free";

#[allow(async_fn_in_trait)]
pub trait AuthBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Register an account. Does not sign the new user in.
    async fn sign_up(&self, email: &str, password: &str, metadata: Metadata) -> Result<User, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The live session, if any. Expired sessions are reported as `None`.
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, AuthError>;

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Profile, AuthError>;

    async fn fetch_user_roles(&self, user_id: Uuid) -> Result<Vec<UserRole>, AuthError>;

    async fn list_profiles(&self) -> Result<Vec<Profile>, AuthError>;

    /// Account records with emails. May be refused to non-admin callers.
    async fn list_users(&self) -> Result<Vec<User>, AuthError>;

    /// Set a user's plan. Admin only, like `list_users`.
    async fn update_plan(&self, user_id: Uuid, plan: &str) -> Result<Profile, AuthError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

struct Account {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Directory {
    /// Keyed by lowercased email.
    accounts: HashMap<String, Account>,
    profiles: HashMap<Uuid, Profile>,
    roles: Vec<UserRole>,
    session: Option<Session>,
}

impl Directory {
    fn user_exists(&self, user_id: Uuid) -> bool {
        self.accounts.values().any(|a| a.user.id == user_id)
    }

    /// The signed-in caller must hold the admin role.
    fn require_admin(&self) -> Result<Uuid, AuthError> {
        let Some(session) = self.session.as_ref() else {
            return Err(AuthError::NotAuthenticated);
        };
        let caller = session.user.id;
        if !self.roles.iter().any(|r| r.user_id == caller && r.role == Role::Admin) {
            return Err(AuthError::Backend("User not allowed".to_string()));
        }
        Ok(caller)
    }
}

pub struct LocalAuthBackend {
    argon2: Argon2<'static>,
    directory: RwLock<Directory>,
    events: broadcast::Sender<AuthEvent>,
    session_ttl: Duration,
    min_password_length: usize,
}

impl Default for LocalAuthBackend {
    fn default() -> Self {
        Self::with_config(&AuthConfig::default())
    }
}

impl LocalAuthBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &AuthConfig) -> Self {
        let argon2 = match config.argon2.as_ref().and_then(|a| a.params()) {
            Some(p) => Argon2::new(Algorithm::Argon2id, Version::V0x13, p),
            None => Argon2::default(),
        };
        let (events, _) = broadcast::channel(32);
        Self {
            argon2,
            directory: RwLock::new(Directory::default()),
            events,
            session_ttl: Duration::minutes(i64::from(config.session_ttl_minutes)),
            min_password_length: config.min_password_length,
        }
    }

    /// Give a registered user an extra role. Granting an existing role is a no-op.
    pub async fn grant_role(&self, user_id: Uuid, role: Role) -> Result<UserRole, AuthError> {
        let mut dir = self.directory.write().await;
        if !dir.user_exists(user_id) {
            return Err(AuthError::UnknownUser(user_id.to_string()));
        }
        if let Some(existing) = dir.roles.iter().find(|r| r.user_id == user_id && r.role == role) {
            return Ok(existing.clone());
        }
        let granted = UserRole {
            id: Uuid::new_v4(),
            user_id,
            role,
            created_at: Utc::now(),
        };
        dir.roles.push(granted.clone());
        info!("Granted role {} to {}", role, user_id);
        Ok(granted)
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = password_hash::SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        let parsed = password_hash::PasswordHash::new(stored)
            .map_err(|e| AuthError::PasswordHash(format!("Corrupt password hash: {e}")))?;
        Ok(self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
    }

    fn publish(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail(raw.trim().to_string()))
    }
}

impl AuthBackend for LocalAuthBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let key = email.trim().to_lowercase();
        let mut dir = self.directory.write().await;
        let Some(account) = dir.accounts.get(&key) else {
            debug!("sign_in: unknown email {}", loggable(&key));
            return Err(AuthError::InvalidCredentials);
        };
        if !self.verify_password(password, &account.password_hash)? {
            warn!("sign_in: bad password for {}", loggable(&key));
            return Err(AuthError::InvalidCredentials);
        }
        let session = Session {
            access_token: Uuid::new_v4().simple().to_string(),
            user: account.user.clone(),
            expires_at: Utc::now() + self.session_ttl,
        };
        dir.session = Some(session.clone());
        drop(dir);

        info!("User {} signed in", session.user.id);
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: Metadata) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < self.min_password_length {
            return Err(AuthError::WeakPassword {
                min: self.min_password_length,
            });
        }
        let password_hash = self.hash_password(password)?;

        let mut dir = self.directory.write().await;
        if dir.accounts.contains_key(&email) {
            return Err(AuthError::UserExists(email));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.clone(),
            created_at: now,
            metadata,
        };
        let username = user
            .metadata
            .get("username")
            .filter(|u| !u.trim().is_empty())
            .map(|u| u.trim().to_string())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        let profile = Profile {
            id: user.id,
            username,
            full_name: user.metadata.get("full_name").cloned(),
            avatar_url: user.metadata.get("avatar_url").cloned(),
            plan: DEFAULT_PLAN.to_string(),
            created_at: now,
            updated_at: now,
        };
        dir.profiles.insert(user.id, profile);
        dir.roles.push(UserRole {
            id: Uuid::new_v4(),
            user_id: user.id,
            role: Role::User,
            created_at: now,
        });
        dir.accounts.insert(
            email.clone(),
            Account {
                user: user.clone(),
                password_hash,
            },
        );
        info!("Registered {} ({})", loggable(&email), user.id);
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = self.directory.write().await.session.take();
        if let Some(session) = previous {
            info!("User {} signed out", session.user.id);
            self.publish(AuthEvent::SignedOut);
        }
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let mut dir = self.directory.write().await;
        if dir.session.as_ref().is_some_and(|s| s.is_expired(Utc::now())) {
            debug!("Session expired");
            dir.session = None;
        }
        Ok(dir.session.clone())
    }

    async fn has_role(&self, user_id: Uuid, role: Role) -> Result<bool, AuthError> {
        let dir = self.directory.read().await;
        Ok(dir.roles.iter().any(|r| r.user_id == user_id && r.role == role))
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Profile, AuthError> {
        let dir = self.directory.read().await;
        dir.profiles
            .get(&user_id)
            .cloned()
            .ok_or_else(|| AuthError::UnknownUser(user_id.to_string()))
    }

    async fn fetch_user_roles(&self, user_id: Uuid) -> Result<Vec<UserRole>, AuthError> {
        let dir = self.directory.read().await;
        Ok(dir.roles.iter().filter(|r| r.user_id == user_id).cloned().collect())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, AuthError> {
        let dir = self.directory.read().await;
        Ok(dir.profiles.values().cloned().collect())
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let dir = self.directory.read().await;
        dir.require_admin()?;
        Ok(dir.accounts.values().map(|a| a.user.clone()).collect())
    }

    async fn update_plan(&self, user_id: Uuid, plan: &str) -> Result<Profile, AuthError> {
        let mut dir = self.directory.write().await;
        let caller = dir.require_admin()?;
        let profile = dir
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AuthError::UnknownUser(user_id.to_string()))?;
        profile.plan = plan.trim().to_lowercase();
        profile.updated_at = Utc::now();
        info!("Plan for {} set to {} by {}", user_id, loggable(&profile.plan), caller);
        Ok(profile.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
