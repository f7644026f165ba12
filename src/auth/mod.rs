//! Authentication: backend seam, session-aware provider, notices and route guards.
//!
//! ```rust,no_run
//! use lifeleveler::auth::{notice_channel, AuthProvider, LocalAuthBackend, Metadata};
//!
//! # async fn demo() -> Result<(), lifeleveler::auth::AuthError> {
//! let (notices, _rx) = notice_channel();
//! let provider = AuthProvider::new(LocalAuthBackend::new(), notices);
//! provider.initialize().await;
//! provider.sign_up("hero@example.com", "hunter22", Metadata::new()).await?;
//! provider.sign_in("hero@example.com", "hunter22").await?;
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod backend;
pub mod errors;
pub mod guard;
pub mod notify;
pub mod provider;
pub mod types;

pub use admin::{
    change_plan, filter_and_sort, load_directory, matches_query, plan_counts, AdminUserProfile, SortField,
    SortOrder, Sorting,
};
pub use backend::{AuthBackend, LocalAuthBackend, DEFAULT_PLAN};
pub use errors::AuthError;
pub use guard::{authorize, Access, GuardLevel, Route};
pub use notify::{notice_channel, Notice, NoticeSender, NoticeVariant};
pub use provider::AuthProvider;
pub use types::{AuthEvent, AuthState, Metadata, Profile, Role, Session, User, UserRole};
