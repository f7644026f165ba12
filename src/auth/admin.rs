//! Admin user directory: merged profile/email listing with search and sorting.

use log::{error, info, warn};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::auth::backend::AuthBackend;
use crate::auth::errors::AuthError;
use crate::auth::notify::{Notice, NoticeSender};
use crate::auth::types::Profile;
use uuid::Uuid;

/// A profile with the account email when the backend is willing to share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUserProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Username,
    CreatedAt,
    Plan,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "username" => Ok(SortField::Username),
            "created_at" | "created-at" | "created" => Ok(SortField::CreatedAt),
            "plan" => Ok(SortField::Plan),
            other => Err(format!("unknown sort field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Sort column state as driven by header clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sorting {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sorting {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Asc,
        }
    }
}

impl Sorting {
    /// Clicking the active column flips the order; another column starts ascending.
    pub fn toggle(self, field: SortField) -> Self {
        if self.field == field {
            Self {
                field,
                order: self.order.flipped(),
            }
        } else {
            Self {
                field,
                order: SortOrder::Asc,
            }
        }
    }
}

/// Case-insensitive substring match over username, full name, email and plan.
pub fn matches_query(user: &AdminUserProfile, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let hay = [
        Some(user.profile.username.as_str()),
        user.profile.full_name.as_deref(),
        user.email.as_deref(),
        Some(user.profile.plan.as_str()),
    ];
    hay.iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn compare(a: &AdminUserProfile, b: &AdminUserProfile, field: SortField) -> Ordering {
    match field {
        SortField::Username => a
            .profile
            .username
            .to_lowercase()
            .cmp(&b.profile.username.to_lowercase()),
        SortField::CreatedAt => a.profile.created_at.cmp(&b.profile.created_at),
        SortField::Plan => a.profile.plan.to_lowercase().cmp(&b.profile.plan.to_lowercase()),
    }
}

/// Filter by `query` and sort by `sorting`. Ties keep their input order.
pub fn filter_and_sort<'a>(
    users: &'a [AdminUserProfile],
    query: &str,
    sorting: Sorting,
) -> Vec<&'a AdminUserProfile> {
    let mut out: Vec<&AdminUserProfile> = users.iter().filter(|u| matches_query(u, query)).collect();
    out.sort_by(|a, b| {
        let ord = compare(a, b, sorting.field);
        match sorting.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    out
}

/// Number of users on each plan.
pub fn plan_counts(users: &[AdminUserProfile]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for user in users {
        *counts.entry(user.profile.plan.clone()).or_insert(0) += 1;
    }
    counts
}

/// Fetch every profile and attach emails when the account listing is allowed.
///
/// A refused account listing degrades to profiles without emails; a failed profile
/// listing is an error and raises a destructive notice.
pub async fn load_directory<B: AuthBackend>(
    backend: &B,
    notices: &NoticeSender,
) -> Result<Vec<AdminUserProfile>, AuthError> {
    let profiles = backend.list_profiles().await.map_err(|e| {
        error!("Error fetching users: {}", e);
        notices.send(Notice::destructive("Error fetching users", "Please try again later."));
        e
    })?;
    let users = match backend.list_users().await {
        Ok(users) => users,
        Err(e) => {
            warn!("Account listing unavailable, showing profiles only: {}", e);
            Vec::new()
        }
    };
    Ok(profiles
        .into_iter()
        .map(|profile| {
            let email = users.iter().find(|u| u.id == profile.id).map(|u| u.email.clone());
            AdminUserProfile { profile, email }
        })
        .collect())
}

/// Move a user to another plan and patch the loaded directory entry in place.
///
/// The directory is left untouched when the backend refuses the change.
pub async fn change_plan<B: AuthBackend>(
    backend: &B,
    notices: &NoticeSender,
    users: &mut [AdminUserProfile],
    user_id: Uuid,
    plan: &str,
) -> Result<Profile, AuthError> {
    match backend.update_plan(user_id, plan).await {
        Ok(profile) => {
            if let Some(entry) = users.iter_mut().find(|u| u.profile.id == user_id) {
                entry.profile = profile.clone();
            }
            info!("Directory entry {} now on plan {}", user_id, profile.plan);
            notices.send(Notice::info(
                "Plan updated",
                &format!("User's plan has been updated to {}.", profile.plan),
            ));
            Ok(profile)
        }
        Err(e) => {
            error!("Error updating plan for {}: {}", user_id, e);
            notices.send(Notice::destructive("Error updating plan", "Please try again later."));
            Err(e)
        }
    }
}
