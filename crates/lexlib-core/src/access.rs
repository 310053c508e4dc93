//! Access policy.
//!
//! Browsing and search are public. Previewing needs a signed-in user.
//! Downloading needs an admin or a member with an active subscription.
//! Dashboard operations need the admin role.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Subscription, UserProfile};
use crate::traits::AccountDirectory;

/// An authenticated user together with their current subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Viewer {
    pub profile: UserProfile,
    pub subscription: Option<Subscription>,
}

impl Viewer {
    pub fn new(profile: UserProfile, subscription: Option<Subscription>) -> Self {
        Self {
            profile,
            subscription,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.profile.is_admin()
    }

    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| s.is_active(now))
    }

    pub fn can_download(&self, now: DateTime<Utc>) -> bool {
        self.is_admin() || self.has_active_subscription(now)
    }

    pub fn require_download(&self, now: DateTime<Utc>) -> Result<()> {
        if self.can_download(now) {
            Ok(())
        } else {
            Err(Error::Forbidden(
                "an active subscription is required to download documents".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::Forbidden("administrator role required".to_string()))
        }
    }
}

/// Authenticate a bearer token and load the user's subscription.
pub async fn resolve_viewer(accounts: &dyn AccountDirectory, token: &str) -> Result<Viewer> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::Unauthorized("missing access token".to_string()));
    }
    let profile = accounts.authenticate(token).await?;
    let subscription = accounts.subscription_for(profile.id).await?;
    Ok(Viewer::new(profile, subscription))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SubscriptionStatus, UserRole};
    use chrono::Duration;
    use uuid::Uuid;

    fn profile(role: UserRole) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            email: "clerk@example.org".into(),
            full_name: None,
            role,
            created_at: Utc::now(),
        }
    }

    fn subscription(status: SubscriptionStatus, user_id: Uuid) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            user_id,
            plan: "monthly".into(),
            status,
            starts_at: Utc::now() - Duration::days(1),
            ends_at: Some(Utc::now() + Duration::days(29)),
        }
    }

    #[test]
    fn test_admin_downloads_without_subscription() {
        let viewer = Viewer::new(profile(UserRole::Admin), None);
        assert!(viewer.require_download(Utc::now()).is_ok());
        assert!(viewer.require_admin().is_ok());
    }

    #[test]
    fn test_member_needs_active_subscription() {
        let p = profile(UserRole::Member);
        let none = Viewer::new(p.clone(), None);
        assert!(matches!(
            none.require_download(Utc::now()),
            Err(Error::Forbidden(_))
        ));

        let pending = Viewer::new(p.clone(), Some(subscription(SubscriptionStatus::Pending, p.id)));
        assert!(!pending.can_download(Utc::now()));

        let active = Viewer::new(p.clone(), Some(subscription(SubscriptionStatus::Active, p.id)));
        assert!(active.can_download(Utc::now()));
        assert!(!active.can_download(Utc::now() + Duration::days(60)));
    }

    #[test]
    fn test_member_is_not_admin() {
        let viewer = Viewer::new(profile(UserRole::Member), None);
        assert!(matches!(viewer.require_admin(), Err(Error::Forbidden(_))));
    }
}
