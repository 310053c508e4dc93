//! Users, roles and subscriptions.
//!
//! Access tokens are verified by the auth service itself; the profile row
//! (role, display name) is then read with the service key. Users who
//! signed up but have no profile row yet are treated as members.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use lexlib_core::{
    AccountDirectory, Error, Result, Subscription, SubscriptionStatus, UserProfile, UserRole,
};

use crate::client::{BaasClient, AUTH};

const PROFILES: &str = "/rest/v1/profiles";
const SUBSCRIPTIONS: &str = "/rest/v1/subscriptions";

/// The auth service's view of the token's user.
#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl AuthUser {
    fn into_member_profile(self) -> UserProfile {
        let full_name = self
            .user_metadata
            .get("full_name")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        UserProfile {
            id: self.id,
            email: self.email.unwrap_or_default(),
            full_name,
            role: UserRole::Member,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl AccountDirectory for BaasClient {
    #[instrument(skip(self, token), fields(subsystem = "baas", component = "accounts", op = "authenticate", user_id = tracing::field::Empty))]
    async fn authenticate(&self, token: &str) -> Result<UserProfile> {
        let endpoint = format!("{}/user", AUTH);
        let response = self
            .read("authenticate", || {
                self.build_user_request(Method::GET, &endpoint, token)
            })
            .await
            .map_err(|e| match e {
                Error::NotFound(m) | Error::InvalidInput(m) => Error::Unauthorized(m),
                other => other,
            })?;
        let user: AuthUser = Self::json(response).await?;
        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        let response = self
            .read("get_profile", || {
                self.build_request(Method::GET, PROFILES)
                    .query(&[("id", format!("eq.{}", user.id)), ("select", "*".to_string())])
            })
            .await?;
        let profiles: Vec<UserProfile> = Self::json(response).await?;
        match profiles.into_iter().next() {
            Some(profile) => Ok(profile),
            None => {
                debug!("No profile row, using member defaults");
                Ok(user.into_member_profile())
            }
        }
    }

    #[instrument(skip(self), fields(subsystem = "baas", component = "accounts", op = "list_users"))]
    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let response = self
            .read("list_users", || {
                self.build_request(Method::GET, PROFILES)
                    .query(&[("select", "*"), ("order", "created_at.desc")])
            })
            .await?;
        Self::json(response).await
    }

    #[instrument(skip(self), fields(subsystem = "baas", component = "accounts", op = "subscription_for", user_id = %user_id))]
    async fn subscription_for(&self, user_id: Uuid) -> Result<Option<Subscription>> {
        let response = self
            .read("subscription_for", || {
                self.build_request(Method::GET, SUBSCRIPTIONS).query(&[
                    ("user_id", format!("eq.{}", user_id)),
                    ("select", "*".to_string()),
                    ("order", "starts_at.desc".to_string()),
                    ("limit", "1".to_string()),
                ])
            })
            .await?;
        let subscriptions: Vec<Subscription> = Self::json(response).await?;
        Ok(subscriptions.into_iter().next())
    }

    #[instrument(skip(self), fields(subsystem = "baas", component = "accounts", op = "list_subscriptions"))]
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        let response = self
            .read("list_subscriptions", || {
                self.build_request(Method::GET, SUBSCRIPTIONS)
                    .query(&[("select", "*"), ("order", "starts_at.desc")])
            })
            .await?;
        Self::json(response).await
    }

    #[instrument(skip(self), fields(subsystem = "baas", component = "accounts", op = "update_subscription_status", subscription_id = %id))]
    async fn update_subscription_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Subscription> {
        let response = self
            .send(
                self.build_request(Method::PATCH, SUBSCRIPTIONS)
                    .query(&[("id", format!("eq.{}", id))])
                    .header("Prefer", "return=representation")
                    .json(&json!({ "status": status })),
            )
            .await?;
        let updated: Vec<Subscription> = Self::json(response).await?;
        let subscription = updated
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("subscription {}", id)))?;
        info!(status = ?subscription.status, "Subscription status changed");
        Ok(subscription)
    }
}
