//! Admin dashboard views.
//!
//! Users and subscriptions are fetched wholesale from the backend and then
//! searched, sorted and paginated here.

use std::cmp::Ordering;

use serde::Serialize;
use uuid::Uuid;

use crate::defaults::DASHBOARD_PAGE_SIZE;
use crate::error::{Error, Result};
use crate::filter::SortDirection;
use crate::models::{Subscription, SubscriptionStatus, UserProfile, UserRole};
use crate::pagination::{PageRequest, PageWindow};

/// One page of a dashboard table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPage<T> {
    pub items: Vec<T>,
    pub pagination: PageWindow,
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> DashboardPage<T> {
    let window = PageWindow::new(page, items.len() as u64);
    let items = items
        .into_iter()
        .skip(window.offset() as usize)
        .take(window.page_size as usize)
        .collect();
    DashboardPage {
        items,
        pagination: window,
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn dashboard_page(page: Option<i64>, page_size: Option<i64>) -> PageRequest {
    PageRequest::new(page.unwrap_or(1), page_size.unwrap_or(DASHBOARD_PAGE_SIZE as i64))
}

// =============================================================================
// USERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    CreatedAt,
    Email,
    Name,
}

impl std::str::FromStr for UserSortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "created_at" => Ok(Self::CreatedAt),
            "email" => Ok(Self::Email),
            "name" | "full_name" => Ok(Self::Name),
            other => Err(Error::InvalidInput(format!(
                "unknown user sort field '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserQuery {
    /// Case-insensitive match against email and full name.
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub sort: UserSortField,
    pub direction: SortDirection,
    pub page: PageRequest,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            search: None,
            role: None,
            sort: UserSortField::CreatedAt,
            direction: SortDirection::Desc,
            page: dashboard_page(None, None),
        }
    }
}

impl UserQuery {
    pub fn with_page(mut self, page: Option<i64>, page_size: Option<i64>) -> Self {
        self.page = dashboard_page(page, page_size);
        self
    }
}

pub fn query_users(users: Vec<UserProfile>, query: &UserQuery) -> DashboardPage<UserProfile> {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut matched: Vec<UserProfile> = users
        .into_iter()
        .filter(|u| query.role.map_or(true, |r| u.role == r))
        .filter(|u| match &needle {
            Some(n) => {
                u.email.to_lowercase().contains(n)
                    || u.full_name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(n))
            }
            None => true,
        })
        .collect();

    matched.sort_by(|a, b| {
        let ordering = match query.sort {
            UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            UserSortField::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
            UserSortField::Name => a
                .display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase()),
        };
        directed(ordering, query.direction)
    });

    paginate(matched, query.page)
}

// =============================================================================
// SUBSCRIPTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionSortField {
    StartsAt,
    EndsAt,
    Plan,
}

impl std::str::FromStr for SubscriptionSortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "starts_at" => Ok(Self::StartsAt),
            "ends_at" => Ok(Self::EndsAt),
            "plan" => Ok(Self::Plan),
            other => Err(Error::InvalidInput(format!(
                "unknown subscription sort field '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionQuery {
    pub status: Option<SubscriptionStatus>,
    pub user_id: Option<Uuid>,
    /// Case-insensitive plan name match.
    pub plan: Option<String>,
    pub sort: SubscriptionSortField,
    pub direction: SortDirection,
    pub page: PageRequest,
}

impl Default for SubscriptionQuery {
    fn default() -> Self {
        Self {
            status: None,
            user_id: None,
            plan: None,
            sort: SubscriptionSortField::StartsAt,
            direction: SortDirection::Desc,
            page: dashboard_page(None, None),
        }
    }
}

impl SubscriptionQuery {
    pub fn with_page(mut self, page: Option<i64>, page_size: Option<i64>) -> Self {
        self.page = dashboard_page(page, page_size);
        self
    }
}

pub fn query_subscriptions(
    subscriptions: Vec<Subscription>,
    query: &SubscriptionQuery,
) -> DashboardPage<Subscription> {
    let plan = query
        .plan
        .as_deref()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty());

    let mut matched: Vec<Subscription> = subscriptions
        .into_iter()
        .filter(|s| query.status.map_or(true, |st| s.status == st))
        .filter(|s| query.user_id.map_or(true, |id| s.user_id == id))
        .filter(|s| plan.as_ref().map_or(true, |p| s.plan.to_lowercase().contains(p)))
        .collect();

    matched.sort_by(|a, b| {
        let ordering = match query.sort {
            SubscriptionSortField::StartsAt => a.starts_at.cmp(&b.starts_at),
            // Open-ended subscriptions sort after every dated one.
            SubscriptionSortField::EndsAt => match (a.ends_at, b.ends_at) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SubscriptionSortField::Plan => a.plan.cmp(&b.plan),
        };
        directed(ordering, query.direction)
    });

    paginate(matched, query.page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn users() -> Vec<UserProfile> {
        let base = Utc::now();
        ["ann@example.org", "bob@example.org", "cleo@courts.example"]
            .iter()
            .enumerate()
            .map(|(i, email)| UserProfile {
                id: Uuid::new_v4(),
                email: email.to_string(),
                full_name: (i == 1).then(|| "Robert Otieno".to_string()),
                role: if i == 0 { UserRole::Admin } else { UserRole::Member },
                created_at: base + Duration::minutes(i as i64),
            })
            .collect()
    }

    #[test]
    fn test_users_default_newest_first() {
        let page = query_users(users(), &UserQuery::default());
        assert_eq!(page.items[0].email, "cleo@courts.example");
        assert_eq!(page.pagination.total_rows, 3);
        assert_eq!(page.pagination.page_size, DASHBOARD_PAGE_SIZE);
    }

    #[test]
    fn test_users_search_and_role() {
        let query = UserQuery {
            search: Some("ROBERT".into()),
            ..Default::default()
        };
        let page = query_users(users(), &query);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].email, "bob@example.org");

        let query = UserQuery {
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        assert_eq!(query_users(users(), &query).items[0].email, "ann@example.org");
    }

    #[test]
    fn test_users_paginate_and_clamp() {
        let query = UserQuery {
            sort: UserSortField::Email,
            direction: SortDirection::Asc,
            ..Default::default()
        }
        .with_page(Some(9), Some(2));
        let page = query_users(users(), &query);
        assert_eq!(page.pagination.current_page, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].email, "cleo@courts.example");
    }

    #[test]
    fn test_subscriptions_filter_and_sort() {
        let user = Uuid::new_v4();
        let now = Utc::now();
        let make = |plan: &str, status: SubscriptionStatus, ends: Option<i64>| Subscription {
            id: Uuid::new_v4(),
            user_id: user,
            plan: plan.into(),
            status,
            starts_at: now,
            ends_at: ends.map(|d| now + Duration::days(d)),
        };
        let subs = vec![
            make("annual", SubscriptionStatus::Active, None),
            make("monthly", SubscriptionStatus::Active, Some(30)),
            make("monthly", SubscriptionStatus::Expired, Some(-1)),
        ];

        let query = SubscriptionQuery {
            status: Some(SubscriptionStatus::Active),
            sort: SubscriptionSortField::EndsAt,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let page = query_subscriptions(subs.clone(), &query);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].plan, "monthly");
        assert_eq!(page.items[1].ends_at, None);

        let query = SubscriptionQuery {
            plan: Some("Month".into()),
            ..Default::default()
        };
        assert_eq!(query_subscriptions(subs, &query).items.len(), 2);
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!("email".parse::<UserSortField>().unwrap(), UserSortField::Email);
        assert!("age".parse::<UserSortField>().is_err());
        assert_eq!(
            "ends_at".parse::<SubscriptionSortField>().unwrap(),
            SubscriptionSortField::EndsAt
        );
    }
}
