//! Derived subscription status.
//!
//! Status is computed on every read from `is_active` and the two end
//! timestamps, never persisted. Rule order is first-match-wins and it
//! matters: a deactivated company with a still-future trial date reports
//! `cancelled`, not `trial`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Company;

/// Subscription status of a tenant company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trial,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

/// Derive the subscription status at `now`.
///
/// 1. deactivated companies are `cancelled` regardless of any date;
/// 2. a trial end in the future means `trial`;
/// 3. a subscription end in the past means `expired`;
/// 4. everything else is `active`.
pub fn derive_status(
    is_active: bool,
    trial_ends_at: Option<DateTime<Utc>>,
    subscription_ends_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SubscriptionStatus {
    if !is_active {
        return SubscriptionStatus::Cancelled;
    }
    if let Some(trial_end) = trial_ends_at {
        if trial_end > now {
            return SubscriptionStatus::Trial;
        }
    }
    if let Some(sub_end) = subscription_ends_at {
        if sub_end < now {
            return SubscriptionStatus::Expired;
        }
    }
    SubscriptionStatus::Active
}

/// Whether the subscription ends within the next seven days and is still in
/// the future. Purely a display flag.
pub fn expires_soon(subscription_ends_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match subscription_ends_at {
        Some(end) => end > now && end <= now + Duration::days(7),
        None => false,
    }
}

/// Whole days until the subscription ends, when an end date exists and is
/// still in the future.
pub fn days_remaining(
    subscription_ends_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<i64> {
    subscription_ends_at
        .filter(|end| *end > now)
        .map(|end| (end - now).num_days())
}

/// Subscription view returned by the API. Everything here is derived.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    pub company_id: uuid::Uuid,
    pub status: SubscriptionStatus,
    pub is_active: bool,
    pub plan: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    pub expires_soon: bool,
    pub days_remaining: Option<i64>,
}

impl SubscriptionView {
    pub fn derive(company: &Company, now: DateTime<Utc>) -> Self {
        Self {
            company_id: company.company_id,
            status: derive_status(
                company.is_active,
                company.trial_ends_at,
                company.subscription_ends_at,
                now,
            ),
            is_active: company.is_active,
            plan: company.plan.clone(),
            trial_ends_at: company.trial_ends_at,
            subscription_ends_at: company.subscription_ends_at,
            expires_soon: expires_soon(company.subscription_ends_at, now),
            days_remaining: days_remaining(company.subscription_ends_at, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2025-06-15T12:00:00Z".parse().unwrap()
    }

    fn days(n: i64) -> DateTime<Utc> {
        now() + Duration::days(n)
    }

    #[test]
    fn deactivated_company_is_cancelled() {
        let status = derive_status(false, None, None, now());
        assert_eq!(status, SubscriptionStatus::Cancelled);
    }

    #[test]
    fn cancelled_wins_over_future_trial() {
        // Rule 1 dominates even with a trial still running.
        let status = derive_status(false, Some(days(10)), None, now());
        assert_eq!(status, SubscriptionStatus::Cancelled);
    }

    #[test]
    fn cancelled_wins_over_past_subscription_end() {
        let status = derive_status(false, None, Some(days(-1)), now());
        assert_eq!(status, SubscriptionStatus::Cancelled);
    }

    #[test]
    fn future_trial_is_trial() {
        let status = derive_status(true, Some(days(5)), None, now());
        assert_eq!(status, SubscriptionStatus::Trial);
    }

    #[test]
    fn trial_wins_over_past_subscription_end() {
        // Rule 2 is checked before rule 3.
        let status = derive_status(true, Some(days(5)), Some(days(-1)), now());
        assert_eq!(status, SubscriptionStatus::Trial);
    }

    #[test]
    fn past_trial_is_ignored() {
        let status = derive_status(true, Some(days(-1)), None, now());
        assert_eq!(status, SubscriptionStatus::Active);
    }

    #[test]
    fn past_subscription_end_is_expired() {
        let status = derive_status(true, None, Some(days(-1)), now());
        assert_eq!(status, SubscriptionStatus::Expired);
    }

    #[test]
    fn future_subscription_end_is_active() {
        let status = derive_status(true, None, Some(days(30)), now());
        assert_eq!(status, SubscriptionStatus::Active);
    }

    #[test]
    fn no_dates_is_active() {
        let status = derive_status(true, None, None, now());
        assert_eq!(status, SubscriptionStatus::Active);
    }

    #[test]
    fn expires_soon_inside_the_window() {
        assert!(expires_soon(Some(days(3)), now()));
        assert!(expires_soon(Some(days(7)), now()));
    }

    #[test]
    fn expires_soon_outside_the_window() {
        assert!(!expires_soon(Some(days(8)), now()));
        assert!(!expires_soon(Some(days(30)), now()));
    }

    #[test]
    fn expires_soon_never_fires_after_the_end() {
        assert!(!expires_soon(Some(days(-1)), now()));
        assert!(!expires_soon(None, now()));
    }

    #[test]
    fn days_remaining_counts_whole_days() {
        assert_eq!(days_remaining(Some(days(30)), now()), Some(30));
        assert_eq!(days_remaining(Some(now() + Duration::hours(36)), now()), Some(1));
    }

    #[test]
    fn days_remaining_is_none_after_the_end() {
        assert_eq!(days_remaining(Some(days(-1)), now()), None);
        assert_eq!(days_remaining(None, now()), None);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&SubscriptionStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }
}
