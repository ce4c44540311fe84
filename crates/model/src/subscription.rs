use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credits granted when a member buys or upgrades to Premium.
pub const PREMIUM_BONUS_CREDITS: u32 = 5;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionType {
    Standard,
    StandardPlus,
    Premium,
}

impl SubscriptionType {
    pub fn allows_group_classes(&self) -> bool {
        !matches!(self, SubscriptionType::Standard)
    }

    /// Premium members may book private sessions with an empty credit
    /// balance; everyone else spends purchased credits.
    pub fn unlimited_private_sessions(&self) -> bool {
        matches!(self, SubscriptionType::Premium)
    }
}

/// The upgrade bonus fires on the non-Premium to Premium transition only.
pub fn grants_premium_bonus(from: Option<SubscriptionType>, to: SubscriptionType) -> bool {
    to == SubscriptionType::Premium && from != Some(SubscriptionType::Premium)
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Valid,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserSubscription {
    pub id: ObjectId,
    pub tp: SubscriptionType,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
}

impl UserSubscription {
    pub fn new(
        tp: SubscriptionType,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> UserSubscription {
        UserSubscription {
            id: ObjectId::new(),
            tp,
            start_date,
            end_date,
            status: SubscriptionStatus::Valid,
        }
    }

    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Valid && self.end_date > now
    }
}

/// The authoritative subscription used for gating: the most recent entry
/// that is still valid and not past its end date.
pub fn current<'a>(
    subscriptions: &'a [UserSubscription],
    now: DateTime<Utc>,
) -> Option<&'a UserSubscription> {
    subscriptions.iter().rev().find(|sub| sub.is_current(now))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone as _};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).single().unwrap()
    }

    fn sub(tp: SubscriptionType, days_left: i64) -> UserSubscription {
        UserSubscription::new(tp, now() - Duration::days(30), now() + Duration::days(days_left))
    }

    #[test]
    fn test_expired_entry_is_not_current() {
        let subs = vec![sub(SubscriptionType::Standard, -1)];
        assert!(current(&subs, now()).is_none());
    }

    #[test]
    fn test_cancelled_entry_is_not_current() {
        let mut cancelled = sub(SubscriptionType::Premium, 30);
        cancelled.status = SubscriptionStatus::Cancelled;
        let subs = vec![cancelled];
        assert!(current(&subs, now()).is_none());
    }

    #[test]
    fn test_most_recent_valid_entry_wins() {
        let subs = vec![
            sub(SubscriptionType::Standard, 10),
            sub(SubscriptionType::Premium, 20),
        ];
        let current = current(&subs, now()).unwrap();
        assert_eq!(current.tp, SubscriptionType::Premium);
    }

    #[test]
    fn test_access_per_type() {
        assert!(!SubscriptionType::Standard.allows_group_classes());
        assert!(SubscriptionType::StandardPlus.allows_group_classes());
        assert!(SubscriptionType::Premium.allows_group_classes());
        assert!(!SubscriptionType::StandardPlus.unlimited_private_sessions());
        assert!(SubscriptionType::Premium.unlimited_private_sessions());
    }

    #[test]
    fn test_premium_bonus_fires_once() {
        assert!(grants_premium_bonus(None, SubscriptionType::Premium));
        assert!(grants_premium_bonus(
            Some(SubscriptionType::Standard),
            SubscriptionType::Premium
        ));
        assert!(!grants_premium_bonus(
            Some(SubscriptionType::Premium),
            SubscriptionType::Premium
        ));
        assert!(!grants_premium_bonus(
            Some(SubscriptionType::Standard),
            SubscriptionType::StandardPlus
        ));
    }
}
