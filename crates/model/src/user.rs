use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::class::ClassType;
use crate::errors::LedgerError;
use crate::rights::{Role, Rule};
use crate::subscription::{self, SubscriptionType, UserSubscription};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    subscriptions: Vec<UserSubscription>,
    #[serde(default)]
    pub pt_credits: u32,
    #[serde(default)]
    pub specializations: Vec<ClassType>,
    #[serde(default)]
    pub version: u64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, role: Role) -> User {
        User {
            id: ObjectId::new(),
            name,
            email,
            role,
            subscriptions: vec![],
            pt_credits: 0,
            specializations: vec![],
            version: 0,
            created_at: Utc::now(),
        }
    }

    pub fn subscriptions(&self) -> &[UserSubscription] {
        &self.subscriptions
    }

    pub fn subscriptions_mut(&mut self) -> &mut Vec<UserSubscription> {
        &mut self.subscriptions
    }

    pub fn current_subscription(&self, now: DateTime<Utc>) -> Option<&UserSubscription> {
        subscription::current(&self.subscriptions, now)
    }

    pub fn current_subscription_type(&self, now: DateTime<Utc>) -> Option<SubscriptionType> {
        self.current_subscription(now).map(|sub| sub.tp)
    }

    pub fn is_premium(&self, now: DateTime<Utc>) -> bool {
        self.current_subscription_type(now)
            .map_or(false, |tp| tp.unlimited_private_sessions())
    }

    /// A booking is admitted while credits remain or the current
    /// subscription is Premium.
    pub fn can_book_session(&self, now: DateTime<Utc>) -> bool {
        self.spends_credit(now).is_ok()
    }

    /// Whether a booking consumes a credit. Premium members keep booking
    /// at zero balance, but purchased credits are still consumed while
    /// they last.
    pub fn spends_credit(&self, now: DateTime<Utc>) -> Result<bool, LedgerError> {
        if self.pt_credits > 0 {
            Ok(true)
        } else if self.is_premium(now) {
            Ok(false)
        } else {
            Err(LedgerError::CreditExhausted(self.id))
        }
    }

    /// An empty qualification list places no restriction; a non-empty
    /// one limits which class types the trainer may lead.
    pub fn can_lead(&self, class_type: ClassType) -> bool {
        self.specializations.is_empty() || self.specializations.contains(&class_type)
    }

    /// Roster management: admins everywhere, trainers on their own
    /// classes only.
    pub fn rights_over_roster(&self, class: &crate::class::GroupClass) -> bool {
        let rights = self.role.rights();
        if rights.has_rule(Rule::ManageRoster) {
            return true;
        }
        rights.has_rule(Rule::ManageOwnRoster) && class.trainer.id == self.id
    }

    pub fn is_member(&self) -> bool {
        self.role == Role::Member
    }

    pub fn is_trainer(&self) -> bool {
        self.role == Role::Trainer
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Denormalized user reference embedded in classes and private sessions.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PersonRef {
    pub id: ObjectId,
    pub name: String,
}

impl From<&User> for PersonRef {
    fn from(user: &User) -> PersonRef {
        PersonRef {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

pub fn sanitize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone as _};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).single().unwrap()
    }

    fn member_with(tp: Option<SubscriptionType>, credits: u32) -> User {
        let mut user = User::new("Ana".to_owned(), "ana@club.io".to_owned(), Role::Member);
        user.pt_credits = credits;
        if let Some(tp) = tp {
            user.subscriptions_mut().push(UserSubscription::new(
                tp,
                now() - Duration::days(1),
                now() + Duration::days(30),
            ));
        }
        user
    }

    // Applies the booking decision the way the scheduler does: a
    // positive decision decrements, a cancellation refunds.
    fn book(user: &mut User) -> Result<(), LedgerError> {
        if user.spends_credit(now())? {
            user.pt_credits -= 1;
        }
        Ok(())
    }

    #[test]
    fn test_member_without_credits_cannot_book() {
        let mut user = member_with(Some(SubscriptionType::Standard), 0);
        assert!(!user.can_book_session(now()));
        assert!(matches!(
            book(&mut user),
            Err(LedgerError::CreditExhausted(_))
        ));
        assert_eq!(user.pt_credits, 0);
    }

    #[test]
    fn test_premium_books_at_zero_credits() {
        let mut user = member_with(Some(SubscriptionType::Premium), 0);
        assert!(user.can_book_session(now()));
        book(&mut user).unwrap();
        assert_eq!(user.pt_credits, 0);
    }

    #[test]
    fn test_premium_spends_purchased_credits_first() {
        let mut user = member_with(Some(SubscriptionType::Premium), 2);
        assert!(user.spends_credit(now()).unwrap());
        book(&mut user).unwrap();
        assert_eq!(user.pt_credits, 1);
    }

    #[test]
    fn test_book_cancel_rebook_conserves_credits() {
        let mut user = member_with(Some(SubscriptionType::Standard), 1);
        book(&mut user).unwrap();
        assert_eq!(user.pt_credits, 0);
        user.pt_credits += 1;
        assert_eq!(user.pt_credits, 1);
        book(&mut user).unwrap();
        assert_eq!(user.pt_credits, 0);
    }

    #[test]
    fn test_specializations_limit_class_types() {
        let mut trainer =
            User::new("Radu".to_owned(), "radu@club.io".to_owned(), Role::Trainer);
        assert!(trainer.can_lead(ClassType::Yoga));

        trainer.specializations = vec![ClassType::Yoga, ClassType::Pilates];
        assert!(trainer.can_lead(ClassType::Pilates));
        assert!(!trainer.can_lead(ClassType::Spinning));
    }

    #[test]
    fn test_expired_premium_is_not_premium() {
        let mut user = member_with(None, 0);
        user.subscriptions_mut().push(UserSubscription::new(
            SubscriptionType::Premium,
            now() - Duration::days(60),
            now() - Duration::days(30),
        ));
        assert!(!user.is_premium(now()));
        assert!(!user.can_book_session(now()));
    }

    #[test]
    fn test_roster_rights_scoped_to_own_class() {
        use crate::class::{ClassType, GroupClass};
        use crate::slot::Slot;

        let trainer = User::new("Radu".to_owned(), "radu@club.io".to_owned(), Role::Trainer);
        let admin = User::new("Dana".to_owned(), "dana@club.io".to_owned(), Role::Admin);
        let slot = Slot::new(now(), "18:00").unwrap();
        let own = GroupClass::new(ClassType::Yoga, 10, PersonRef::from(&trainer), slot.clone());
        let other = GroupClass::new(
            ClassType::Yoga,
            10,
            PersonRef {
                id: ObjectId::new(),
                name: "Vlad".to_owned(),
            },
            slot,
        );

        assert!(trainer.rights_over_roster(&own));
        assert!(!trainer.rights_over_roster(&other));
        assert!(admin.rights_over_roster(&other));
    }

    #[test]
    fn test_sanitize_email() {
        assert_eq!(sanitize_email("  Ana@Club.IO "), "ana@club.io");
    }
}
