use chrono::{DateTime, Utc};
use model::errors::LedgerError;
use model::rights::Rule;
use model::session::Session;
use model::subscription::{
    grants_premium_bonus, SubscriptionStatus, SubscriptionType, UserSubscription,
    PREMIUM_BONUS_CREDITS,
};
use mongodb::bson::oid::ObjectId;
use tx_macro::tx;

use super::history::History;
use super::users::Users;

/// Partial update for a subscription entry; `None` leaves the field
/// untouched.
#[derive(Debug, Default)]
pub struct SubscriptionPatch {
    pub tp: Option<SubscriptionType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<SubscriptionStatus>,
}

#[derive(Clone)]
pub struct Subscriptions {
    users: Users,
    logs: History,
}

impl Subscriptions {
    pub(crate) fn new(users: Users, logs: History) -> Self {
        Subscriptions { users, logs }
    }

    #[tx]
    pub async fn add(
        &self,
        session: &mut Session,
        member_id: ObjectId,
        tp: SubscriptionType,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<UserSubscription, LedgerError> {
        let actor = self.users.actor(session).await?;
        actor.role.ensure(Rule::EditSubscriptions)?;

        let member = self
            .users
            .get(session, member_id)
            .await?
            .ok_or(LedgerError::UserNotFound(member_id))?;
        if !member.is_member() {
            return Err(LedgerError::InvalidInput(format!(
                "user is not a member:{}",
                member_id
            )));
        }
        if end_date <= start_date {
            return Err(LedgerError::InvalidInput(
                "end date must follow start date".into(),
            ));
        }

        let sub = UserSubscription::new(tp, start_date, end_date);
        let bonus = if grants_premium_bonus(None, tp) {
            PREMIUM_BONUS_CREDITS
        } else {
            0
        };
        self.users
            .store()
            .add_subscription(session, member_id, &sub, bonus)
            .await?;
        self.logs.add_subscription(session, member_id, tp).await?;
        Ok(sub)
    }

    #[tx]
    pub async fn update(
        &self,
        session: &mut Session,
        member_id: ObjectId,
        subscription_id: ObjectId,
        patch: SubscriptionPatch,
    ) -> Result<(), LedgerError> {
        let actor = self.users.actor(session).await?;
        actor.role.ensure(Rule::EditSubscriptions)?;

        let mut member = self
            .users
            .get(session, member_id)
            .await?
            .ok_or(LedgerError::UserNotFound(member_id))?;

        let entry = member
            .subscriptions_mut()
            .iter_mut()
            .find(|sub| sub.id == subscription_id)
            .ok_or(LedgerError::SubscriptionNotFound {
                user_id: member_id,
                subscription_id,
            })?;

        // The upgrade bonus fires on the non-Premium to Premium edge
        // only; editing an already-Premium entry grants nothing.
        let mut bonus = 0;
        if let Some(tp) = patch.tp {
            if grants_premium_bonus(Some(entry.tp), tp) {
                bonus = PREMIUM_BONUS_CREDITS;
            }
            entry.tp = tp;
        }
        if let Some(start_date) = patch.start_date {
            entry.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            entry.end_date = end_date;
        }
        if let Some(status) = patch.status {
            entry.status = status;
        }
        if entry.end_date <= entry.start_date {
            return Err(LedgerError::InvalidInput(
                "end date must follow start date".into(),
            ));
        }

        member.pt_credits += bonus;
        self.users.store().update(session, &mut member).await?;
        self.logs
            .edit_subscription(session, member_id, subscription_id)
            .await?;
        Ok(())
    }

    #[tx]
    pub async fn remove(
        &self,
        session: &mut Session,
        member_id: ObjectId,
        subscription_id: ObjectId,
    ) -> Result<(), LedgerError> {
        let actor = self.users.actor(session).await?;
        actor.role.ensure(Rule::EditSubscriptions)?;

        let member = self
            .users
            .get(session, member_id)
            .await?
            .ok_or(LedgerError::UserNotFound(member_id))?;
        if !member.subscriptions().iter().any(|s| s.id == subscription_id) {
            return Err(LedgerError::SubscriptionNotFound {
                user_id: member_id,
                subscription_id,
            });
        }

        // Bonus credits already granted are not clawed back.
        self.users
            .store()
            .remove_subscription(session, member_id, subscription_id)
            .await?;
        self.logs
            .remove_subscription(session, member_id, subscription_id)
            .await?;
        Ok(())
    }
}
