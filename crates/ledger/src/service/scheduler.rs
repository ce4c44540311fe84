use chrono::Utc;
use model::errors::LedgerError;
use model::private_session::{PrivateSession, SessionStatus};
use model::rights::{Role, Rule};
use model::session::Session;
use model::slot::Slot;
use model::user::{PersonRef, User};
use mongodb::bson::oid::ObjectId;
use storage::private_session::SessionStore;
use tx_macro::tx;

use super::history::History;
use super::users::Users;

#[derive(Clone)]
pub struct Scheduler {
    sessions: SessionStore,
    users: Users,
    logs: History,
}

impl Scheduler {
    pub(crate) fn new(sessions: SessionStore, users: Users, logs: History) -> Self {
        Scheduler {
            sessions,
            users,
            logs,
        }
    }

    pub async fn get(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<Option<PrivateSession>, LedgerError> {
        Ok(self.sessions.get(session, id).await?)
    }

    pub async fn sessions_of_trainer(
        &self,
        session: &mut Session,
        trainer_id: ObjectId,
    ) -> Result<Vec<PrivateSession>, LedgerError> {
        Ok(self.sessions.find_for_trainer(session, trainer_id).await?)
    }

    pub async fn sessions_of_member(
        &self,
        session: &mut Session,
        member_id: ObjectId,
    ) -> Result<Vec<PrivateSession>, LedgerError> {
        Ok(self.sessions.find_for_member(session, member_id).await?)
    }

    #[tx]
    pub async fn book(
        &self,
        session: &mut Session,
        trainer_id: ObjectId,
        member_id: ObjectId,
        slot: Slot,
    ) -> Result<PrivateSession, LedgerError> {
        let actor = self.users.actor(session).await?;
        if actor.id == member_id {
            actor.role.ensure(Rule::BookSession)?;
        } else {
            actor.role.ensure(Rule::EditAnySession)?;
        }

        let trainer = self
            .users
            .get(session, trainer_id)
            .await?
            .ok_or(LedgerError::UserNotFound(trainer_id))?;
        if !trainer.is_trainer() {
            return Err(LedgerError::InvalidInput(format!(
                "user is not a trainer:{}",
                trainer_id
            )));
        }
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

        let now = Utc::now();
        if !member.can_book_session(now) {
            return Err(LedgerError::CreditExhausted(member_id));
        }

        // Trainer slot first, then member slot.
        if self
            .sessions
            .trainer_conflict(session, trainer_id, &slot)
            .await?
            .is_some()
        {
            return Err(LedgerError::SlotConflict);
        }
        if self
            .sessions
            .member_conflict(session, member_id, &slot)
            .await?
            .is_some()
        {
            return Err(LedgerError::SlotConflict);
        }

        let booking =
            PrivateSession::new(PersonRef::from(&trainer), PersonRef::from(&member), slot);
        self.sessions.insert(session, &booking).await?;
        self.debit(session, &member, now).await?;
        self.logs
            .book_session(
                session,
                booking.id,
                trainer_id,
                member_id,
                booking.slot.clone(),
            )
            .await?;
        Ok(booking)
    }

    #[tx]
    pub async fn update_status(
        &self,
        session: &mut Session,
        id: ObjectId,
        status: SessionStatus,
    ) -> Result<(), LedgerError> {
        let actor = self.users.actor(session).await?;
        let booking = self
            .sessions
            .get(session, id)
            .await?
            .ok_or(LedgerError::SessionNotFound(id))?;

        if !booking.transition_allowed(actor.id, actor.role, status) {
            return Err(LedgerError::Forbidden(match actor.role {
                Role::Member => Rule::CancelOwnSession,
                Role::Trainer => Rule::EditOwnSessionStatus,
                Role::Admin => Rule::EditAnySession,
            }));
        }

        if booking.status == status {
            return Ok(());
        }

        let member = self
            .users
            .get(session, booking.member.id)
            .await?
            .ok_or(LedgerError::UserNotFound(booking.member.id))?;
        let now = Utc::now();

        if status == SessionStatus::Cancelled {
            // Cancelling a live session hands the credit back.
            self.users.store().refund_credit(session, member.id).await?;
        } else if booking.is_cancelled() {
            // Reactivation costs a credit again.
            if !member.can_book_session(now) {
                return Err(LedgerError::CreditExhausted(member.id));
            }
            if self
                .sessions
                .trainer_conflict(session, booking.trainer.id, &booking.slot)
                .await?
                .is_some()
            {
                return Err(LedgerError::SlotConflict);
            }
            if self
                .sessions
                .member_conflict(session, booking.member.id, &booking.slot)
                .await?
                .is_some()
            {
                return Err(LedgerError::SlotConflict);
            }
            self.debit(session, &member, now).await?;
        }

        self.sessions.set_status(session, id, status).await?;
        self.logs.session_status(session, id, status).await?;
        Ok(())
    }

    #[tx]
    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<(), LedgerError> {
        let actor = self.users.actor(session).await?;
        actor.role.ensure(Rule::DeleteSession)?;

        let booking = self
            .sessions
            .get(session, id)
            .await?
            .ok_or(LedgerError::SessionNotFound(id))?;
        if !booking.is_cancelled() {
            self.users
                .store()
                .refund_credit(session, booking.member.id)
                .await?;
        }

        self.sessions.delete(session, id).await?;
        self.logs.delete_session(session, id).await?;
        Ok(())
    }

    #[tx]
    pub async fn mark_completed(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<(), LedgerError> {
        let actor = self.users.actor(session).await?;
        let booking = self
            .sessions
            .get(session, id)
            .await?
            .ok_or(LedgerError::SessionNotFound(id))?;

        let owns = actor.is_admin() || booking.trainer.id == actor.id;
        if !(owns && actor.role.rights().has_rule(Rule::CompleteOwnSession)) {
            return Err(LedgerError::Forbidden(Rule::CompleteOwnSession));
        }
        if booking.is_cancelled() {
            return Err(LedgerError::InvalidState("session is cancelled".into()));
        }
        if !booking.can_start(Utc::now()) {
            return Err(LedgerError::InvalidState(
                "session has not started yet".into(),
            ));
        }

        self.sessions
            .set_status(session, id, SessionStatus::Completed)
            .await?;
        self.logs
            .session_status(session, id, SessionStatus::Completed)
            .await?;
        Ok(())
    }

    /// One credit per live booking. The model decides whether a credit
    /// is consumed; the store only performs the guarded write, which can
    /// still lose to a concurrent debit.
    async fn debit(
        &self,
        session: &mut Session,
        member: &User,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if member.spends_credit(now)? {
            let debited = self.users.store().debit_credit(session, member.id).await?;
            if !debited {
                return Err(LedgerError::CreditExhausted(member.id));
            }
        }
        Ok(())
    }
}
