use chrono::Utc;
use model::class::{ClassType, GroupClass, Participant, ParticipantStatus};
use model::errors::LedgerError;
use model::rights::Rule;
use model::session::Session;
use model::slot::Slot;
use model::user::{PersonRef, User};
use mongodb::bson::oid::ObjectId;
use storage::class::ClassStore;
use tx_macro::tx;

use super::history::History;
use super::users::Users;

/// Partial update for a group class; `None` leaves the field untouched.
#[derive(Debug, Default)]
pub struct ClassPatch {
    pub class_type: Option<ClassType>,
    pub capacity: Option<u32>,
    pub trainer_id: Option<ObjectId>,
    pub slot: Option<Slot>,
    pub duration_min: Option<u32>,
}

#[derive(Clone)]
pub struct Roster {
    classes: ClassStore,
    users: Users,
    logs: History,
}

impl Roster {
    pub(crate) fn new(classes: ClassStore, users: Users, logs: History) -> Self {
        Roster {
            classes,
            users,
            logs,
        }
    }

    pub async fn get(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<Option<GroupClass>, LedgerError> {
        Ok(self.classes.get(session, id).await?)
    }

    pub async fn classes_of_trainer(
        &self,
        session: &mut Session,
        trainer_id: ObjectId,
    ) -> Result<Vec<GroupClass>, LedgerError> {
        Ok(self.classes.find_for_trainer(session, trainer_id).await?)
    }

    pub async fn classes_of_member(
        &self,
        session: &mut Session,
        member_id: ObjectId,
    ) -> Result<Vec<GroupClass>, LedgerError> {
        Ok(self.classes.find_for_member(session, member_id).await?)
    }

    #[tx]
    pub async fn create_class(
        &self,
        session: &mut Session,
        class_type: ClassType,
        capacity: u32,
        trainer_id: ObjectId,
        slot: Slot,
    ) -> Result<GroupClass, LedgerError> {
        let actor = self.users.actor(session).await?;
        actor.role.ensure(Rule::CreateClass)?;

        if capacity == 0 {
            return Err(LedgerError::InvalidInput("capacity must be positive".into()));
        }
        let trainer = self.resolve_trainer(session, trainer_id).await?;
        if !trainer.can_lead(class_type) {
            return Err(LedgerError::InvalidInput(format!(
                "trainer is not qualified for {:?}",
                class_type
            )));
        }

        if self
            .classes
            .find_by_trainer_slot(session, trainer.id, &slot)
            .await?
            .is_some()
        {
            return Err(LedgerError::SlotConflict);
        }

        let class = GroupClass::new(class_type, capacity, PersonRef::from(&trainer), slot);
        self.classes.insert(session, &class).await?;
        self.logs
            .create_class(session, class.id, class.class_type, class.slot.clone())
            .await?;
        Ok(class)
    }

    #[tx]
    pub async fn update_class(
        &self,
        session: &mut Session,
        id: ObjectId,
        patch: ClassPatch,
    ) -> Result<(), LedgerError> {
        let actor = self.users.actor(session).await?;
        actor.role.ensure(Rule::EditClass)?;

        let mut class = self
            .classes
            .get(session, id)
            .await?
            .ok_or(LedgerError::ClassNotFound(id))?;

        if let Some(class_type) = patch.class_type {
            class.class_type = class_type;
        }
        if let Some(capacity) = patch.capacity {
            if capacity == 0 {
                return Err(LedgerError::InvalidInput("capacity must be positive".into()));
            }
            if (class.active_participants() as u32) > capacity {
                return Err(LedgerError::CapacityExceeded { class_id: id });
            }
            class.capacity = capacity;
        }
        if let Some(duration_min) = patch.duration_min {
            class.duration_min = duration_min;
        }

        let reschedule = patch.trainer_id.is_some() || patch.slot.is_some();
        if let Some(trainer_id) = patch.trainer_id {
            let trainer = self.resolve_trainer(session, trainer_id).await?;
            class.trainer = PersonRef::from(&trainer);
        }
        if let Some(slot) = patch.slot {
            class.slot = slot;
        }

        // A changed trainer or class type re-checks the qualification
        // list, like creation does.
        if patch.trainer_id.is_some() || patch.class_type.is_some() {
            let trainer = self.resolve_trainer(session, class.trainer.id).await?;
            if !trainer.can_lead(class.class_type) {
                return Err(LedgerError::InvalidInput(format!(
                    "trainer is not qualified for {:?}",
                    class.class_type
                )));
            }
        }

        // Edits re-run the same slot check as creation.
        if reschedule {
            if let Some(other) = self
                .classes
                .find_by_trainer_slot(session, class.trainer.id, &class.slot)
                .await?
            {
                if other.id != class.id {
                    return Err(LedgerError::SlotConflict);
                }
            }
        }

        self.classes.update(session, &mut class).await?;
        self.logs.edit_class(session, id).await?;
        Ok(())
    }

    #[tx]
    pub async fn delete_class(&self, session: &mut Session, id: ObjectId) -> Result<(), LedgerError> {
        let actor = self.users.actor(session).await?;
        actor.role.ensure(Rule::DeleteClass)?;

        let class = self
            .classes
            .get(session, id)
            .await?
            .ok_or(LedgerError::ClassNotFound(id))?;
        if class.active_participants() > 0 {
            return Err(LedgerError::ClassHasParticipants { class_id: id });
        }

        self.classes.delete(session, id).await?;
        self.logs.delete_class(session, id).await?;
        Ok(())
    }

    #[tx]
    pub async fn enroll(
        &self,
        session: &mut Session,
        class_id: ObjectId,
        member_id: ObjectId,
    ) -> Result<(), LedgerError> {
        let class = self
            .classes
            .get(session, class_id)
            .await?
            .ok_or(LedgerError::ClassNotFound(class_id))?;
        self.ensure_roster_access(session, &class, member_id).await?;

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
        let allowed = member
            .current_subscription_type(now)
            .map_or(false, |tp| tp.allows_group_classes());
        if !allowed {
            return Err(LedgerError::SubscriptionRequired { member_id });
        }

        if class.is_enrolled(member_id) {
            return Err(LedgerError::AlreadyEnrolled {
                class_id,
                member_id,
            });
        }
        if class.is_full() {
            return Err(LedgerError::CapacityExceeded { class_id });
        }

        // A cancelled entry is re-activated in place, never duplicated.
        if class.participant(member_id).is_some() {
            self.classes
                .set_participant_status(session, class_id, member_id, ParticipantStatus::Enrolled)
                .await?;
        } else {
            let participant = Participant::new(PersonRef::from(&member));
            self.classes
                .push_participant(session, class_id, &participant)
                .await?;
        }
        self.logs.enroll(session, class_id, member_id).await?;
        Ok(())
    }

    #[tx]
    pub async fn cancel_enrollment(
        &self,
        session: &mut Session,
        class_id: ObjectId,
        member_id: ObjectId,
    ) -> Result<(), LedgerError> {
        let class = self
            .classes
            .get(session, class_id)
            .await?
            .ok_or(LedgerError::ClassNotFound(class_id))?;
        self.ensure_roster_access(session, &class, member_id).await?;

        if !class.is_enrolled(member_id) {
            return Err(LedgerError::NotEnrolled {
                class_id,
                member_id,
            });
        }

        self.classes
            .set_participant_status(session, class_id, member_id, ParticipantStatus::Cancelled)
            .await?;
        self.logs.cancel_enrollment(session, class_id, member_id).await?;
        Ok(())
    }

    #[tx]
    pub async fn mark_present(
        &self,
        session: &mut Session,
        class_id: ObjectId,
    ) -> Result<(), LedgerError> {
        let actor = self.users.actor(session).await?;
        let class = self
            .classes
            .get(session, class_id)
            .await?
            .ok_or(LedgerError::ClassNotFound(class_id))?;

        if !actor.rights_over_roster(&class) {
            return Err(LedgerError::Forbidden(Rule::ManageOwnRoster));
        }

        let now = Utc::now();
        if !class.slot.is_past(now) {
            return Err(LedgerError::InvalidState(
                "class has not started yet".into(),
            ));
        }
        if class.any_present() {
            // Already processed.
            return Ok(());
        }

        self.classes.mark_enrolled_present(session, class_id).await?;
        self.logs.mark_present(session, class_id).await?;
        Ok(())
    }

    async fn resolve_trainer(
        &self,
        session: &mut Session,
        trainer_id: ObjectId,
    ) -> Result<User, LedgerError> {
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
        Ok(trainer)
    }

    /// Self-service for the member themselves, roster management for the
    /// owning trainer, anything for the admin.
    async fn ensure_roster_access(
        &self,
        session: &mut Session,
        class: &GroupClass,
        member_id: ObjectId,
    ) -> Result<(), LedgerError> {
        let actor = self.users.actor(session).await?;
        if actor.id == member_id {
            return actor.role.ensure(Rule::EnrollSelf);
        }
        if actor.rights_over_roster(class) {
            return Ok(());
        }
        Err(LedgerError::Forbidden(Rule::ManageRoster))
    }
}
