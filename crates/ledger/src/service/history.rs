use chrono::{DateTime, Utc};
use eyre::Result;
use model::{
    class::ClassType,
    equipment::EquipmentStatus,
    history::{Action, HistoryRow},
    private_session::SessionStatus,
    session::Session,
    slot::Slot,
    subscription::SubscriptionType,
};
use mongodb::bson::oid::ObjectId;
use storage::history::HistoryStore;

#[derive(Clone)]
pub struct History {
    store: HistoryStore,
}

impl History {
    pub fn new(store: HistoryStore) -> Self {
        History { store }
    }

    async fn log(&self, session: &mut Session, action: Action) -> Result<()> {
        let entry = HistoryRow::new(session.actor(), action);
        self.store.store(session, entry).await
    }

    pub async fn logs(
        &self,
        session: &mut Session,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HistoryRow>> {
        self.store.find_range(session, from, to, limit, offset).await
    }

    pub async fn actor_logs(
        &self,
        session: &mut Session,
        actor: ObjectId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HistoryRow>> {
        self.store.get_actor_logs(session, actor, limit, offset).await
    }

    pub async fn create_user(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        email: String,
    ) -> Result<()> {
        self.log(session, Action::CreateUser { user_id, email }).await
    }

    pub async fn change_role(&self, session: &mut Session, user_id: ObjectId) -> Result<()> {
        self.log(session, Action::ChangeRole { user_id }).await
    }

    pub async fn change_credits(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        amount: i32,
    ) -> Result<()> {
        self.log(session, Action::ChangeCredits { user_id, amount }).await
    }

    pub async fn set_specializations(
        &self,
        session: &mut Session,
        user_id: ObjectId,
        specializations: Vec<ClassType>,
    ) -> Result<()> {
        self.log(
            session,
            Action::SetSpecializations {
                user_id,
                specializations,
            },
        )
        .await
    }

    pub async fn create_class(
        &self,
        session: &mut Session,
        class_id: ObjectId,
        class_type: ClassType,
        slot: Slot,
    ) -> Result<()> {
        self.log(
            session,
            Action::CreateClass {
                class_id,
                class_type,
                slot,
            },
        )
        .await
    }

    pub async fn edit_class(&self, session: &mut Session, class_id: ObjectId) -> Result<()> {
        self.log(session, Action::EditClass { class_id }).await
    }

    pub async fn delete_class(&self, session: &mut Session, class_id: ObjectId) -> Result<()> {
        self.log(session, Action::DeleteClass { class_id }).await
    }

    pub async fn enroll(
        &self,
        session: &mut Session,
        class_id: ObjectId,
        member_id: ObjectId,
    ) -> Result<()> {
        self.log(session, Action::Enroll { class_id, member_id }).await
    }

    pub async fn cancel_enrollment(
        &self,
        session: &mut Session,
        class_id: ObjectId,
        member_id: ObjectId,
    ) -> Result<()> {
        self.log(session, Action::CancelEnrollment { class_id, member_id })
            .await
    }

    pub async fn mark_present(&self, session: &mut Session, class_id: ObjectId) -> Result<()> {
        self.log(session, Action::MarkPresent { class_id }).await
    }

    pub async fn book_session(
        &self,
        session: &mut Session,
        session_id: ObjectId,
        trainer_id: ObjectId,
        member_id: ObjectId,
        slot: Slot,
    ) -> Result<()> {
        self.log(
            session,
            Action::BookSession {
                session_id,
                trainer_id,
                member_id,
                slot,
            },
        )
        .await
    }

    pub async fn session_status(
        &self,
        session: &mut Session,
        session_id: ObjectId,
        status: SessionStatus,
    ) -> Result<()> {
        self.log(session, Action::SessionStatus { session_id, status })
            .await
    }

    pub async fn delete_session(&self, session: &mut Session, session_id: ObjectId) -> Result<()> {
        self.log(session, Action::DeleteSession { session_id }).await
    }

    pub async fn add_subscription(
        &self,
        session: &mut Session,
        member_id: ObjectId,
        tp: SubscriptionType,
    ) -> Result<()> {
        self.log(session, Action::AddSubscription { member_id, tp }).await
    }

    pub async fn edit_subscription(
        &self,
        session: &mut Session,
        member_id: ObjectId,
        subscription_id: ObjectId,
    ) -> Result<()> {
        self.log(
            session,
            Action::EditSubscription {
                member_id,
                subscription_id,
            },
        )
        .await
    }

    pub async fn remove_subscription(
        &self,
        session: &mut Session,
        member_id: ObjectId,
        subscription_id: ObjectId,
    ) -> Result<()> {
        self.log(
            session,
            Action::RemoveSubscription {
                member_id,
                subscription_id,
            },
        )
        .await
    }

    pub async fn add_equipment(
        &self,
        session: &mut Session,
        equipment_id: ObjectId,
        name: String,
    ) -> Result<()> {
        self.log(session, Action::AddEquipment { equipment_id, name }).await
    }

    pub async fn delete_equipment(
        &self,
        session: &mut Session,
        equipment_id: ObjectId,
    ) -> Result<()> {
        self.log(session, Action::DeleteEquipment { equipment_id }).await
    }

    pub async fn equipment_status(
        &self,
        session: &mut Session,
        equipment_id: ObjectId,
        status: EquipmentStatus,
    ) -> Result<()> {
        self.log(
            session,
            Action::EquipmentStatus {
                equipment_id,
                status,
            },
        )
        .await
    }
}
