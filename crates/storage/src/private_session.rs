use std::sync::Arc;

use eyre::{Error, Result};
use futures_util::stream::TryStreamExt;
use log::info;
use model::private_session::{PrivateSession, SessionStatus};
use model::session::Session;
use model::slot::Slot;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, Database, IndexModel,
};

const COLLECTION: &str = "private_sessions";

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Collection<PrivateSession>>,
}

impl SessionStore {
    pub(crate) async fn new(db: &Database) -> Result<Self> {
        let sessions = db.collection(COLLECTION);
        sessions
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "trainer.id": 1, "slot.date": 1, "slot.time": 1 })
                    .build(),
            )
            .await?;
        sessions
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "member.id": 1, "slot.date": 1, "slot.time": 1 })
                    .build(),
            )
            .await?;
        Ok(SessionStore {
            sessions: Arc::new(sessions),
        })
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<PrivateSession>> {
        Ok(self
            .sessions
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn insert(&self, session: &mut Session, booking: &PrivateSession) -> Result<()> {
        info!("Inserting private session: {:?}", booking);
        self.sessions
            .insert_one(booking)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn trainer_conflict(
        &self,
        session: &mut Session,
        trainer_id: ObjectId,
        slot: &Slot,
    ) -> Result<Option<PrivateSession>> {
        Ok(self
            .sessions
            .find_one(doc! {
                "trainer.id": trainer_id,
                "slot.date": slot.date(),
                "slot.time": slot.time(),
                "status": { "$ne": "Cancelled" },
            })
            .session(&mut *session)
            .await?)
    }

    pub async fn member_conflict(
        &self,
        session: &mut Session,
        member_id: ObjectId,
        slot: &Slot,
    ) -> Result<Option<PrivateSession>> {
        Ok(self
            .sessions
            .find_one(doc! {
                "member.id": member_id,
                "slot.date": slot.date(),
                "slot.time": slot.time(),
                "status": { "$ne": "Cancelled" },
            })
            .session(&mut *session)
            .await?)
    }

    pub async fn find_for_trainer(
        &self,
        session: &mut Session,
        trainer_id: ObjectId,
    ) -> Result<Vec<PrivateSession>> {
        let mut cursor = self
            .sessions
            .find(doc! { "trainer.id": trainer_id })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn find_for_member(
        &self,
        session: &mut Session,
        member_id: ObjectId,
    ) -> Result<Vec<PrivateSession>> {
        let mut cursor = self
            .sessions
            .find(doc! { "member.id": member_id })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn set_status(
        &self,
        session: &mut Session,
        id: ObjectId,
        status: SessionStatus,
    ) -> Result<()> {
        info!("Set session {} status: {:?}", id, status);
        let result = self
            .sessions
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": { "status": format!("{:?}", status) },
                    "$inc": { "version": 1 },
                },
            )
            .session(&mut *session)
            .await?;
        if result.matched_count != 1 {
            return Err(Error::msg("Session not found"));
        }
        Ok(())
    }

    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        info!("Delete private session: {}", id);
        let result = self
            .sessions
            .delete_one(doc! { "_id": id })
            .session(&mut *session)
            .await?;
        if result.deleted_count != 1 {
            return Err(Error::msg("Session not found"));
        }
        Ok(())
    }
}
