use std::sync::Arc;

use bson::to_document;
use eyre::{Error, Result};
use futures_util::stream::TryStreamExt;
use log::info;
use model::class::{GroupClass, Participant, ParticipantStatus};
use model::session::Session;
use model::slot::Slot;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, Database, IndexModel,
};

const COLLECTION: &str = "classes";

#[derive(Clone)]
pub struct ClassStore {
    classes: Arc<Collection<GroupClass>>,
}

impl ClassStore {
    pub(crate) async fn new(db: &Database) -> Result<Self> {
        let classes = db.collection(COLLECTION);
        classes
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "trainer.id": 1, "slot.date": 1, "slot.time": 1 })
                    .build(),
            )
            .await?;
        classes
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "participants.member_id": 1 })
                    .build(),
            )
            .await?;
        Ok(ClassStore {
            classes: Arc::new(classes),
        })
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<GroupClass>> {
        Ok(self
            .classes
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn insert(&self, session: &mut Session, class: &GroupClass) -> Result<()> {
        info!("Inserting class: {:?}", class);
        self.classes
            .insert_one(class)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn find_by_trainer_slot(
        &self,
        session: &mut Session,
        trainer_id: ObjectId,
        slot: &Slot,
    ) -> Result<Option<GroupClass>> {
        Ok(self
            .classes
            .find_one(doc! {
                "trainer.id": trainer_id,
                "slot.date": slot.date(),
                "slot.time": slot.time(),
            })
            .session(&mut *session)
            .await?)
    }

    pub async fn find_for_trainer(
        &self,
        session: &mut Session,
        trainer_id: ObjectId,
    ) -> Result<Vec<GroupClass>> {
        let mut cursor = self
            .classes
            .find(doc! { "trainer.id": trainer_id })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn find_for_member(
        &self,
        session: &mut Session,
        member_id: ObjectId,
    ) -> Result<Vec<GroupClass>> {
        let mut cursor = self
            .classes
            .find(doc! { "participants.member_id": member_id })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    /// Full-document replacement for multi-field edits resolved in memory.
    pub async fn update(&self, session: &mut Session, class: &mut GroupClass) -> Result<()> {
        class.version += 1;
        let mut update = to_document(class)?;
        update.remove("_id");
        let result = self
            .classes
            .update_one(doc! { "_id": class.id }, doc! { "$set": update })
            .session(&mut *session)
            .await?;
        if result.modified_count != 1 {
            return Err(Error::msg("Class not found"));
        }
        Ok(())
    }

    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        info!("Delete class: {}", id);
        let result = self
            .classes
            .delete_one(doc! { "_id": id })
            .session(&mut *session)
            .await?;
        if result.deleted_count != 1 {
            return Err(Error::msg("Class not found"));
        }
        Ok(())
    }

    pub async fn push_participant(
        &self,
        session: &mut Session,
        id: ObjectId,
        participant: &Participant,
    ) -> Result<()> {
        info!("Enroll {} into class {}", participant.member_id, id);
        let result = self
            .classes
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$push": { "participants": to_document(participant)? },
                    "$inc": { "version": 1 },
                },
            )
            .session(&mut *session)
            .await?;
        if result.modified_count != 1 {
            return Err(Error::msg("Class not found"));
        }
        Ok(())
    }

    pub async fn set_participant_status(
        &self,
        session: &mut Session,
        id: ObjectId,
        member_id: ObjectId,
        status: ParticipantStatus,
    ) -> Result<()> {
        info!(
            "Set participant {} status in class {}: {:?}",
            member_id, id, status
        );
        let result = self
            .classes
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": { "participants.$[elem].status": format!("{:?}", status) },
                    "$inc": { "version": 1 },
                },
            )
            .array_filters([doc! { "elem.member_id": member_id }])
            .session(&mut *session)
            .await?;
        if result.modified_count != 1 {
            return Err(Error::msg("Participant not found"));
        }
        Ok(())
    }

    pub async fn mark_enrolled_present(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        info!("Mark enrolled participants present in class {}", id);
        self.classes
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": { "participants.$[elem].status": "Present" },
                    "$inc": { "version": 1 },
                },
            )
            .array_filters([doc! { "elem.status": "Enrolled" }])
            .session(&mut *session)
            .await?;
        Ok(())
    }
}
