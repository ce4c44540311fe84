use std::sync::Arc;

use eyre::{Error, Result};
use futures_util::stream::TryStreamExt;
use log::info;
use model::equipment::{Equipment, EquipmentStatus};
use model::session::Session;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, Database,
};

const COLLECTION: &str = "equipment";

#[derive(Clone)]
pub struct EquipmentStore {
    equipment: Arc<Collection<Equipment>>,
}

impl EquipmentStore {
    pub(crate) fn new(db: &Database) -> Self {
        EquipmentStore {
            equipment: Arc::new(db.collection(COLLECTION)),
        }
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<Equipment>> {
        Ok(self
            .equipment
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn list(&self, session: &mut Session) -> Result<Vec<Equipment>> {
        let mut cursor = self
            .equipment
            .find(doc! {})
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn insert(&self, session: &mut Session, item: &Equipment) -> Result<()> {
        info!("Inserting equipment: {:?}", item);
        self.equipment
            .insert_one(item)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn set_status(
        &self,
        session: &mut Session,
        id: ObjectId,
        status: EquipmentStatus,
    ) -> Result<()> {
        info!("Set equipment {} status: {:?}", id, status);
        let result = self
            .equipment
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
            return Err(Error::msg("Equipment not found"));
        }
        Ok(())
    }

    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        info!("Delete equipment: {}", id);
        let result = self
            .equipment
            .delete_one(doc! { "_id": id })
            .session(&mut *session)
            .await?;
        if result.deleted_count != 1 {
            return Err(Error::msg("Equipment not found"));
        }
        Ok(())
    }
}
