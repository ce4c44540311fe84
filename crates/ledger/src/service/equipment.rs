use model::equipment::{Equipment as EquipmentItem, EquipmentStatus};
use model::errors::LedgerError;
use model::rights::Rule;
use model::session::Session;
use mongodb::bson::oid::ObjectId;
use storage::equipment::EquipmentStore;
use tx_macro::tx;

use super::history::History;
use super::users::Users;

#[derive(Clone)]
pub struct Equipment {
    store: EquipmentStore,
    users: Users,
    logs: History,
}

impl Equipment {
    pub(crate) fn new(store: EquipmentStore, users: Users, logs: History) -> Self {
        Equipment { store, users, logs }
    }

    pub async fn get(
        &self,
        session: &mut Session,
        id: ObjectId,
    ) -> Result<Option<EquipmentItem>, LedgerError> {
        Ok(self.store.get(session, id).await?)
    }

    pub async fn list(&self, session: &mut Session) -> Result<Vec<EquipmentItem>, LedgerError> {
        Ok(self.store.list(session).await?)
    }

    #[tx]
    pub async fn add(
        &self,
        session: &mut Session,
        name: String,
        manufacturer: String,
    ) -> Result<EquipmentItem, LedgerError> {
        let actor = self.users.actor(session).await?;
        actor.role.ensure(Rule::ManageEquipment)?;

        if name.trim().is_empty() {
            return Err(LedgerError::InvalidInput("name is required".into()));
        }
        let item = EquipmentItem::new(name, manufacturer);
        self.store.insert(session, &item).await?;
        self.logs
            .add_equipment(session, item.id, item.name.clone())
            .await?;
        Ok(item)
    }

    #[tx]
    pub async fn set_status(
        &self,
        session: &mut Session,
        id: ObjectId,
        status: EquipmentStatus,
    ) -> Result<(), LedgerError> {
        let actor = self.users.actor(session).await?;
        actor.role.ensure(Rule::ManageEquipment)?;

        if self.store.get(session, id).await?.is_none() {
            return Err(LedgerError::EquipmentNotFound(id));
        }
        self.store.set_status(session, id, status).await?;
        self.logs.equipment_status(session, id, status).await?;
        Ok(())
    }

    #[tx]
    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<(), LedgerError> {
        let actor = self.users.actor(session).await?;
        actor.role.ensure(Rule::ManageEquipment)?;

        if self.store.get(session, id).await?.is_none() {
            return Err(LedgerError::EquipmentNotFound(id));
        }
        self.store.delete(session, id).await?;
        self.logs.delete_equipment(session, id).await?;
        Ok(())
    }
}
