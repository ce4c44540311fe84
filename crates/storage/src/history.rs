use std::sync::Arc;

use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use eyre::Error;
use model::{history::HistoryRow, session::Session};
use mongodb::{Collection, IndexModel};

const COLLECTION: &str = "history";

#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<Collection<HistoryRow>>,
}

impl HistoryStore {
    pub(crate) async fn new(db: &mongodb::Database) -> Result<Self, Error> {
        let store: Collection<HistoryRow> = db.collection(COLLECTION);
        store
            .create_index(IndexModel::builder().keys(doc! { "date_time": -1 }).build())
            .await?;
        store
            .create_index(IndexModel::builder().keys(doc! { "actor": -1 }).build())
            .await?;
        Ok(HistoryStore {
            store: Arc::new(store),
        })
    }

    pub async fn store(&self, session: &mut Session, entry: HistoryRow) -> Result<(), Error> {
        self.store.insert_one(entry).session(session).await?;
        Ok(())
    }

    pub async fn find_range(
        &self,
        session: &mut Session,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HistoryRow>, Error> {
        let filter = match (from, to) {
            (Some(from), Some(to)) => doc! { "date_time": { "$gte": from, "$lt": to } },
            (Some(from), None) => doc! { "date_time": { "$gte": from } },
            (None, Some(to)) => doc! { "date_time": { "$lt": to } },
            (None, None) => doc! {},
        };
        let mut cursor = self
            .store
            .find(filter)
            .sort(doc! { "date_time": -1 })
            .skip(offset as u64)
            .session(&mut *session)
            .await?;
        let mut rows = Vec::with_capacity(limit);
        while let Some(row) = cursor.next(&mut *session).await {
            rows.push(row?);
            if rows.len() >= limit {
                break;
            }
        }
        Ok(rows)
    }

    pub async fn get_actor_logs(
        &self,
        session: &mut Session,
        actor: ObjectId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HistoryRow>, Error> {
        let mut cursor = self
            .store
            .find(doc! { "actor": actor })
            .sort(doc! { "date_time": -1 })
            .skip(offset as u64)
            .session(&mut *session)
            .await?;
        let mut rows = Vec::with_capacity(limit);
        while let Some(row) = cursor.next(&mut *session).await {
            rows.push(row?);
            if rows.len() >= limit {
                break;
            }
        }
        Ok(rows)
    }
}
