use std::sync::Arc;

use bson::to_document;
use eyre::{Error, Result};
use futures_util::stream::TryStreamExt;
use log::info;
use model::class::ClassType;
use model::rights::Role;
use model::session::Session;
use model::subscription::UserSubscription;
use model::user::User;
use mongodb::options::UpdateOptions;
use mongodb::IndexModel;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::IndexOptions,
    Collection, Database,
};

const COLLECTION: &str = "users";

#[derive(Clone)]
pub struct UserStore {
    users: Arc<Collection<User>>,
}

impl UserStore {
    pub(crate) async fn new(db: &Database) -> Result<Self> {
        let users = db.collection(COLLECTION);
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(index).await?;
        Ok(UserStore {
            users: Arc::new(users),
        })
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<User>> {
        Ok(self
            .users
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn get_by_email(&self, session: &mut Session, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .find_one(doc! { "email": email })
            .session(&mut *session)
            .await?)
    }

    pub async fn insert(&self, session: &mut Session, user: &User) -> Result<()> {
        info!("Inserting user: {:?}", user);
        let result = self
            .users
            .update_one(
                doc! { "email": &user.email },
                doc! { "$setOnInsert": to_document(user)? },
            )
            .session(&mut *session)
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await?;
        if result.upserted_id.is_none() {
            return Err(Error::msg("User already exists"));
        }
        Ok(())
    }

    pub async fn count(&self, session: &mut Session) -> Result<u64> {
        Ok(self
            .users
            .count_documents(doc! {})
            .session(&mut *session)
            .await?)
    }

    pub async fn find(
        &self,
        session: &mut Session,
        keywords: &[&str],
        offset: u64,
        limit: u64,
    ) -> Result<Vec<User>> {
        let mut query = doc! {};
        if !keywords.is_empty() {
            let mut keyword_query = vec![];
            for keyword in keywords {
                let regex = format!("^{}", keyword);
                keyword_query.push(doc! {
                    "$or": [
                        { "name": { "$regex": &regex, "$options": "i" } },
                        { "email": { "$regex": &regex, "$options": "i" } },
                    ]
                });
            }
            query = doc! { "$or": keyword_query };
        }
        let mut cursor = self
            .users
            .find(query)
            .skip(offset)
            .limit(limit as i64)
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn set_role(&self, session: &mut Session, id: ObjectId, role: Role) -> Result<()> {
        info!("Set role for user {}: {:?}", id, role);
        let result = self
            .users
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "role": format!("{:?}", role) }, "$inc": { "version": 1 } },
            )
            .session(&mut *session)
            .await?;
        if result.modified_count == 0 {
            return Err(Error::msg("User not found"));
        }
        Ok(())
    }

    pub async fn set_specializations(
        &self,
        session: &mut Session,
        id: ObjectId,
        specializations: &[ClassType],
    ) -> Result<()> {
        info!("Set specializations for user {}: {:?}", id, specializations);
        let specializations = specializations
            .iter()
            .map(|tp| format!("{:?}", tp))
            .collect::<Vec<_>>();
        let result = self
            .users
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": { "specializations": specializations },
                    "$inc": { "version": 1 },
                },
            )
            .session(&mut *session)
            .await?;
        if result.matched_count != 1 {
            return Err(Error::msg("User not found"));
        }
        Ok(())
    }

    pub async fn add_subscription(
        &self,
        session: &mut Session,
        id: ObjectId,
        sub: &UserSubscription,
        bonus_credits: u32,
    ) -> Result<()> {
        info!("Add subscription for user {}: {:?}", id, sub);
        let result = self
            .users
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$push": { "subscriptions": to_document(sub)? },
                    "$inc": { "pt_credits": bonus_credits as i64, "version": 1 },
                },
            )
            .session(&mut *session)
            .await?;
        if result.modified_count != 1 {
            return Err(Error::msg("User not found"));
        }
        Ok(())
    }

    pub async fn remove_subscription(
        &self,
        session: &mut Session,
        id: ObjectId,
        subscription_id: ObjectId,
    ) -> Result<bool> {
        info!("Remove subscription {} for user {}", subscription_id, id);
        let result = self
            .users
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$pull": { "subscriptions": { "id": subscription_id } },
                    "$inc": { "version": 1 },
                },
            )
            .session(&mut *session)
            .await?;
        Ok(result.modified_count == 1)
    }

    /// Full-document replacement for multi-field edits resolved in memory.
    pub async fn update(&self, session: &mut Session, user: &mut User) -> Result<()> {
        user.version += 1;
        let mut update = to_document(user)?;
        update.remove("_id");
        let result = self
            .users
            .update_one(doc! { "_id": user.id }, doc! { "$set": update })
            .session(&mut *session)
            .await?;
        if result.modified_count != 1 {
            return Err(Error::msg("User not found"));
        }
        Ok(())
    }

    /// Guarded decrement; the filter keeps the balance from going below
    /// zero under concurrent writers.
    pub async fn debit_credit(&self, session: &mut Session, id: ObjectId) -> Result<bool> {
        info!("Debit session credit for user {}", id);
        let result = self
            .users
            .update_one(
                doc! { "_id": id, "pt_credits": { "$gte": 1 } },
                doc! { "$inc": { "pt_credits": -1, "version": 1 } },
            )
            .session(&mut *session)
            .await?;
        Ok(result.modified_count == 1)
    }

    pub async fn refund_credit(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        info!("Refund session credit for user {}", id);
        let result = self
            .users
            .update_one(
                doc! { "_id": id },
                doc! { "$inc": { "pt_credits": 1, "version": 1 } },
            )
            .session(&mut *session)
            .await?;
        if result.modified_count != 1 {
            return Err(Error::msg("User not found"));
        }
        Ok(())
    }

    pub async fn change_credits(
        &self,
        session: &mut Session,
        id: ObjectId,
        amount: i32,
    ) -> Result<bool> {
        info!("Change credits for user {}: {}", id, amount);
        let filter = if amount < 0 {
            doc! { "_id": id, "pt_credits": { "$gte": amount.abs() } }
        } else {
            doc! { "_id": id }
        };
        let result = self
            .users
            .update_one(
                filter,
                doc! { "$inc": { "pt_credits": amount as i64, "version": 1 } },
            )
            .session(&mut *session)
            .await?;
        Ok(result.modified_count == 1)
    }
}
