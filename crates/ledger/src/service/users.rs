use eyre::Result;
use log::info;
use model::class::ClassType;
use model::errors::LedgerError;
use model::rights::{Role, Rule};
use model::session::Session;
use model::user::{sanitize_email, User};
use mongodb::bson::oid::ObjectId;
use storage::user::UserStore;
use tx_macro::tx;

use super::history::History;

#[derive(Clone)]
pub struct Users {
    store: UserStore,
    logs: History,
}

impl Users {
    pub(crate) fn new(store: UserStore, logs: History) -> Self {
        Users { store, logs }
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<User>> {
        self.store.get(session, id).await
    }

    pub async fn get_by_email(&self, session: &mut Session, email: &str) -> Result<Option<User>> {
        self.store.get_by_email(session, &sanitize_email(email)).await
    }

    /// Resolves the acting user recorded on the session.
    pub async fn actor(&self, session: &mut Session) -> Result<User, LedgerError> {
        let id = session.actor();
        self.store
            .get(session, id)
            .await?
            .ok_or(LedgerError::UserNotFound(id))
    }

    pub async fn find(
        &self,
        session: &mut Session,
        keywords: &[&str],
        offset: u64,
        limit: u64,
    ) -> Result<Vec<User>> {
        let actor = self.actor(session).await?;
        actor.role.ensure(Rule::ViewUsers)?;
        Ok(self.store.find(session, keywords, offset, limit).await?)
    }

    #[tx]
    pub async fn create(
        &self,
        session: &mut Session,
        name: String,
        email: String,
        role: Role,
    ) -> Result<User, LedgerError> {
        let actor = self.actor(session).await?;
        actor.role.ensure(Rule::CreateUser)?;

        let email = sanitize_email(&email);
        if email.is_empty() || !email.contains('@') {
            return Err(LedgerError::InvalidInput(format!("invalid email:{}", email)));
        }
        if self.store.get_by_email(session, &email).await?.is_some() {
            return Err(LedgerError::InvalidInput(format!(
                "email already taken:{}",
                email
            )));
        }

        let user = User::new(name, email.clone(), role);
        self.store.insert(session, &user).await?;
        self.logs.create_user(session, user.id, email).await?;
        Ok(user)
    }

    /// First account in an empty database; used by the bootstrap binary.
    pub async fn bootstrap_admin(
        &self,
        session: &mut Session,
        name: String,
        email: String,
    ) -> Result<Option<User>> {
        if self.store.count(session).await? > 0 {
            return Ok(None);
        }
        info!("Bootstrapping first admin account: {}", email);
        let email = sanitize_email(&email);
        let user = User::new(name, email.clone(), Role::Admin);
        self.store.insert(session, &user).await?;
        self.logs.create_user(session, user.id, email).await?;
        Ok(Some(user))
    }

    /// Qualification list consulted when a trainer is assigned to a
    /// class; an empty list means unrestricted.
    #[tx]
    pub async fn set_specializations(
        &self,
        session: &mut Session,
        id: ObjectId,
        specializations: Vec<ClassType>,
    ) -> Result<(), LedgerError> {
        let actor = self.actor(session).await?;
        actor.role.ensure(Rule::EditSpecializations)?;

        let user = self
            .store
            .get(session, id)
            .await?
            .ok_or(LedgerError::UserNotFound(id))?;
        if !user.is_trainer() {
            return Err(LedgerError::InvalidInput(format!(
                "user is not a trainer:{}",
                id
            )));
        }
        self.store
            .set_specializations(session, id, &specializations)
            .await?;
        self.logs
            .set_specializations(session, id, specializations)
            .await?;
        Ok(())
    }

    #[tx]
    pub async fn set_role(
        &self,
        session: &mut Session,
        id: ObjectId,
        role: Role,
    ) -> Result<(), LedgerError> {
        let actor = self.actor(session).await?;
        actor.role.ensure(Rule::EditUserRole)?;

        if self.store.get(session, id).await?.is_none() {
            return Err(LedgerError::UserNotFound(id));
        }
        self.store.set_role(session, id, role).await?;
        self.logs.change_role(session, id).await?;
        Ok(())
    }

    #[tx]
    pub async fn change_credits(
        &self,
        session: &mut Session,
        id: ObjectId,
        amount: i32,
    ) -> Result<(), LedgerError> {
        let actor = self.actor(session).await?;
        actor.role.ensure(Rule::ChangeCredits)?;

        if self.store.get(session, id).await?.is_none() {
            return Err(LedgerError::UserNotFound(id));
        }
        if !self.store.change_credits(session, id, amount).await? {
            return Err(LedgerError::CreditExhausted(id));
        }
        self.logs.change_credits(session, id, amount).await?;
        Ok(())
    }

    pub(crate) fn store(&self) -> &UserStore {
        &self.store
    }
}
