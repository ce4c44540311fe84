use eyre::Result;
use model::session::Session;
use mongodb::bson::oid::ObjectId;
use service::equipment::Equipment;
use service::history::History;
use service::roster::Roster;
use service::scheduler::Scheduler;
use service::subscriptions::Subscriptions;
use service::users::Users;
use storage::Storage;

pub mod service;

/// Service facade over the stores. Everything mutating goes through here.
#[derive(Clone)]
pub struct Ledger {
    pub db: storage::session::Db,
    pub users: Users,
    pub roster: Roster,
    pub scheduler: Scheduler,
    pub subscriptions: Subscriptions,
    pub equipment: Equipment,
    pub history: History,
}

impl Ledger {
    pub fn new(storage: Storage) -> Self {
        let history = History::new(storage.history);
        let users = Users::new(storage.users, history.clone());
        let roster = Roster::new(storage.classes, users.clone(), history.clone());
        let scheduler = Scheduler::new(storage.sessions, users.clone(), history.clone());
        let subscriptions = Subscriptions::new(users.clone(), history.clone());
        let equipment = Equipment::new(storage.equipment, users.clone(), history.clone());
        Ledger {
            db: storage.db,
            users,
            roster,
            scheduler,
            subscriptions,
            equipment,
            history,
        }
    }

    pub async fn session(&self, actor: ObjectId) -> Result<Session> {
        let client_session = self.db.start_session().await?;
        Ok(Session::new(client_session, actor))
    }
}
