pub mod class;
pub mod equipment;
pub mod history;
pub mod private_session;
pub mod session;
pub mod user;

use eyre::Result;
use session::Db;

const DB_NAME: &str = "club_db";

#[derive(Clone)]
pub struct Storage {
    pub db: Db,
    pub users: user::UserStore,
    pub classes: class::ClassStore,
    pub sessions: private_session::SessionStore,
    pub equipment: equipment::EquipmentStore,
    pub history: history::HistoryStore,
}

impl Storage {
    pub async fn new(uri: &str) -> Result<Self> {
        let db = Db::new(uri, DB_NAME).await?;
        let users = user::UserStore::new(&db).await?;
        let classes = class::ClassStore::new(&db).await?;
        let sessions = private_session::SessionStore::new(&db).await?;
        let equipment = equipment::EquipmentStore::new(&db);
        let history = history::HistoryStore::new(&db).await?;

        Ok(Storage {
            db,
            users,
            classes,
            sessions,
            equipment,
            history,
        })
    }
}
