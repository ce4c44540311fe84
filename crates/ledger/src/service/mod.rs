pub mod equipment;
pub mod history;
pub mod roster;
pub mod scheduler;
pub mod subscriptions;
pub mod users;
