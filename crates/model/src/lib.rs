pub mod class;
pub mod equipment;
pub mod errors;
pub mod history;
pub mod private_session;
pub mod rights;
pub mod session;
pub mod slot;
pub mod subscription;
pub mod user;
