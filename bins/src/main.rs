use std::env;

use dotenv::dotenv;
use eyre::Context as _;
use log::info;
use mongodb::bson::oid::ObjectId;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    if let Err(err) = dotenv() {
        info!("Failed to load .env file: {}", err);
    }
    pretty_env_logger::init();
    color_eyre::install()?;

    info!("connecting to mongo");
    let mongo_url = env::var("MONGO_URL").context("Failed to get MONGO_URL from env")?;
    let storage = storage::Storage::new(&mongo_url)
        .await
        .context("Failed to create storage")?;

    info!("creating ledger");
    let ledger = ledger::Ledger::new(storage);

    let admin_email =
        env::var("ADMIN_EMAIL").context("Failed to get ADMIN_EMAIL from env")?;
    let mut session = ledger.session(ObjectId::new()).await?;
    match ledger
        .users
        .bootstrap_admin(&mut session, "Administrator".to_owned(), admin_email.clone())
        .await?
    {
        Some(admin) => info!("created first admin account {} ({})", admin_email, admin.id),
        None => info!("admin account already present, nothing to do"),
    }

    Ok(())
}
