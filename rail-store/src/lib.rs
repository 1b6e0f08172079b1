pub mod app_config;
pub mod database;
pub mod train_repo;
pub mod user_repo;

pub use database::DbClient;
pub use train_repo::PgStore;
