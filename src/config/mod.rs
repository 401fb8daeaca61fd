pub mod database;
pub mod server;
