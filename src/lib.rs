pub mod config;
pub mod error;
pub mod flows;
pub mod http_client;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod routes;
pub mod services;
pub mod session;
pub mod storage;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{AppError, AppResult};
