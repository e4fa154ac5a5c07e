pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod mail;
pub mod survey;
pub mod templates;

pub use error::FormFlowError;
