mod aggregate;
pub mod args;
mod auth;
pub mod commands;
mod config;
mod db;
mod error;
mod http;
pub mod model;
mod utils;


pub use config::Config;
pub use error::{ApiError, Error, Result};
