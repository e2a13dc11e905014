pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod rewards;
pub mod solana;
pub mod utils;
pub mod validation;
pub mod web;

pub use error::{Error, Result};
