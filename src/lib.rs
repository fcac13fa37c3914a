pub mod api;
pub mod cli;
pub mod data_collector;
pub mod database;
pub mod error;
pub mod missing_data_log;
pub mod models;
pub mod utils;
