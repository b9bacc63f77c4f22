pub mod common;
pub mod config;
pub mod constants;
pub mod core;
pub mod enums;
pub mod errors;
pub mod models;
pub mod utils;
