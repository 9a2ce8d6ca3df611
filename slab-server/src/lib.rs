//! Slab label server
//!
//! Issues certification labels for graded items: creates the record, encodes
//! its verification URL, renders the label, stores label and code images,
//! and prints them singly or in bulk.
//!
//! # Modules
//!
//! - [`core`] - configuration, state, HTTP server
//! - [`store`] - record store (redb) and artifact store (filesystem)
//! - [`labels`] - label factory over `slab_printer`
//! - [`issuance`] - single issuance state machine
//! - [`batch`] - batch issuance
//! - [`printing`] - direct print and mass print
//! - [`records`] - update, delete, photos, verification view
//! - [`api`] - axum routes

pub mod api;
pub mod batch;
pub mod core;
pub mod issuance;
pub mod labels;
pub mod printing;
pub mod records;
pub mod store;
pub mod utils;

pub use crate::core::{Config, Server, ServerError, ServerState};

/// 设置运行环境 - 初始化日志 (级别与目录来自配置)
pub fn setup_environment(config: &Config) {
    utils::logger::init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
}
