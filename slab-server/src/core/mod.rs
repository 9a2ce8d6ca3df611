//! 核心模块
//!
//! 启动期的一切：环境配置 ([`Config`])、共享状态 ([`ServerState`])、
//! HTTP 服务 ([`Server`]) 以及启动错误 ([`ServerError`])。

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
