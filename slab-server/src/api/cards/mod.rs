//! Card API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/cards | POST | 单张签发 (可附带正反面照片) |
//! | /api/cards/batch | POST | 批量签发 |
//! | /api/cards/{id} | PUT | 更新字段并重新渲染 |
//! | /api/cards/{id} | DELETE | 删除记录及全部产物 |
//! | /api/cards/{id}/photos/{side} | POST | 上传照片 (base64) |
//! | /api/cards/{id}/print | POST | 直打已存储的标签 |

mod handler;

use axum::{
    Router,
    routing::{post, put},
};

use crate::core::ServerState;

/// Card router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cards", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/batch", post(handler::batch))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/photos/{side}", post(handler::attach_photo))
        .route("/{id}/print", post(handler::print))
}
