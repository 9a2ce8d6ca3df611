use slab_printer::{PrintError, RenderError};
use thiserror::Error;

use crate::store::RecordStoreError;

/// 启动与运行期错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("记录库错误: {0}")]
    Storage(#[from] RecordStoreError),

    #[error("标签资源加载失败: {0}")]
    Render(#[from] RenderError),

    #[error("打印机配置错误: {0}")]
    Printer(#[from] PrintError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 服务器 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
