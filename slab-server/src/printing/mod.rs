//! 打印服务 - 单张直打与批量补打

mod service;

pub use service::{
    MassPrintJob, MassPrintReport, PrintService, PrintServiceError, PrintServiceResult,
    SkippedLabel,
};
