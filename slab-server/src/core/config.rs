use std::path::PathBuf;

/// 服务器配置 - 标签签发服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、产物、打印队列、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | PUBLIC_BASE_URL | https://spagrading.com | 验证链接前缀 |
/// | ARTIFACT_BASE_URL | http://localhost:{HTTP_PORT}/artifacts | 产物访问地址前缀 |
/// | ARTIFACT_CONCURRENCY | 4 | 渲染/存储并发上限 |
/// | LABEL_SCALE | 2 | 标签像素倍率 |
/// | BADGE_DIR | - | 自定义评级徽章目录 |
/// | LOGO_PATH | - | 自定义 Logo (PNG) |
/// | PRINTER | spool | `spool` 或 `lp:<queue>` |
/// | PAGE_WIDTH_MM / PAGE_HEIGHT_MM | 148 / 210 | 标签纸尺寸 |
/// | PAGE_GAP_MM / PAGE_MARGIN_MM | 1 / 4 | 标签间距 / 页边距 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录 (按天滚动) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/slab HTTP_PORT=8080 PRINTER=lp:DYMO cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 验证链接前缀 (`{base}/card/{id}`)，签发后不可更改
    pub public_base_url: String,
    /// 产物 URL 前缀
    pub artifact_base_url: String,
    /// 渲染/存储/读取的并发上限
    pub artifact_concurrency: usize,
    /// 标签像素倍率
    pub label_scale: u32,
    pub badge_dir: Option<String>,
    pub logo_path: Option<String>,
    /// 打印机: `spool` | `lp:<queue>`
    pub printer: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub page_gap_mm: f32,
    pub page_margin_mm: f32,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let http_port = env_parse("HTTP_PORT", 3000);
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://spagrading.com".into()),
            artifact_base_url: std::env::var("ARTIFACT_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| default_artifact_base_url(http_port)),
            artifact_concurrency: env_parse::<usize>("ARTIFACT_CONCURRENCY", 4).max(1),
            label_scale: env_parse::<u32>("LABEL_SCALE", 2).max(1),
            badge_dir: std::env::var("BADGE_DIR").ok().filter(|v| !v.is_empty()),
            logo_path: std::env::var("LOGO_PATH").ok().filter(|v| !v.is_empty()),
            printer: std::env::var("PRINTER").unwrap_or_else(|_| "spool".into()),
            page_width_mm: env_parse("PAGE_WIDTH_MM", 148.0),
            page_height_mm: env_parse("PAGE_HEIGHT_MM", 210.0),
            page_gap_mm: env_parse("PAGE_GAP_MM", 1.0),
            page_margin_mm: env_parse("PAGE_MARGIN_MM", 4.0),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.is_empty()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        if std::env::var("ARTIFACT_BASE_URL").is_err() {
            config.artifact_base_url = default_artifact_base_url(http_port);
        }
        config.http_port = http_port;
        config
    }

    /// redb 记录库路径
    pub fn records_db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("records.redb")
    }

    /// 产物根目录
    pub fn artifacts_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("artifacts")
    }

    /// 打印队列目录 (PRINTER=spool)
    pub fn spool_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("spool")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn default_artifact_base_url(http_port: u16) -> String {
    format!("http://localhost:{}/artifacts", http_port)
}
