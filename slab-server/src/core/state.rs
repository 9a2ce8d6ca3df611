use std::path::PathBuf;
use std::sync::Arc;

use slab_printer::{AnyPrinter, LabelSpec, PageSpec};

use crate::batch::BatchController;
use crate::core::{Config, Result, ServerError};
use crate::issuance::IssuanceController;
use crate::labels::LabelFactory;
use crate::printing::PrintService;
use crate::records::RecordService;
use crate::store::{ArtifactStore, FsArtifactStore, RecordStore, RedbRecordStore};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段都是 `Arc` 或廉价可克隆的句柄，可以直接作为 axum 的 `State`。
///
/// | 字段 | 说明 |
/// |------|------|
/// | records | 记录库 (redb) |
/// | artifacts | 产物存储 (文件系统) |
/// | issuance | 单张签发 |
/// | batch | 批量签发 |
/// | printing | 直打 / 批量补打 |
/// | record_service | 更新 / 删除 / 验证页 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Arc<Config>,
    pub records: Arc<dyn RecordStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub labels: Arc<LabelFactory>,
    pub issuance: IssuanceController,
    pub batch: BatchController,
    pub printing: PrintService,
    pub record_service: RecordService,
}

impl ServerState {
    /// 由已构造的存储和打印机组装状态
    ///
    /// 测试中用内存存储调用此方法
    pub fn new(
        config: Config,
        records: Arc<dyn RecordStore>,
        artifacts: Arc<dyn ArtifactStore>,
        labels: LabelFactory,
        printer: AnyPrinter,
    ) -> Result<Self> {
        let labels = Arc::new(labels);
        let spec: LabelSpec = labels.spec().clone();
        let sheet = PageSpec::new(
            config.page_width_mm,
            config.page_height_mm,
            config.page_gap_mm,
            config.page_margin_mm,
            &spec,
        );
        sheet
            .area()
            .map_err(|e| ServerError::Config(format!("标签纸尺寸无效: {e}")))?;
        labels
            .check_code_fits()
            .map_err(|e| ServerError::Config(format!("验证码放不进标签: {e}")))?;

        let issuance = IssuanceController::new(records.clone(), artifacts.clone(), labels.clone());
        let batch = BatchController::new(issuance.clone(), config.artifact_concurrency, sheet.clone());
        let printing = PrintService::new(
            artifacts.clone(),
            Arc::new(printer),
            PageSpec::single_label(&spec),
            sheet,
            config.artifact_concurrency,
        );
        let record_service = RecordService::new(records.clone(), artifacts.clone(), issuance.clone());

        Ok(Self {
            config: Arc::new(config),
            records,
            artifacts,
            labels,
            issuance,
            batch,
            printing,
            record_service,
        })
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 记录库 (work_dir/records.redb)
    /// 3. 产物存储 (work_dir/artifacts)
    /// 4. Logo / 徽章资源与打印机
    pub async fn initialize(config: &Config) -> Result<Self> {
        let work_dir = PathBuf::from(&config.work_dir);
        for dir in [work_dir.clone(), config.artifacts_dir(), config.spool_dir()] {
            tokio::fs::create_dir_all(&dir).await?;
        }

        let records = RedbRecordStore::open(config.records_db_path())?;
        let artifacts = FsArtifactStore::new(config.artifacts_dir(), config.artifact_base_url.clone());
        let labels = LabelFactory::from_config(config)?;
        let printer = AnyPrinter::from_setting(&config.printer, config.spool_dir())?;

        tracing::info!(
            work_dir = %work_dir.display(),
            public_base_url = %config.public_base_url,
            printer = %config.printer,
            "Server state initialized"
        );

        Self::new(
            config.clone(),
            Arc::new(records),
            Arc::new(artifacts),
            labels,
            printer,
        )
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }
}
