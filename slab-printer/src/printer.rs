//! Printer adapters for sending laid-out pages to a device
//!
//! Supports:
//! - Spool directory (one PNG per page, for a watcher or manual printing)
//! - CUPS `lp` command (one job per page, PNG on stdin)

use crate::error::{PrintError, PrintResult};
use crate::layout::Page;
use crate::raster;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send every page of a document to the device
    async fn print(&self, job: &str, pages: &[Page]) -> PrintResult<()>;

    /// Check if the printer is ready to accept jobs
    async fn is_online(&self) -> bool;
}

/// Writes pages as `{job}_{n}.png` into a directory
#[derive(Debug, Clone)]
pub struct SpoolPrinter {
    dir: PathBuf,
}

impl SpoolPrinter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Printer for SpoolPrinter {
    #[instrument(skip(self, pages), fields(dir = %self.dir.display(), pages = pages.len()))]
    async fn print(&self, job: &str, pages: &[Page]) -> PrintResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        for (n, page) in pages.iter().enumerate() {
            let bytes = raster::encode_png(&page.image).map_err(render_to_print)?;
            let path = self.dir.join(format!("{}_{:03}.png", sanitize(job), n + 1));
            tokio::fs::write(&path, bytes).await?;
            info!(path = %path.display(), labels = page.label_count(), "Page spooled");
        }
        Ok(())
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn is_online(&self) -> bool {
        match tokio::fs::create_dir_all(&self.dir).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Spool directory unavailable");
                false
            }
        }
    }
}

/// CUPS queue driven through the `lp` command
#[derive(Debug, Clone)]
pub struct LpPrinter {
    queue: String,
}

impl LpPrinter {
    pub fn new(queue: &str) -> PrintResult<Self> {
        let queue = queue.trim();
        if queue.is_empty() || queue.contains(char::is_whitespace) {
            return Err(PrintError::InvalidConfig(format!(
                "Invalid lp queue name: {:?}",
                queue
            )));
        }
        Ok(Self {
            queue: queue.to_string(),
        })
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }
}

impl Printer for LpPrinter {
    #[instrument(skip(self, pages), fields(queue = %self.queue, pages = pages.len()))]
    async fn print(&self, job: &str, pages: &[Page]) -> PrintResult<()> {
        for page in pages {
            let bytes = raster::encode_png(&page.image).map_err(render_to_print)?;

            let mut child = Command::new("lp")
                .args(["-d", &self.queue, "-t", job, "-o", "fit-to-page=false", "-"])
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .spawn()?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(&bytes).await?;
                stdin.shutdown().await?;
            }

            let output = child.wait_with_output().await?;
            if !output.status.success() {
                return Err(PrintError::CommandFailed {
                    status: output.status.to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }
            info!(bytes = bytes.len(), "Page sent to lp");
        }
        Ok(())
    }

    #[instrument(skip(self), fields(queue = %self.queue))]
    async fn is_online(&self) -> bool {
        match Command::new("lpstat")
            .args(["-p", &self.queue])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) if status.success() => true,
            Ok(status) => {
                warn!(%status, "Printer queue not ready");
                false
            }
            Err(e) => {
                warn!(error = %e, "lpstat unavailable");
                false
            }
        }
    }
}

/// Printer selected at runtime from configuration
#[derive(Debug, Clone)]
pub enum AnyPrinter {
    Spool(SpoolPrinter),
    Lp(LpPrinter),
}

impl AnyPrinter {
    /// Parse `spool` or `lp:<queue>`; spooled pages go to `spool_dir`
    pub fn from_setting(setting: &str, spool_dir: impl Into<PathBuf>) -> PrintResult<Self> {
        match setting.trim() {
            "spool" => Ok(Self::Spool(SpoolPrinter::new(spool_dir))),
            other => match other.strip_prefix("lp:") {
                Some(queue) => Ok(Self::Lp(LpPrinter::new(queue)?)),
                None => Err(PrintError::InvalidConfig(format!(
                    "Unknown printer setting: {}",
                    other
                ))),
            },
        }
    }
}

impl Printer for AnyPrinter {
    async fn print(&self, job: &str, pages: &[Page]) -> PrintResult<()> {
        match self {
            Self::Spool(p) => p.print(job, pages).await,
            Self::Lp(p) => p.print(job, pages).await,
        }
    }

    async fn is_online(&self) -> bool {
        match self {
            Self::Spool(p) => p.is_online().await,
            Self::Lp(p) => p.is_online().await,
        }
    }
}

fn render_to_print(e: crate::error::RenderError) -> PrintError {
    match e {
        crate::error::RenderError::Image(e) => PrintError::Encode(e),
        other => PrintError::InvalidConfig(other.to_string()),
    }
}

/// Job names become file names; keep them to a safe alphabet
fn sanitize(job: &str) -> String {
    let cleaned: String = job
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() { "job".to_string() } else { cleaned }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::Rect;
    use image::{Rgba, RgbaImage};

    fn page(shade: u8) -> Page {
        Page {
            image: RgbaImage::from_pixel(8, 4, Rgba([shade, shade, shade, 255])),
            slots: vec![Rect::new(0, 0, 8, 4)],
        }
    }

    #[tokio::test]
    async fn test_spool_writes_one_file_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let printer = SpoolPrinter::new(dir.path().join("spool"));
        assert!(printer.is_online().await);

        printer.print("mass print", &[page(10), page(20)]).await.unwrap();

        let first = dir.path().join("spool/mass_print_001.png");
        let second = dir.path().join("spool/mass_print_002.png");
        assert!(first.is_file());
        assert!(second.is_file());
        let decoded = raster::decode(&std::fs::read(second).unwrap()).unwrap();
        assert_eq!(decoded, page(20).image);
    }

    #[test]
    fn test_from_setting() {
        assert!(matches!(
            AnyPrinter::from_setting("spool", "/tmp/x"),
            Ok(AnyPrinter::Spool(_))
        ));
        match AnyPrinter::from_setting("lp:Label_Writer", "/tmp/x") {
            Ok(AnyPrinter::Lp(p)) => assert_eq!(p.queue(), "Label_Writer"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            AnyPrinter::from_setting("lp:", "/tmp/x"),
            Err(PrintError::InvalidConfig(_))
        ));
        assert!(matches!(
            AnyPrinter::from_setting("tcp:1.2.3.4", "/tmp/x"),
            Err(PrintError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("label Xq3/../x"), "label_Xq3____x");
        assert_eq!(sanitize(""), "job");
    }
}
