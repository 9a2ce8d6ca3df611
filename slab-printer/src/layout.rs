//! Print formatter
//!
//! Packs label rasters onto pages of physical label stock. Pages are
//! rendered at the labels' own pixel density and labels are placed without
//! resampling, so a printed label keeps its real-world size.

use crate::compositor::{LabelSpec, Rect};
use crate::error::{LayoutError, LayoutResult};
use image::{Rgba, RgbaImage, imageops};
use serde::{Deserialize, Serialize};

/// Sheet of label stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub width_mm: f32,
    pub height_mm: f32,
    /// Space between neighbouring labels
    pub gap_mm: f32,
    pub margin_mm: f32,
    /// Pixel density shared with the labels placed on it
    pub px_per_mm: f32,
}

impl PageSpec {
    pub fn new(width_mm: f32, height_mm: f32, gap_mm: f32, margin_mm: f32, label: &LabelSpec) -> Self {
        Self {
            width_mm,
            height_mm,
            gap_mm,
            margin_mm,
            px_per_mm: label.px_per_mm(),
        }
    }

    /// A page exactly the size of one label, for direct printing
    pub fn single_label(label: &LabelSpec) -> Self {
        Self {
            width_mm: label.width_mm,
            height_mm: label.height_mm,
            gap_mm: 0.0,
            margin_mm: 0.0,
            px_per_mm: label.px_per_mm(),
        }
    }

    fn px(&self, mm: f32) -> u32 {
        (mm * self.px_per_mm).round().max(0.0) as u32
    }

    pub fn width_px(&self) -> u32 {
        self.px(self.width_mm)
    }

    pub fn height_px(&self) -> u32 {
        self.px(self.height_mm)
    }

    pub fn gap_px(&self) -> u32 {
        self.px(self.gap_mm)
    }

    pub fn margin_px(&self) -> u32 {
        self.px(self.margin_mm)
    }

    /// Printable area inside the margins
    pub fn area(&self) -> LayoutResult<Rect> {
        let margin = self.margin_px();
        let (w, h) = (self.width_px(), self.height_px());
        if w <= 2 * margin || h <= 2 * margin {
            return Err(LayoutError::InvalidPage(format!(
                "{}x{}mm page with {}mm margins has no printable area",
                self.width_mm, self.height_mm, self.margin_mm
            )));
        }
        Ok(Rect::new(margin, margin, w - 2 * margin, h - 2 * margin))
    }

    /// Columns and rows of `cell_w` x `cell_h` labels per page, at least 1x1
    pub fn grid(&self, cell_w: u32, cell_h: u32) -> LayoutResult<(u32, u32)> {
        let area = self.area()?;
        let gap = self.gap_px();
        let fit = |room: u32, cell: u32| ((room + gap) / (cell + gap).max(1)).max(1);
        Ok((fit(area.w, cell_w), fit(area.h, cell_h)))
    }
}

/// One laid-out page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub image: RgbaImage,
    /// Where each label landed, in input order
    pub slots: Vec<Rect>,
}

impl Page {
    pub fn label_count(&self) -> usize {
        self.slots.len()
    }
}

/// Pack `labels` row-major onto as many pages as needed.
///
/// Every label occupies a cell the size of the largest label. An empty input
/// yields no pages.
pub fn layout(labels: &[RgbaImage], page: &PageSpec) -> LayoutResult<Vec<Page>> {
    if labels.is_empty() {
        return Ok(Vec::new());
    }

    let area = page.area()?;
    let cell_w = labels.iter().map(|l| l.width()).max().unwrap_or(0);
    let cell_h = labels.iter().map(|l| l.height()).max().unwrap_or(0);
    if cell_w > area.w || cell_h > area.h {
        return Err(LayoutError::LabelExceedsPage {
            label_w: cell_w,
            label_h: cell_h,
            area_w: area.w,
            area_h: area.h,
        });
    }

    let (cols, rows) = page.grid(cell_w, cell_h)?;
    let per_page = (cols * rows) as usize;
    let gap = page.gap_px();

    Ok(labels
        .chunks(per_page)
        .map(|chunk| {
            let mut image = RgbaImage::from_pixel(
                page.width_px(),
                page.height_px(),
                Rgba([0xFF, 0xFF, 0xFF, 0xFF]),
            );
            let slots = chunk
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    let (col, row) = (i as u32 % cols, i as u32 / cols);
                    let x = area.x + col * (cell_w + gap);
                    let y = area.y + row * (cell_h + gap);
                    imageops::replace(&mut image, label, x as i64, y as i64);
                    Rect::new(x, y, label.width(), label.height())
                })
                .collect();
            Page { image, slots }
        })
        .collect())
}
