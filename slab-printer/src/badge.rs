//! Grade badges
//!
//! Badge selection is a lookup table with an explicit default entry: every
//! grade string maps to some badge, unknown or empty grades included.

use crate::error::{RenderError, RenderResult};
use crate::font;
use image::{Rgba, RgbaImage};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeKind {
    GemMint10,
    Mint9,
    NearMint8,
    Default,
}

/// Exact grade value -> badge
const GRADE_TABLE: [(&str, BadgeKind); 3] = [
    ("10", BadgeKind::GemMint10),
    ("9", BadgeKind::Mint9),
    ("8", BadgeKind::NearMint8),
];

impl BadgeKind {
    pub const ALL: [BadgeKind; 4] = [
        BadgeKind::GemMint10,
        BadgeKind::Mint9,
        BadgeKind::NearMint8,
        BadgeKind::Default,
    ];

    /// Badge for a grade; never fails
    pub fn for_grade(grade: &str) -> Self {
        let grade = grade.trim();
        GRADE_TABLE
            .iter()
            .find(|(known, _)| *known == grade)
            .map(|(_, kind)| *kind)
            .unwrap_or(BadgeKind::Default)
    }

    /// File name looked up in a badge override directory
    pub fn file_name(&self) -> &'static str {
        match self {
            BadgeKind::GemMint10 => "gem_mint_10.png",
            BadgeKind::Mint9 => "mint_9.png",
            BadgeKind::NearMint8 => "near_mint_8.png",
            BadgeKind::Default => "default.png",
        }
    }

    /// Fill colour of the built-in badge
    pub fn fill(&self) -> Rgba<u8> {
        match self {
            BadgeKind::GemMint10 => Rgba([0xC9, 0xA2, 0x27, 0xFF]),
            BadgeKind::Mint9 => Rgba([0x4F, 0x86, 0xC6, 0xFF]),
            BadgeKind::NearMint8 => Rgba([0x2E, 0x8B, 0x57, 0xFF]),
            BadgeKind::Default => Rgba([0x80, 0x80, 0x80, 0xFF]),
        }
    }

    fn caption(&self) -> (&'static str, &'static str) {
        match self {
            BadgeKind::GemMint10 => ("GEM MT", "10"),
            BadgeKind::Mint9 => ("MINT", "9"),
            BadgeKind::NearMint8 => ("NM-MT", "8"),
            BadgeKind::Default => ("GRADED", "-"),
        }
    }

    fn index(&self) -> usize {
        match self {
            BadgeKind::GemMint10 => 0,
            BadgeKind::Mint9 => 1,
            BadgeKind::NearMint8 => 2,
            BadgeKind::Default => 3,
        }
    }
}

/// One bitmap per [`BadgeKind`]
#[derive(Debug, Clone)]
pub struct BadgeSet {
    badges: [RgbaImage; 4],
}

impl BadgeSet {
    /// Procedurally drawn badges, `height_px` tall
    pub fn builtin(height_px: u32) -> Self {
        let height_px = height_px.max(font::GLYPH_H * 2 + 4);
        Self {
            badges: BadgeKind::ALL.map(|kind| draw_builtin(kind, height_px)),
        }
    }

    /// Built-in badges, each replaced by `dir/<file_name>` when that file
    /// exists. A present but unreadable file is an error.
    pub fn load_dir(dir: &Path, height_px: u32) -> RenderResult<Self> {
        let mut set = Self::builtin(height_px);
        for kind in BadgeKind::ALL {
            let path = dir.join(kind.file_name());
            if !path.is_file() {
                debug!(path = %path.display(), "badge override not present");
                continue;
            }
            let img = image::open(&path).map_err(|e| RenderError::Asset {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            info!(path = %path.display(), badge = ?kind, "badge override loaded");
            set.badges[kind.index()] = img.to_rgba8();
        }
        Ok(set)
    }

    pub fn get(&self, kind: BadgeKind) -> &RgbaImage {
        &self.badges[kind.index()]
    }

    /// Badge for a grade string
    pub fn for_grade(&self, grade: &str) -> &RgbaImage {
        self.get(BadgeKind::for_grade(grade))
    }
}

fn draw_builtin(kind: BadgeKind, height: u32) -> RgbaImage {
    let width = height * 4 / 5;
    let fill = kind.fill();
    let edge = Rgba([0x00, 0x00, 0x00, 0xFF]);
    let ink = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
    let rim = (height / 24).max(1);

    let mut img = RgbaImage::from_fn(width, height, |x, y| {
        if x < rim || y < rim || x >= width - rim || y >= height - rim {
            edge
        } else {
            fill
        }
    });

    let (caption, grade) = kind.caption();
    let inner_w = width.saturating_sub(4 * rim);
    let inner_h = height.saturating_sub(4 * rim);

    let (caption, caption_scale) = font::fit(caption, inner_w, inner_h / 3, 4);
    let caption_y = 2 * rim;
    let caption_x = (width - font::text_width(&caption, caption_scale)) / 2;
    font::draw_text(&mut img, caption_x, caption_y, &caption, caption_scale, ink);

    let grade_top = caption_y + font::text_height(caption_scale) + rim;
    let grade_room = height.saturating_sub(grade_top + 2 * rim);
    let (grade, grade_scale) = font::fit(grade, inner_w, grade_room, 8);
    let grade_x = (width - font::text_width(&grade, grade_scale).min(width)) / 2;
    let grade_y = grade_top + grade_room.saturating_sub(font::text_height(grade_scale)) / 2;
    font::draw_text(&mut img, grade_x, grade_y, &grade, grade_scale, ink);

    img
}
