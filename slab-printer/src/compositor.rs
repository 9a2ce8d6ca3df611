//! Label compositor
//!
//! Renders one label as a raster image. The layout is fixed:
//!
//! ```text
//! +------------------------------------------------------------+
//! | LOGO                        | +--------+ +-------+         |
//! | player                      | |  code  | | badge |         |
//! | year brand                  | +--------+ +-------+         |
//! | #card_number                |                 record id    |
//! +------------------------------------------------------------+
//! ```
//!
//! Rendering is a pure function of its inputs.

use crate::error::{RenderError, RenderResult};
use crate::font;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use shared::models::RecordSnapshot;

/// CSS reference resolution
pub const NOMINAL_DPI: f32 = 96.0;
const MM_PER_INCH: f32 = 25.4;
const PT_PER_INCH: f32 = 72.0;

const WHITE: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const INK: Rgba<u8> = Rgba([0x11, 0x11, 0x11, 0xFF]);

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Physical label description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub width_mm: f32,
    pub height_mm: f32,
    /// Device pixels per nominal pixel
    pub scale: u32,
    /// Frame thickness in nominal pixels
    pub border_px: f32,
    pub padding_px: f32,
    pub border_color: [u8; 3],
    pub logo_height_mm: f32,
    pub text_pt: f32,
    pub id_pt: f32,
}

impl Default for LabelSpec {
    fn default() -> Self {
        Self {
            width_mm: 69.5,
            height_mm: 20.5,
            scale: 2,
            border_px: 6.5,
            padding_px: 4.0,
            border_color: [0x00, 0x47, 0xAB],
            logo_height_mm: 4.0,
            text_pt: 7.0,
            id_pt: 6.0,
        }
    }
}

impl LabelSpec {
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale.max(1);
        self
    }

    /// Device pixels per millimetre
    pub fn px_per_mm(&self) -> f32 {
        NOMINAL_DPI / MM_PER_INCH * self.scale as f32
    }

    pub fn width_px(&self) -> u32 {
        (self.width_mm * self.px_per_mm()).round() as u32
    }

    pub fn height_px(&self) -> u32 {
        (self.height_mm * self.px_per_mm()).round() as u32
    }

    fn nominal(&self, px: f32) -> u32 {
        (px * self.scale as f32).round() as u32
    }

    /// Glyph scale for a point size
    fn glyph_scale(&self, pt: f32) -> u32 {
        let px = pt * NOMINAL_DPI / PT_PER_INCH * self.scale as f32;
        ((px / font::GLYPH_H as f32).floor() as u32).max(1)
    }

    /// Side of the square code bitmap the label expects
    pub fn code_px(&self) -> u32 {
        let layout = self.layout();
        layout.code.w.min(layout.code.h)
    }

    /// Height badges are drawn at before being fitted into their cell
    pub fn badge_height_px(&self) -> u32 {
        (10.0 * self.px_per_mm()).round() as u32
    }

    pub fn layout(&self) -> LabelLayout {
        let width = self.width_px();
        let height = self.height_px();
        let border = self.nominal(self.border_px);
        let inset = border + self.nominal(self.padding_px);
        let inner = Rect::new(
            inset,
            inset,
            width.saturating_sub(2 * inset),
            height.saturating_sub(2 * inset),
        );

        let left = Rect::new(inner.x, inner.y, inner.w / 2, inner.h);
        let right = Rect::new(left.right(), inner.y, inner.w - left.w, inner.h);

        let logo_h = ((self.logo_height_mm * self.px_per_mm()).round() as u32).min(left.h / 2);
        let logo = Rect::new(left.x, left.y, left.w, logo_h);
        let line_h = (left.h - logo_h) / 3;
        let lines = [0, 1, 2].map(|i| Rect::new(left.x, logo.bottom() + i * line_h, left.w, line_h));

        let top_h = right.h * 3 / 4;
        let code_side = top_h.min(right.w / 2);
        let gap = self.nominal(self.padding_px);
        let code = Rect::new(right.x, right.y, code_side, code_side);
        let badge = Rect::new(
            code.right() + gap,
            right.y,
            right.w.saturating_sub(code_side + gap),
            top_h,
        );
        let id = Rect::new(right.x, right.y + top_h, right.w, right.h - top_h);

        LabelLayout {
            width,
            height,
            border,
            logo,
            lines,
            code,
            badge,
            id,
        }
    }
}

/// Pixel geometry of a label at one [`LabelSpec`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelLayout {
    pub width: u32,
    pub height: u32,
    pub border: u32,
    pub logo: Rect,
    /// Subject, year+brand, item number
    pub lines: [Rect; 3],
    pub code: Rect,
    pub badge: Rect,
    pub id: Rect,
}

/// Label renderer bound to a [`LabelSpec`] and an optional logo bitmap
#[derive(Debug, Clone)]
pub struct Compositor {
    spec: LabelSpec,
    layout: LabelLayout,
    logo: Option<RgbaImage>,
}

impl Compositor {
    pub fn new(spec: LabelSpec) -> Self {
        Self {
            layout: spec.layout(),
            spec,
            logo: None,
        }
    }

    /// Use `logo` instead of the built-in wordmark
    pub fn with_logo(mut self, logo: RgbaImage) -> Self {
        self.logo = Some(logo);
        self
    }

    pub fn spec(&self) -> &LabelSpec {
        &self.spec
    }

    pub fn layout(&self) -> &LabelLayout {
        &self.layout
    }

    /// Render `record` with its code bitmap and grade badge.
    ///
    /// The code is pasted unscaled into the code cell; the badge is scaled
    /// to fit its cell keeping its aspect ratio.
    pub fn render(
        &self,
        record: &RecordSnapshot,
        code: &GrayImage,
        badge: &RgbaImage,
    ) -> RenderResult<RgbaImage> {
        let l = &self.layout;
        let cell = l.code.w.min(l.code.h);
        if code.width() > cell || code.height() > cell {
            return Err(RenderError::CodeDoesNotFit {
                code_px: code.width().max(code.height()),
                cell_px: cell,
            });
        }

        let mut img = RgbaImage::from_pixel(l.width, l.height, WHITE);
        self.draw_frame(&mut img);
        self.draw_logo(&mut img);

        let fields = &record.fields;
        let text_scale = self.spec.glyph_scale(self.spec.text_pt);
        let year_brand = fields.year_brand();
        let number = fields.number_line().unwrap_or_default();
        let lines = [fields.player.as_deref().unwrap_or(""), &year_brand, &number];
        for (rect, text) in l.lines.iter().zip(lines) {
            draw_text_in(&mut img, rect, text, text_scale, Align::Left);
        }

        let code_rgba = DynamicImage::ImageLuma8(code.clone()).to_rgba8();
        imageops::replace(&mut img, &code_rgba, l.code.x as i64, l.code.y as i64);

        if let Some(fitted) = fit_into(badge, l.badge.w, l.badge.h) {
            let x = l.badge.x + (l.badge.w - fitted.width()) / 2;
            let y = l.badge.y + (l.badge.h - fitted.height()) / 2;
            paste_over(&mut img, &fitted, x, y);
        }

        let id_scale = self.spec.glyph_scale(self.spec.id_pt);
        draw_text_in(&mut img, &l.id, &record.id, id_scale, Align::Right);

        Ok(img)
    }

    fn draw_frame(&self, img: &mut RgbaImage) {
        let [r, g, b] = self.spec.border_color;
        let color = Rgba([r, g, b, 0xFF]);
        let (w, h, t) = (self.layout.width, self.layout.height, self.layout.border);
        for (x, y, px) in img.enumerate_pixels_mut() {
            if x < t || y < t || x + t >= w || y + t >= h {
                *px = color;
            }
        }
    }

    fn draw_logo(&self, img: &mut RgbaImage) {
        let rect = self.layout.logo;
        match &self.logo {
            Some(logo) => {
                if let Some(fitted) = fit_into(logo, rect.w, rect.h) {
                    paste_over(img, &fitted, rect.x, rect.y);
                }
            }
            None => {
                let [r, g, b] = self.spec.border_color;
                let (text, scale) = font::fit("SPA GRADING", rect.w, rect.h, 8);
                let y = rect.y + (rect.h - font::text_height(scale).min(rect.h)) / 2;
                font::draw_text(img, rect.x, y, &text, scale, Rgba([r, g, b, 0xFF]));
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

fn draw_text_in(img: &mut RgbaImage, rect: &Rect, text: &str, max_scale: u32, align: Align) {
    if text.is_empty() || rect.w == 0 || rect.h == 0 {
        return;
    }
    let (text, scale) = font::fit(text, rect.w, rect.h, max_scale);
    let width = font::text_width(&text, scale).min(rect.w);
    let x = match align {
        Align::Left => rect.x,
        Align::Right => rect.right() - width,
    };
    let y = rect.y + (rect.h - font::text_height(scale).min(rect.h)) / 2;
    font::draw_text(img, x, y, &text, scale, INK);
}

/// Source-over paste; opaque pixels are copied exactly
fn paste_over(dst: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    let (dw, dh) = dst.dimensions();
    for (sx, sy, px) in src.enumerate_pixels() {
        let (dx, dy) = (x + sx, y + sy);
        if dx >= dw || dy >= dh {
            continue;
        }
        let alpha = px[3] as u32;
        match alpha {
            0 => {}
            255 => dst.put_pixel(dx, dy, *px),
            _ => {
                let under = dst.get_pixel_mut(dx, dy);
                for c in 0..3 {
                    under[c] = ((px[c] as u32 * alpha + under[c] as u32 * (255 - alpha)) / 255) as u8;
                }
                under[3] = 0xFF;
            }
        }
    }
}

/// Scale `src` down (never up) to fit `w` x `h`, keeping its aspect ratio
fn fit_into(src: &RgbaImage, w: u32, h: u32) -> Option<RgbaImage> {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 || w == 0 || h == 0 {
        return None;
    }
    if sw <= w && sh <= h {
        return Some(src.clone());
    }
    let ratio = (w as f32 / sw as f32).min(h as f32 / sh as f32);
    let nw = ((sw as f32 * ratio).floor() as u32).clamp(1, w);
    let nh = ((sh as f32 * ratio).floor() as u32).clamp(1, h);
    Some(imageops::resize(src, nw, nh, FilterType::Nearest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::{BadgeKind, BadgeSet};
    use crate::qr;
    use shared::models::{Grade, RecordFields};

    fn snapshot(grade: &str) -> RecordSnapshot {
        RecordSnapshot {
            id: "Xq3Lm9PzR2sT8vW1yB4c".into(),
            fields: RecordFields {
                player: Some("J. Doe".into()),
                year: Some("2024".into()),
                brand: Some("Acme".into()),
                card_number: Some("12".into()),
                grade: Grade::from(grade),
                ..Default::default()
            }
            .normalized(),
        }
    }

    fn render(grade: &str) -> (Compositor, GrayImage, RgbaImage) {
        let compositor = Compositor::new(LabelSpec::default());
        let spec = compositor.spec().clone();
        let url = format!("https://spagrading.com/card/{}", snapshot(grade).id);
        let code = qr::encode(&url, spec.code_px()).unwrap();
        let badges = BadgeSet::builtin(spec.badge_height_px());
        let img = compositor
            .render(&snapshot(grade), &code, badges.for_grade(grade))
            .unwrap();
        (compositor, code, img)
    }

    #[test]
    fn test_default_spec_dimensions() {
        let spec = LabelSpec::default();
        assert_eq!(spec.width_px(), 525);
        assert_eq!(spec.height_px(), 155);

        let layout = spec.layout();
        assert_eq!(layout.border, 13);
        assert!(layout.code.right() <= layout.badge.x);
        assert!(layout.badge.right() <= layout.width - layout.border);
        assert!(layout.id.bottom() <= layout.height - layout.border);
        assert!(layout.lines[2].bottom() <= layout.height - layout.border);
    }

    #[test]
    fn test_scale_changes_resolution_only() {
        let one = LabelSpec::default().with_scale(1);
        let three = LabelSpec::default().with_scale(3);
        assert_eq!(one.width_mm, three.width_mm);
        assert!(three.width_px() > 2 * one.width_px());
        assert!(three.code_px() > one.code_px());
    }

    #[test]
    fn test_render_size_and_frame() {
        let (compositor, _, img) = render("10");
        let layout = compositor.layout();
        assert_eq!(img.dimensions(), (layout.width, layout.height));

        let frame = Rgba([0x00, 0x47, 0xAB, 0xFF]);
        assert_eq!(*img.get_pixel(0, 0), frame);
        assert_eq!(*img.get_pixel(layout.width - 1, layout.height / 2), frame);
        assert_eq!(*img.get_pixel(layout.width / 2, layout.border - 1), frame);
    }

    #[test]
    fn test_code_is_pasted_pixel_exact() {
        let (compositor, code, img) = render("9");
        let rect = compositor.layout().code;
        for (x, y, px) in code.enumerate_pixels() {
            let label_px = img.get_pixel(rect.x + x, rect.y + y);
            assert_eq!(label_px[0], px[0]);
            assert_eq!(label_px[3], 0xFF);
        }
    }

    #[test]
    fn test_badge_cell_shows_selected_badge() {
        for (grade, kind) in [
            ("10", BadgeKind::GemMint10),
            ("9", BadgeKind::Mint9),
            ("8", BadgeKind::NearMint8),
            ("7", BadgeKind::Default),
            ("", BadgeKind::Default),
        ] {
            let (compositor, _, img) = render(grade);
            let rect = compositor.layout().badge;
            let in_cell = |color: Rgba<u8>| {
                img.enumerate_pixels()
                    .any(|(x, y, p)| rect.contains(x, y) && *p == color)
            };
            assert!(in_cell(kind.fill()), "grade {grade:?}");
            for other in BadgeKind::ALL.iter().filter(|k| **k != kind) {
                assert!(!in_cell(other.fill()), "grade {grade:?} shows {other:?}");
            }
        }
    }

    #[test]
    fn test_text_and_id_are_inked() {
        let (compositor, _, img) = render("10");
        let layout = compositor.layout();
        let inked = |rect: Rect| {
            img.enumerate_pixels()
                .any(|(x, y, p)| rect.contains(x, y) && *p == INK)
        };
        assert!(layout.lines.iter().all(|r| inked(*r)));
        assert!(inked(layout.id));

        // id is right-aligned: the rightmost ink column touches the cell edge
        let right_edge = layout.id.right() - 1;
        assert!((layout.id.y..layout.id.bottom()).any(|y| *img.get_pixel(right_edge, y) == INK));
    }

    #[test]
    fn test_render_is_deterministic() {
        let (_, _, a) = render("8");
        let (_, _, b) = render("8");
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_oversized_code_is_rejected() {
        let compositor = Compositor::new(LabelSpec::default());
        let cell = compositor.spec().code_px();
        let code = GrayImage::new(cell + 1, cell + 1);
        let badge = BadgeSet::builtin(40);
        let err = compositor
            .render(&snapshot("10"), &code, badge.get(BadgeKind::Default))
            .unwrap_err();
        assert!(matches!(err, RenderError::CodeDoesNotFit { .. }));
    }

    #[test]
    fn test_custom_logo_is_drawn() {
        let logo = RgbaImage::from_pixel(400, 100, Rgba([0xAA, 0x00, 0x00, 0xFF]));
        let compositor = Compositor::new(LabelSpec::default()).with_logo(logo);
        let spec = compositor.spec().clone();
        let code = qr::encode("https://spagrading.com/card/x", spec.code_px()).unwrap();
        let badges = BadgeSet::builtin(spec.badge_height_px());
        let img = compositor
            .render(&snapshot("10"), &code, badges.for_grade("10"))
            .unwrap();
        let rect = compositor.layout().logo;
        assert_eq!(*img.get_pixel(rect.x, rect.y), Rgba([0xAA, 0x00, 0x00, 0xFF]));
    }

    #[test]
    fn test_accented_player_name_is_drawn() {
        let compositor = Compositor::new(LabelSpec::default());
        let spec = compositor.spec().clone();
        let code = qr::encode("https://spagrading.com/card/x", spec.code_px()).unwrap();
        let badges = BadgeSet::builtin(spec.badge_height_px());
        let with_player = |player: &str| {
            let mut snap = snapshot("10");
            snap.fields.player = Some(player.into());
            compositor.render(&snap, &code, badges.for_grade("10")).unwrap()
        };

        let accented = with_player("Ronald Acuña");
        assert_ne!(accented.as_raw(), with_player("Ronald Acu?a").as_raw());
        assert_ne!(accented.as_raw(), with_player("Ronald Acuna").as_raw());
    }
}
