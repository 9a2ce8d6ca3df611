//! Label factory
//!
//! Binds the pure rendering pieces of `slab_printer` (code generator, badge
//! table, compositor) to the configured verification base URL.

use image::{GrayImage, RgbaImage};
use shared::models::{RecordSnapshot, VerificationUrl};
use shared::util::RECORD_ID_LEN;
use slab_printer::{BadgeSet, CodeError, CodeResult, Compositor, LabelSpec, RenderResult, qr, raster};
use std::path::Path;

use crate::core::Config;

#[derive(Debug, Clone)]
pub struct LabelFactory {
    compositor: Compositor,
    badges: BadgeSet,
    public_base_url: String,
}

impl LabelFactory {
    pub fn new(compositor: Compositor, badges: BadgeSet, public_base_url: impl Into<String>) -> Self {
        Self {
            compositor,
            badges,
            public_base_url: public_base_url.into(),
        }
    }

    /// Built-in wordmark and badges
    pub fn builtin(spec: LabelSpec, public_base_url: impl Into<String>) -> Self {
        let badges = BadgeSet::builtin(spec.badge_height_px());
        Self::new(Compositor::new(spec), badges, public_base_url)
    }

    /// Load logo and badge overrides named by the configuration
    pub fn from_config(config: &Config) -> RenderResult<Self> {
        let spec = LabelSpec::default().with_scale(config.label_scale);

        let mut compositor = Compositor::new(spec.clone());
        if let Some(path) = &config.logo_path {
            compositor = compositor.with_logo(raster::load(Path::new(path))?);
            tracing::info!(path = %path, "Custom logo loaded");
        }

        let badges = match &config.badge_dir {
            Some(dir) => BadgeSet::load_dir(Path::new(dir), spec.badge_height_px())?,
            None => BadgeSet::builtin(spec.badge_height_px()),
        };

        Ok(Self::new(compositor, badges, config.public_base_url.clone()))
    }

    pub fn spec(&self) -> &LabelSpec {
        self.compositor.spec()
    }

    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    pub fn verification_url(&self, record_id: &str) -> VerificationUrl {
        VerificationUrl::for_record(&self.public_base_url, record_id)
    }

    /// Fails when the code of a full-length record id cannot fit the code cell
    pub fn check_code_fits(&self) -> CodeResult<()> {
        // lowercase keeps the whole id in byte mode, the largest code an id can need
        let sample = "z".repeat(RECORD_ID_LEN);
        let min_px = qr::min_size(self.verification_url(&sample).as_str())?;
        let target_px = self.spec().code_px();
        if target_px < min_px {
            return Err(CodeError::SizeTooSmall { target_px, min_px });
        }
        Ok(())
    }

    /// Code bitmap sized to the label's code cell
    pub fn encode_code(&self, url: &VerificationUrl) -> CodeResult<GrayImage> {
        qr::encode(url.as_str(), self.spec().code_px())
    }

    /// Compose the label, picking the badge from the snapshot's grade
    pub fn render(&self, snapshot: &RecordSnapshot, code: &GrayImage) -> RenderResult<RgbaImage> {
        let badge = self.badges.for_grade(snapshot.fields.grade.as_str());
        self.compositor.render(snapshot, code, badge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Grade, RecordFields};
    use slab_printer::BadgeKind;

    fn factory() -> LabelFactory {
        LabelFactory::builtin(LabelSpec::default(), "https://spagrading.com/")
    }

    #[test]
    fn test_verification_url() {
        let url = factory().verification_url("abc123");
        assert_eq!(url.as_str(), "https://spagrading.com/card/abc123");
    }

    #[test]
    fn test_code_matches_cell() {
        let f = factory();
        let code = f.encode_code(&f.verification_url("abc123")).unwrap();
        assert_eq!(code.width(), f.spec().code_px());
        assert_eq!(code.height(), f.spec().code_px());
    }

    #[test]
    fn test_code_fit_check() {
        factory().check_code_fits().unwrap();
        LabelFactory::builtin(LabelSpec::default().with_scale(1), "https://spagrading.com")
            .check_code_fits()
            .unwrap();

        let long = LabelFactory::builtin(
            LabelSpec::default().with_scale(1),
            "https://verify.certified-sports-grading.example.com",
        );
        assert!(matches!(
            long.check_code_fits(),
            Err(CodeError::SizeTooSmall { target_px: 41, min_px: 45 })
        ));
        assert!(matches!(
            LabelFactory::builtin(LabelSpec::default(), "not a url").check_code_fits(),
            Err(CodeError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_render_uses_grade_badge() {
        let f = factory();
        let snapshot = RecordSnapshot {
            id: "abc123".into(),
            fields: RecordFields {
                grade: Grade::from("10"),
                ..Default::default()
            },
        };
        let code = f.encode_code(&f.verification_url(&snapshot.id)).unwrap();
        let label = f.render(&snapshot, &code).unwrap();

        let badge = f.spec().layout().badge;
        let fill = BadgeKind::GemMint10.fill();
        let found = (badge.y..badge.bottom())
            .flat_map(|y| (badge.x..badge.right()).map(move |x| (x, y)))
            .any(|(x, y)| *label.get_pixel(x, y) == fill);
        assert!(found);
    }
}
