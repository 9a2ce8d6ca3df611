//! # slab-printer
//!
//! Label rendering and device output - pure rendering plus printer adapters.
//!
//! ## Scope
//!
//! This crate handles HOW a label looks and HOW it reaches paper:
//! - Verification code bitmaps (QR)
//! - Label composition (logo, text, code, grade badge)
//! - Page layout on label stock
//! - Spool directory and CUPS printing
//!
//! Record lifecycle and storage (WHAT gets printed, and when) stay in
//! slab-server.
//!
//! ## Example
//!
//! ```ignore
//! use slab_printer::{BadgeSet, Compositor, LabelSpec, qr};
//!
//! let compositor = Compositor::new(LabelSpec::default());
//! let code = qr::encode("https://spagrading.com/card/abc", compositor.spec().code_px())?;
//! let badges = BadgeSet::builtin(compositor.spec().badge_height_px());
//! let label = compositor.render(&snapshot, &code, badges.for_grade("10"))?;
//! ```

pub mod badge;
pub mod compositor;
mod error;
pub mod font;
pub mod layout;
mod printer;
pub mod qr;
pub mod raster;

// Re-exports
pub use badge::{BadgeKind, BadgeSet};
pub use compositor::{Compositor, LabelLayout, LabelSpec, Rect};
pub use error::{
    CodeError, CodeResult, LayoutError, LayoutResult, PrintError, PrintResult, RenderError,
    RenderResult,
};
pub use layout::{Page, PageSpec, layout};
pub use printer::{AnyPrinter, LpPrinter, Printer, SpoolPrinter};
