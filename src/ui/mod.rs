//! Presentation layer
//!
//! - `canvas.rs` - the panorama surface (drawing, drag, wheel, clicks)
//! - `gallery.rs` - thumbnail strip
//! - `toolbar.rs` - rotation, mode and upload controls

pub mod canvas;
pub mod gallery;
pub mod toolbar;
