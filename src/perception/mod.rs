//! Perception: the detect+OCR boundary.
//!
//! Treated as a pure function of a captured frame. Every call here takes
//! `&self`, not `&mut self`, intentionally, so implementations that *do*
//! need internal mutability (a remote HTTP client's connection pool) own
//! their own synchronization rather than exposing it to callers.

pub mod mock;
pub mod remote;

use crate::controller::CapturedImage;
use crate::model::{BBox, Detection, OcrToken};

pub trait Perception: Send + Sync {
    fn detect(&self, frame: &CapturedImage) -> Vec<Detection>;
    fn ocr(&self, frame: &CapturedImage, roi: BBox, charset_hint: Option<&str>) -> Vec<OcrToken>;
}
