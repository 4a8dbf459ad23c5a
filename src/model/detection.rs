use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// A pixel-space bounding box, relative to the captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BBox {
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// A single labeled detection: a class from the closed perception
/// vocabulary, a box, and a confidence in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub class_label: String,
    pub bbox: BBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(class_label: impl Into<String>, bbox: BBox, confidence: f32) -> Self {
        Self {
            class_label: class_label.into(),
            bbox,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn meets(&self, class_label: &str, min_conf: f32) -> bool {
        self.class_label == class_label && self.confidence >= min_conf
    }
}

/// An OCR result for a region of interest: recognized text plus confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrToken {
    pub text: String,
    pub confidence: f32,
}

/// A timestamped capture: the raw image is opaque to the core (a decoded
/// `image::RgbaImage` when the desktop-capture backend is used), paired
/// with the detection set and any OCR results already computed for ROIs
/// consulted this tick. Frames live exactly one tick.
#[derive(Debug, Clone)]
pub struct Frame {
    pub captured_at: Instant,
    pub detections: Vec<Detection>,
    ocr_cache: HashMap<(i32, i32, i32, i32), Vec<OcrToken>>,
}

impl Frame {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            captured_at: Instant::now(),
            detections,
            ocr_cache: HashMap::new(),
        }
    }

    pub fn cache_ocr(&mut self, roi: BBox, tokens: Vec<OcrToken>) {
        self.ocr_cache
            .insert((roi.x, roi.y, roi.width, roi.height), tokens);
    }

    pub fn cached_ocr(&self, roi: BBox) -> Option<&[OcrToken]> {
        self.ocr_cache
            .get(&(roi.x, roi.y, roi.width, roi.height))
            .map(|v| v.as_slice())
    }

    pub fn detections_of(&self, class_label: &str, min_conf: f32) -> impl Iterator<Item = &Detection> {
        self.detections
            .iter()
            .filter(move |d| d.meets(class_label, min_conf))
    }
}

/// Normalize OCR/menu text for robust substring matching: lowercase, collapse
/// internal whitespace runs, trim ends. Mirrors the substring-containment
/// rule used for `forbid_texts`.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize_text("  Takarazuka   Kinen\n"), "takarazuka kinen");
    }

    #[test]
    fn detection_meets_checks_label_and_confidence() {
        let d = Detection::new(
            "buy_button",
            BBox {
                x: 0,
                y: 0,
                width: 10,
                height: 10,
            },
            0.8,
        );
        assert!(d.meets("buy_button", 0.7));
        assert!(!d.meets("buy_button", 0.9));
        assert!(!d.meets("other", 0.1));
    }
}
