use parking_lot::Mutex;
use std::collections::VecDeque;

use super::Perception;
use crate::controller::CapturedImage;
use crate::model::{BBox, Detection, OcrToken};

/// A scriptable `Perception` double: a queue of canned detection sets is
/// drained one per `detect()` call (the last entry repeats once the queue
/// is empty, so tests don't need to pad it out to an exact tick count), and
/// OCR responses are keyed by normalized ROI.
pub struct MockPerception {
    detections: Mutex<VecDeque<Vec<Detection>>>,
    last_detections: Mutex<Vec<Detection>>,
    ocr_by_roi: Mutex<std::collections::HashMap<(i32, i32, i32, i32), Vec<OcrToken>>>,
}

impl MockPerception {
    pub fn new() -> Self {
        Self {
            detections: Mutex::new(VecDeque::new()),
            last_detections: Mutex::new(Vec::new()),
            ocr_by_roi: Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub fn push_frame(&self, detections: Vec<Detection>) {
        self.detections.lock().push_back(detections);
    }

    pub fn set_ocr(&self, roi: BBox, tokens: Vec<OcrToken>) {
        self.ocr_by_roi
            .lock()
            .insert((roi.x, roi.y, roi.width, roi.height), tokens);
    }
}

impl Default for MockPerception {
    fn default() -> Self {
        Self::new()
    }
}

impl Perception for MockPerception {
    fn detect(&self, _frame: &CapturedImage) -> Vec<Detection> {
        let mut queue = self.detections.lock();
        if let Some(next) = queue.pop_front() {
            *self.last_detections.lock() = next.clone();
            next
        } else {
            self.last_detections.lock().clone()
        }
    }

    fn ocr(&self, _frame: &CapturedImage, roi: BBox, _charset_hint: Option<&str>) -> Vec<OcrToken> {
        self.ocr_by_roi
            .lock()
            .get(&(roi.x, roi.y, roi.width, roi.height))
            .cloned()
            .unwrap_or_default()
    }
}
