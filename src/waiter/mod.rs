//! The Waiter: the single synchronization primitive. Every UI
//! interaction goes through here to avoid racing the game's own screen
//! transitions.
//!
//! Modeled as a poll loop with explicit cancellation checks at each
//! iteration rather than continuation-passing: there is no async runtime
//! in this crate, the suspension is an ordinary `thread::sleep` between
//! polls, and cancellation is a shared `AtomicBool` checked at the start
//! of every interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::controller::Controller;
use crate::model::{normalize_text, BBox, Detection};
use crate::perception::Perception;

/// Shared stop flag: written by the hotkey-monitor thread, read at the
/// start of every Waiter poll.
#[derive(Clone)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable polling configuration for one Waiter operation.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub overall_timeout: Duration,
    pub per_attempt_timeout: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, overall_timeout: Duration) -> Self {
        Self {
            interval,
            overall_timeout,
            per_attempt_timeout: interval,
        }
    }

    /// Scale the interval for a slower-capture controller backend, via
    /// `ControllerKind::interval_scale` (see DESIGN.md).
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            interval: self.interval.mul_f32(factor),
            overall_timeout: self.overall_timeout,
            per_attempt_timeout: self.per_attempt_timeout.mul_f32(factor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaiterResult {
    Ok,
    NoMatch,
    Aborted,
}

/// Guard defaults for `click_when`'s OCR-disambiguation cascade.
pub const DEFAULT_FORBID_THRESHOLD: f32 = 0.6;

pub struct Waiter<'a> {
    controller: &'a mut dyn Controller,
    perception: &'a dyn Perception,
    stop_flag: StopFlag,
    agent_tag: &'static str,
}

impl<'a> Waiter<'a> {
    pub fn new(
        controller: &'a mut dyn Controller,
        perception: &'a dyn Perception,
        stop_flag: StopFlag,
        agent_tag: &'static str,
    ) -> Self {
        Self {
            controller,
            perception,
            stop_flag,
            agent_tag,
        }
    }

    fn capture_detections(&mut self) -> Vec<Detection> {
        let image = self.controller.capture();
        self.perception.detect(&image)
    }

    fn ocr_of(&mut self, roi: BBox, texts: Option<&[&str]>) -> Vec<(String, f32)> {
        let image = self.controller.capture();
        let charset_hint = None;
        self.perception
            .ocr(&image, roi, charset_hint)
            .into_iter()
            .map(|t| (normalize_text(&t.text), t.confidence))
            .collect::<Vec<_>>()
            .into_iter()
            .filter(|(text, _)| match texts {
                None => true,
                Some(wanted) => wanted
                    .iter()
                    .any(|w| text.contains(&normalize_text(w))),
            })
            .collect()
    }

    /// Poll until a detection matching `classes`/`min_conf` (and, if given,
    /// an OCR match for `texts` not containing any `forbid_texts`) appears,
    /// or `timeout` elapses.
    pub fn seen(
        &mut self,
        classes: &[&str],
        min_conf: f32,
        texts: Option<&[&str]>,
        forbid_texts: Option<&[&str]>,
        timeout: Duration,
    ) -> Option<Detection> {
        let start = Instant::now();
        loop {
            if self.stop_flag.is_stopped() {
                debug!(agent_tag = self.agent_tag, "[waiter] aborted at poll start");
                return None;
            }
            if start.elapsed() >= timeout {
                debug!(agent_tag = self.agent_tag, classes = ?classes, "[waiter] seen: timed out");
                return None;
            }

            let detections = self.capture_detections();
            let candidates: Vec<Detection> = detections
                .into_iter()
                .filter(|d| classes.iter().any(|c| d.meets(c, min_conf)))
                .collect();

            for candidate in candidates {
                if texts.is_none() {
                    return Some(candidate);
                }
                let ocr = self.ocr_of(candidate.bbox, texts);
                let forbidden = forbid_texts.map(|f| {
                    ocr.iter()
                        .any(|(text, conf)| {
                            *conf >= DEFAULT_FORBID_THRESHOLD
                                && f.iter().any(|ft| text.contains(&normalize_text(ft)))
                        })
                });
                if forbidden == Some(true) {
                    continue;
                }
                if !ocr.is_empty() {
                    return Some(candidate);
                }
            }

            std::thread::sleep(self.controller_interval());
        }
    }

    fn controller_interval(&self) -> Duration {
        // A conservative default; callers that need scenario-specific
        // pacing build a scaled PollConfig and drive `seen`/`click_when`
        // in a loop themselves, consulting `PollConfig.interval` directly.
        Duration::from_millis(250)
    }

    /// Click a detected ROI using the three-cascade rule:
    /// 1. exactly one greedy candidate with no forbidden text -> click without OCR.
    /// 2. `prefer_bottom` with multiple candidates -> click the bottom-most under the same guard.
    /// 3. otherwise disambiguate by OCR against `texts`, rejecting any ROI whose
    ///    OCR contains a `forbid_texts` entry above `forbid_threshold`.
    #[allow(clippy::too_many_arguments)]
    pub fn click_when(
        &mut self,
        classes: &[&str],
        texts: Option<&[&str]>,
        forbid_texts: Option<&[&str]>,
        threshold: f32,
        prefer_bottom: bool,
        allow_greedy: bool,
        timeout: Duration,
    ) -> WaiterResult {
        let start = Instant::now();
        loop {
            if self.stop_flag.is_stopped() {
                return WaiterResult::Aborted;
            }
            if start.elapsed() >= timeout {
                debug!(agent_tag = self.agent_tag, classes = ?classes, "[waiter] click_when: timed out");
                return WaiterResult::NoMatch;
            }

            let detections = self.capture_detections();
            let mut candidates: Vec<Detection> = detections
                .into_iter()
                .filter(|d| classes.iter().any(|c| d.meets(c, threshold)))
                .collect();

            if candidates.is_empty() {
                std::thread::sleep(self.controller_interval());
                continue;
            }

            // Cascade 1: exactly one candidate, greedy allowed, no forbidden text.
            if allow_greedy && candidates.len() == 1 {
                let candidate = &candidates[0];
                if !self.has_forbidden_text(candidate.bbox, forbid_texts) {
                    let (x, y) = candidate.bbox.center();
                    self.controller.click(x, y);
                    return WaiterResult::Ok;
                }
            }

            // Cascade 2: prefer the bottom-most candidate.
            if prefer_bottom && candidates.len() > 1 {
                candidates.sort_by_key(|d| d.bbox.bottom());
                if let Some(candidate) = candidates.last() {
                    if !self.has_forbidden_text(candidate.bbox, forbid_texts) {
                        let (x, y) = candidate.bbox.center();
                        self.controller.click(x, y);
                        return WaiterResult::Ok;
                    }
                }
            }

            // Cascade 3: OCR disambiguation against `texts`.
            for candidate in &candidates {
                if self.has_forbidden_text(candidate.bbox, forbid_texts) {
                    continue;
                }
                let ocr = self.ocr_of(candidate.bbox, texts);
                if texts.is_none() || !ocr.is_empty() {
                    if let Some((matched_text, confidence)) =
                        ocr.iter().max_by(|a, b| a.1.total_cmp(&b.1))
                    {
                        if *confidence < crate::logging::LOW_CONFIDENCE_CLICK_THRESHOLD {
                            crate::logging::log_low_confidence_click(
                                self.agent_tag,
                                candidate.bbox.x,
                                candidate.bbox.y,
                                matched_text,
                                *confidence,
                            );
                        }
                    }
                    let (x, y) = candidate.bbox.center();
                    self.controller.click(x, y);
                    return WaiterResult::Ok;
                }
            }

            std::thread::sleep(self.controller_interval());
        }
    }

    fn has_forbidden_text(&mut self, roi: BBox, forbid_texts: Option<&[&str]>) -> bool {
        let Some(forbid) = forbid_texts else {
            return false;
        };
        let ocr = self.ocr_of(roi, None);
        ocr.iter().any(|(text, conf)| {
            *conf >= DEFAULT_FORBID_THRESHOLD && forbid.iter().any(|ft| text.contains(&normalize_text(ft)))
        })
    }

    /// Single-probe variant of `click_when`: no polling, one capture.
    pub fn try_click_once(
        &mut self,
        classes: &[&str],
        forbid_texts: Option<&[&str]>,
        threshold: f32,
    ) -> WaiterResult {
        if self.stop_flag.is_stopped() {
            return WaiterResult::Aborted;
        }
        let detections = self.capture_detections();
        let candidate = detections
            .into_iter()
            .find(|d| classes.iter().any(|c| d.meets(c, threshold)));
        match candidate {
            Some(d) if !self.has_forbidden_text(d.bbox, forbid_texts) => {
                let (x, y) = d.bbox.center();
                self.controller.click(x, y);
                WaiterResult::Ok
            }
            _ => WaiterResult::NoMatch,
        }
    }

    /// Single-probe detection snapshot, no click.
    pub fn snap(&mut self, classes: &[&str], min_conf: f32) -> Vec<Detection> {
        self.capture_detections()
            .into_iter()
            .filter(|d| classes.iter().any(|c| d.meets(c, min_conf)))
            .collect()
    }

    /// OCR a region with no text filter, for flows that need the raw
    /// recognized text (e.g. skill tile titles) rather than a match check.
    pub fn ocr_texts(&mut self, roi: BBox) -> Vec<(String, f32)> {
        self.ocr_of(roi, None)
    }

    /// Scroll the game view. Every scroll goes through the Waiter like every
    /// other input so a single log site covers all synthetic interaction.
    pub fn scroll(&mut self, from: (i32, i32), to: (i32, i32), dy: i32) {
        self.controller.scroll(from, to, dy);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.is_stopped()
    }

    /// Click a bounding box's center directly, for flows that already hold
    /// a detection read earlier in the same tick (e.g. a skill tile's BUY
    /// affordance) rather than one Waiter should poll for again.
    pub fn click_at(&mut self, x: i32, y: i32) {
        self.controller.click(x, y);
    }

    /// One capture-and-detect, unfiltered: the agent loop's per-tick
    /// classification step needs the full detection set, not a
    /// class-filtered subset.
    pub fn all_detections(&mut self) -> Vec<Detection> {
        self.capture_detections()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::mock::MockController;
    use crate::model::BBox;
    use crate::perception::mock::MockPerception;

    fn bbox(x: i32, y: i32) -> BBox {
        BBox {
            x,
            y,
            width: 20,
            height: 10,
        }
    }

    #[test]
    fn seen_returns_none_on_timeout_with_no_detections() {
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        let stop = StopFlag::new();
        let mut waiter = Waiter::new(&mut controller, &perception, stop, "test");
        let result = waiter.seen(&["race_button"], 0.5, None, None, Duration::from_millis(10));
        assert!(result.is_none());
    }

    #[test]
    fn seen_finds_a_matching_detection() {
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        perception.push_frame(vec![Detection::new("race_button", bbox(0, 0), 0.9)]);
        let stop = StopFlag::new();
        let mut waiter = Waiter::new(&mut controller, &perception, stop, "test");
        let result = waiter.seen(&["race_button"], 0.5, None, None, Duration::from_millis(500));
        assert!(result.is_some());
    }

    #[test]
    fn click_when_greedy_clicks_sole_candidate() {
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        perception.push_frame(vec![Detection::new("race_button", bbox(100, 100), 0.9)]);
        let stop = StopFlag::new();
        let mut waiter = Waiter::new(&mut controller, &perception, stop, "test");
        let result = waiter.click_when(
            &["race_button"],
            None,
            None,
            0.5,
            false,
            true,
            Duration::from_millis(500),
        );
        assert_eq!(result, WaiterResult::Ok);
        assert_eq!(controller.clicks.len(), 1);
    }

    #[test]
    fn click_when_honors_stop_flag() {
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        perception.push_frame(vec![Detection::new("race_button", bbox(0, 0), 0.9)]);
        let stop = StopFlag::new();
        stop.stop();
        let mut waiter = Waiter::new(&mut controller, &perception, stop, "test");
        let result = waiter.click_when(
            &["race_button"],
            None,
            None,
            0.5,
            false,
            true,
            Duration::from_millis(500),
        );
        assert_eq!(result, WaiterResult::Aborted);
        assert!(controller.clicks.is_empty());
    }
}
