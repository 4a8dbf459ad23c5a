//! Desktop `Controller` backend: `xcap` for screen capture, `core-graphics`
//! for synthetic mouse/scroll events on macOS.

use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventType, CGMouseButton};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::CGPoint;

use super::{jitter_delay_ms, jitter_point, CapturedImage, Controller, ControllerKind};

/// Pixel radius of the randomized click jitter.
const CLICK_JITTER_RADIUS: i32 = 3;

pub struct DesktopController {
    monitor_index: usize,
}

impl DesktopController {
    pub fn new(monitor_index: usize) -> Self {
        Self { monitor_index }
    }

    fn event_source(&self) -> Option<CGEventSource> {
        CGEventSource::new(CGEventSourceStateID::HIDSystemState).ok()
    }
}

impl Controller for DesktopController {
    fn capture(&mut self) -> CapturedImage {
        let monitors = xcap::Monitor::all().unwrap_or_default();
        let Some(monitor) = monitors.get(self.monitor_index) else {
            return CapturedImage {
                width: 0,
                height: 0,
                bytes: std::sync::Arc::from(Vec::new()),
            };
        };
        match monitor.capture_image() {
            Ok(image) => CapturedImage {
                width: image.width(),
                height: image.height(),
                bytes: std::sync::Arc::from(image.into_raw()),
            },
            Err(_) => CapturedImage {
                width: 0,
                height: 0,
                bytes: std::sync::Arc::from(Vec::new()),
            },
        }
    }

    fn click(&mut self, x: i32, y: i32) {
        let (jx, jy) = jitter_point(x, y, CLICK_JITTER_RADIUS);
        std::thread::sleep(std::time::Duration::from_millis(jitter_delay_ms()));
        let Some(source) = self.event_source() else {
            return;
        };
        let point = CGPoint::new(jx as f64, jy as f64);
        for (down, up) in [(CGEventType::LeftMouseDown, CGEventType::LeftMouseUp)] {
            if let Ok(event) = CGEvent::new_mouse_event(
                source.clone(),
                down,
                point,
                CGMouseButton::Left,
            ) {
                event.post(CGEventTapLocation::HID);
            }
            if let Ok(event) =
                CGEvent::new_mouse_event(source.clone(), up, point, CGMouseButton::Left)
            {
                event.post(CGEventTapLocation::HID);
            }
        }
    }

    fn scroll(&mut self, from: (i32, i32), to: (i32, i32), dy: i32) {
        let Some(source) = self.event_source() else {
            return;
        };
        let steps = 10;
        let step_dy = dy / steps.max(1);
        let _ = (from, to);
        for _ in 0..steps {
            if let Ok(event) = CGEvent::new_scroll_event(source.clone(), 0, 1, step_dy) {
                event.post(CGEventTapLocation::HID);
            }
            std::thread::sleep(std::time::Duration::from_millis(8));
        }
    }

    fn controller_kind(&self) -> ControllerKind {
        ControllerKind::Desktop
    }
}
