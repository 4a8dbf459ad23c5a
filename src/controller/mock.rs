use super::{CapturedImage, Controller, ControllerKind};

/// A scriptable `Controller` double for Waiter and flow tests: every
/// `click`/`scroll` call is recorded, and `capture()` returns a blank image
/// (the Mock `Perception` is what actually drives the detection sequence
/// seen by the Waiter in tests).
#[derive(Debug, Default)]
pub struct MockController {
    pub clicks: Vec<(i32, i32)>,
    pub scrolls: Vec<((i32, i32), (i32, i32), i32)>,
    pub captures: u32,
}

impl MockController {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Controller for MockController {
    fn capture(&mut self) -> CapturedImage {
        self.captures += 1;
        CapturedImage {
            width: 1,
            height: 1,
            bytes: std::sync::Arc::from(vec![0u8; 4]),
        }
    }

    fn click(&mut self, x: i32, y: i32) {
        self.clicks.push((x, y));
    }

    fn scroll(&mut self, from: (i32, i32), to: (i32, i32), dy: i32) {
        self.scrolls.push((from, to, dy));
    }

    fn controller_kind(&self) -> ControllerKind {
        ControllerKind::Mock
    }
}
