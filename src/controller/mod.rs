//! Controller: the frame-capture and input-emission boundary.
//!
//! The core only ever talks to a `Controller` trait object; the desktop
//! backend (xcap capture + core-graphics clicks) lives behind the
//! `desktop-capture` feature so headless test runs never need it.

#[cfg(all(feature = "desktop-capture", target_os = "macos"))]
pub mod desktop;
pub mod mock;

use crate::model::Detection;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which concrete backend is driving the controller, so the agent loop can
/// apply per-backend tuning (e.g. a device-mirroring bridge needs a longer
/// Waiter interval than a local desktop capture — see DESIGN.md's Open
/// Question resolution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    Desktop,
    DeviceMirror,
    RemoteDevice,
    Mock,
}

impl ControllerKind {
    /// Multiplier applied to the configured Waiter poll interval: bridged
    /// backends have materially higher capture latency than a local
    /// desktop capture.
    pub fn interval_scale(&self) -> f32 {
        match self {
            ControllerKind::Desktop => 1.0,
            ControllerKind::DeviceMirror => 1.5,
            ControllerKind::RemoteDevice => 2.0,
            ControllerKind::Mock => 1.0,
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControllerKind::Desktop => "desktop",
            ControllerKind::DeviceMirror => "device_mirror",
            ControllerKind::RemoteDevice => "remote_device",
            ControllerKind::Mock => "mock",
        };
        f.write_str(s)
    }
}

/// An opaque captured image. The core never inspects pixels directly; it
/// only threads this through to the `Perception` backend.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    pub bytes: std::sync::Arc<[u8]>,
}

/// Frame capture and input emission, consumed by the Waiter and the flows.
///
/// Implementations must order a `capture()` issued after `click()`/`scroll()`
/// to observe post-click state; the core relies on this to avoid racing its
/// own synthetic input.
pub trait Controller: Send {
    fn capture(&mut self) -> CapturedImage;
    fn click(&mut self, x: i32, y: i32);
    fn scroll(&mut self, from: (i32, i32), to: (i32, i32), dy: i32);
    fn controller_kind(&self) -> ControllerKind;
}

/// Small randomized jitter and delay applied before a click.
/// Shared by every backend so jitter behavior doesn't drift between them.
pub fn jitter_point(x: i32, y: i32, radius: i32) -> (i32, i32) {
    if radius <= 0 {
        return (x, y);
    }
    let mut rng = rand::rng();
    let dx = rng.random_range(-radius..=radius);
    let dy = rng.random_range(-radius..=radius);
    (x + dx, y + dy)
}

pub fn jitter_delay_ms() -> u64 {
    rand::rng().random_range(40..=160)
}

/// Bounding box a Detection carries, re-exported here so backends that also
/// need to reason about click targets don't have to reach into `model`.
pub type DetectionBox = Detection;
