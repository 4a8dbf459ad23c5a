//! Core data model shared by every other module.
//!
//! Detections and frames live one tick; presets and dates are
//! `Copy`/cheaply-cloned value types handed to handlers by value —
//! cross-turn references are by value copies, never borrowed.

pub mod action;
pub mod date;
pub mod detection;
pub mod mood;
pub mod preset;
pub mod stat;
pub mod style;

pub use action::{ActionResult, HardFailReason, SoftFailReason};
pub use date::Date;
pub use detection::{normalize_text, BBox, Detection, Frame, OcrToken};
pub use mood::Mood;
pub use preset::{PlannedRaceEntry, Preset, StyleScheduleEntry};
pub use stat::{StatKey, StatVector};
pub use style::Style;
