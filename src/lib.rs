//! Career Pilot — a decision core for automating a career-mode training
//! and racing loop. The core perceives a screen, classifies
//! it, dispatches to a domain flow, acts through a `Controller`, and
//! updates its own memory; it never renders a UI and never owns the
//! screenshot/OCR backend it's handed.
//!
//! Module map, innermost-first:
//! - `model` — the shared value types every other module builds on
//! - `controller` / `perception` — the I/O boundary
//! - `waiter` — the poll/click/OCR primitive every flow is built from
//! - `classifier` — screen classification
//! - `memory` — cross-tick persistent state
//! - `training` / `event` / `skills` / `race` — the domain flows
//! - `scenario` — per-scenario policy (URA vs Unity Cup) wired over those flows
//! - `agent` — the tick loop that owns all of the above
//! - `catalog` / `config` / `logging` / `hotkeys` — ambient infrastructure

pub mod agent;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod hotkeys;
pub mod logging;
pub mod memory;
pub mod model;
pub mod perception;
pub mod race;
pub mod scenario;
pub mod skills;
pub mod training;
pub mod waiter;
