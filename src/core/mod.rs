// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Core module - session lifecycle and the monitor loop

mod engine;
mod scheduler;
mod session;

pub use engine::{Components, ConfigUpdate, ConfigView, ExamEngine, HealthReport, StartReport};
pub use session::{MonitorStats, SessionStarted, SessionStatus, SessionSummary};
