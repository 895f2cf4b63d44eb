// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! ExamGuard - exam session monitor
//!
//! Watches a remote camera board while an exam is running, flags prohibited
//! objects (phones, books) with an external classifier, blinks the board's
//! LED and reports numbered incidents with image evidence to a backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Control API (web)                     │
//! │   /exam/start  /exam/stop  /exam/status  /exam/snapshot ...  │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                ↓
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ExamEngine ── SessionHandle (Idle | Active, counters)       │
//! │      │                                                       │
//! │      └─ MonitorLoop: capture → detect → classify → react     │
//! └────┬──────────────┬───────────────┬──────────────┬───────────┘
//!      ↓              ↓               ↓              ↓
//! ┌──────────┐  ┌───────────┐  ┌────────────┐  ┌──────────────────┐
//! │  Camera  │  │ Detector  │  │  LED       │  │ Incident sink    │
//! │  (HTTP)  │  │  (HTTP)   │  │  (HTTP)    │  │ store + backend  │
//! └──────────┘  └───────────┘  └────────────┘  └──────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod detection;
pub mod device;
pub mod error;
pub mod incident;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use config::Config;
pub use core::ExamEngine;
pub use error::ExamError;

/// ExamGuard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ExamGuard name
pub const NAME: &str = "ExamGuard";
