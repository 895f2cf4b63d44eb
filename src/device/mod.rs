// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Camera board adapters: still capture and LED alert

mod actuator;
mod camera;
pub(crate) mod frame;
mod traits;

pub use actuator::HttpActuator;
pub use camera::HttpCamera;
pub use frame::{jpeg_data_url, Frame};
pub use traits::{Actuator, ActuatorError, CaptureError, FrameSource};
