//! Platform-agnostic HSI trim calibration
//!
//! Keeps an STM32F0's internal 8 MHz oscillator on frequency by adjusting
//! `RCC_CR.HSITRIM` from the host side. The device is reached only through
//! the collaborator traits in `trim-hal-abstractions`; this crate has NO
//! hardware dependencies.
//!
//! - **`register`**: `HSITRIM` field codec
//! - **`config`**: calibrator configuration with defaults
//! - **`static_trim`**: one-shot fixed trim
//! - **`calibration`**: closed-loop trim adjustment
//! - **`controller`**: identify/connect/timer entry point
//!
//! Logging goes through `defmt` or `log`, selected by the cargo feature of
//! the same name.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to the other modules
mod fmt;

pub mod calibration;
pub mod config;
pub mod controller;
pub mod error;
pub mod register;
pub mod static_trim;

#[cfg(test)]
mod mock;

pub use calibration::{Attempt, CalibrationStats, Decision, DynamicCalibrator, LoopState};
pub use config::{CalibrationMode, CalibrationTiming, TrimConfig};
pub use controller::TrimController;
pub use error::{AttemptFailed, ConfigError, TrimError};
pub use register::{ControlRegister, TrimField};
pub use trim_hal_abstractions::Wake;
