//! Calibrator configuration structures

use heapless::String;

use crate::error::ConfigError;
use crate::register::{TrimField, RCC_CR_ADDR};

/// Maximum length of the MCU section name
pub const MCU_NAME_MAX_LEN: usize = 32;

/// Frequency change of one HSI trim unit, in ticks per second
///
/// The STM32F0 datasheet gives roughly 40 kHz per trim step on the 8 MHz
/// HSI; the system clock runs the HSI through a x6 PLL.
pub const TRIM_STEP: u32 = 6 * 40_000;

/// Timer intervals of the dynamic calibration loop, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationTiming {
    /// Delay between connect and the first attempt
    pub warmup: f64,
    /// Interval after an in-tolerance or saturated attempt
    pub retry: f64,
    /// Interval after a committed trim change
    pub settle: f64,
    /// Spacing of the two clock samples of one estimate
    pub sample_window: f64,
}

impl Default for CalibrationTiming {
    fn default() -> Self {
        Self {
            warmup: 60.0,
            retry: 10.0,
            settle: 60.0,
            sample_window: 1.0,
        }
    }
}

/// Static or closed-loop operation, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationMode {
    /// Write this trim once and never recalibrate
    Static(TrimField),
    /// Run the feedback loop
    Dynamic,
}

/// HSI trim calibrator configuration
#[derive(Debug, Clone)]
pub struct TrimConfig {
    /// Name of the MCU this calibrator is attached to
    pub mcu_name: String<MCU_NAME_MAX_LEN>,
    /// Required prefix of the reported MCU type
    pub mcu_prefix: &'static str,
    /// Fixed trim; `None` selects dynamic calibration
    pub static_trim: Option<TrimField>,
    /// Address of the control register holding the trim field
    pub register_addr: u32,
    /// Frequency change per trim unit, ticks per second
    pub trim_step: u32,
    /// Dead-band half-width in trim steps
    pub deadband_steps: f64,
    /// Loop intervals
    pub timing: CalibrationTiming,
}

impl Default for TrimConfig {
    fn default() -> Self {
        let mut mcu_name = String::new();
        // "mcu" always fits
        let _ = mcu_name.push_str("mcu");
        Self {
            mcu_name,
            mcu_prefix: "stm32f0",
            static_trim: None,
            register_addr: RCC_CR_ADDR,
            trim_step: TRIM_STEP,
            deadband_steps: 1.25,
            timing: CalibrationTiming::default(),
        }
    }
}

impl TrimConfig {
    /// Select static mode with a raw trim value from configuration
    pub fn with_static_trim(mut self, trim: u8) -> Result<Self, ConfigError> {
        let field = TrimField::new(trim).ok_or(ConfigError::TrimOutOfRange(trim))?;
        self.static_trim = Some(field);
        Ok(self)
    }

    /// Attach to a named MCU section
    ///
    /// Names longer than [`MCU_NAME_MAX_LEN`] are truncated on a character
    /// boundary.
    pub fn with_mcu_name(mut self, name: &str) -> Self {
        self.mcu_name.clear();
        for c in name.chars() {
            if self.mcu_name.push(c).is_err() {
                break;
            }
        }
        self
    }

    /// Mode implied by the presence of a static trim
    pub fn mode(&self) -> CalibrationMode {
        match self.static_trim {
            Some(trim) => CalibrationMode::Static(trim),
            None => CalibrationMode::Dynamic,
        }
    }

    /// Smallest |estimate - target| that triggers a correction
    pub fn deadband(&self) -> f64 {
        self.deadband_steps * self.trim_step as f64
    }
}
