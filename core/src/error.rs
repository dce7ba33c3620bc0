//! Calibrator error types

use trim_hal_abstractions::scheduler::Wake;

/// Configuration and hardware-compatibility errors
///
/// All of these are fatal at initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Static trim does not fit the 5-bit field
    TrimOutOfRange(u8),
    /// Device is not an STM32F0
    UnsupportedMcu,
    /// Connect or timer phase entered before identify
    NotIdentified,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TrimOutOfRange(v) => write!(f, "Trim {} out of range 0-31", v),
            Self::UnsupportedMcu => write!(f, "HSI trim on non-stm32f0 mcu"),
            Self::NotIdentified => write!(f, "MCU not identified"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Initialisation errors, generic over the transport error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrimError<E> {
    /// Invalid configuration or incompatible hardware
    Config(ConfigError),
    /// Register read/write failed
    Transport(E),
}

impl<E> From<ConfigError> for TrimError<E> {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl<E: core::fmt::Display> core::fmt::Display for TrimError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl<E: core::fmt::Debug + core::fmt::Display> core::error::Error for TrimError<E> {}

/// A calibration attempt whose register write failed
///
/// `wake` is still valid: the loop keeps running and the next attempt is
/// due at the normal settle interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptFailed<E> {
    /// Transport error from the register write
    pub error: E,
    /// When the scheduler should invoke the next attempt
    pub wake: Wake,
}
