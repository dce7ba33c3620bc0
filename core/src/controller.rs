//! Lifecycle entry point for one device
//!
//! The embedding application drives a [`TrimController`] through two phases,
//! in order:
//!
//! 1. [`TrimController::on_identify`] once the MCU has reported its
//!    identity. Fetches `RCC_CR`, takes the nominal frequency and, in static
//!    mode, writes the configured trim.
//! 2. [`TrimController::on_connect`] once the host is fully connected. Arms
//!    the calibration timer in dynamic mode.
//!
//! After that the reactor calls [`TrimController::on_timer`] whenever the
//! armed timer fires and re-arms it according to the returned [`Wake`].
//!
//! ## Usage
//! ```ignore
//! let config = TrimConfig::default();
//! let mut trim = TrimController::new(config);
//! trim.on_identify(&mcu, &mut link, &clocksync)?;
//! if let Some(handle) = trim.on_connect(&mut reactor)? {
//!     timers.insert(handle, TimerOwner::HsiTrim);
//! }
//! // in the reactor's dispatch loop:
//! let wake = match trim.on_timer(eventtime, &mut link, &clocksync, &host) {
//!     Ok(attempt) => attempt.wake,
//!     Err(failed) => failed.wake,
//! };
//! ```

use trim_hal_abstractions::{
    ClockReference, HostStatus, McuIdentity, RegisterTransport, Scheduler, Wake,
};

use crate::calibration::{Attempt, CalibrationStats, Decision, DynamicCalibrator};
use crate::config::{CalibrationMode, TrimConfig};
use crate::error::{AttemptFailed, ConfigError, TrimError};
use crate::register::ControlRegister;
use crate::static_trim::apply_static_trim;

/// HSI trim calibrator for one MCU
#[derive(Debug, Clone)]
pub struct TrimController {
    config: TrimConfig,
    register: Option<ControlRegister>,
    calibrator: Option<DynamicCalibrator>,
    target_freq: Option<u64>,
}

impl TrimController {
    pub fn new(config: TrimConfig) -> Self {
        Self {
            config,
            register: None,
            calibrator: None,
            target_freq: None,
        }
    }

    pub fn config(&self) -> &TrimConfig {
        &self.config
    }

    pub fn mode(&self) -> CalibrationMode {
        self.config.mode()
    }

    /// Cached control register, once identified
    pub fn register(&self) -> Option<ControlRegister> {
        self.register
    }

    /// Nominal device ticks per second, once identified
    pub fn target_frequency(&self) -> Option<u64> {
        self.target_freq
    }

    /// Dynamic loop counters; `None` in static mode or before identify
    pub fn stats(&self) -> Option<&CalibrationStats> {
        self.calibrator.as_ref().map(DynamicCalibrator::stats)
    }

    /// Identify phase
    ///
    /// Any error here is fatal to startup.
    pub fn on_identify<I, T, C>(
        &mut self,
        identity: &I,
        transport: &mut T,
        clock: &C,
    ) -> Result<(), TrimError<T::Error>>
    where
        I: McuIdentity + ?Sized,
        T: RegisterTransport,
        C: ClockReference,
    {
        if !identity.mcu_type().starts_with(self.config.mcu_prefix) {
            error!(
                "HSI trim on '{}' requires a {} mcu",
                self.config.mcu_name.as_str(),
                self.config.mcu_prefix
            );
            return Err(ConfigError::UnsupportedMcu.into());
        }

        let addr = self.config.register_addr;
        let current = ControlRegister::new(transport.read(addr).map_err(TrimError::Transport)?);
        let freq = clock.seconds_to_clock(1.0);
        info!(
            "{} trim rcc_cr={:#x} freq={}",
            self.config.mcu_prefix,
            current.raw(),
            freq
        );
        self.target_freq = Some(freq);

        match self.config.mode() {
            CalibrationMode::Static(trim) => {
                let written = apply_static_trim(transport, addr, current, trim)
                    .map_err(TrimError::Transport)?;
                self.register = Some(written);
            }
            CalibrationMode::Dynamic => {
                self.register = Some(current);
                self.calibrator = Some(DynamicCalibrator::new(&self.config, freq));
            }
        }
        Ok(())
    }

    /// Connect phase
    ///
    /// Registers the first calibration attempt after the warm-up delay.
    /// Returns `Ok(None)` in static mode, where nothing is ever scheduled.
    pub fn on_connect<S: Scheduler>(
        &mut self,
        scheduler: &mut S,
    ) -> Result<Option<S::Handle>, ConfigError> {
        if let CalibrationMode::Static(_) = self.config.mode() {
            return Ok(None);
        }
        let calibrator = self.calibrator.as_ref().ok_or(ConfigError::NotIdentified)?;
        let waketime = calibrator.first_wake(scheduler.monotonic());
        debug!("HSI calibration armed for {}", waketime);
        Ok(Some(scheduler.register_timer(waketime)))
    }

    /// Timer callback
    ///
    /// In static mode, or if called before identify, this does nothing and
    /// returns [`Wake::Stop`].
    pub fn on_timer<T, C, H>(
        &mut self,
        eventtime: f64,
        transport: &mut T,
        clock: &C,
        host: &H,
    ) -> Result<Attempt, AttemptFailed<T::Error>>
    where
        T: RegisterTransport,
        C: ClockReference,
        H: HostStatus,
    {
        match (self.calibrator.as_mut(), self.register.as_mut()) {
            (Some(calibrator), Some(register)) => {
                calibrator.attempt(register, eventtime, transport, clock, host)
            }
            _ => Ok(Attempt {
                decision: Decision::Idle,
                wake: Wake::Stop,
            }),
        }
    }
}
