//! Closed-loop HSI calibration
//!
//! Each attempt measures the device clock over one reference second, compares
//! it with the nominal frequency and nudges `HSITRIM` by one step when the
//! error leaves the dead-band. A committed step is followed by a long settle
//! interval; every other outcome retries after the short interval.
//!
//! ```text
//! Dormant --first timer--> Calibrating --shutdown--> Suspended
//!                            ^      |
//!                            +------+  reschedule
//! ```

use trim_hal_abstractions::transport::kind_name;
use trim_hal_abstractions::{ClockReference, HostStatus, RegisterTransport, Wake};

use crate::config::{CalibrationTiming, TrimConfig};
use crate::error::AttemptFailed;
use crate::register::{ControlRegister, Step, TrimField};

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopState {
    /// Waiting for the warm-up delay to elapse
    Dormant,
    /// Periodic attempts running
    Calibrating,
    /// Host shut down; the loop no longer rearms
    Suspended,
}

/// Outcome of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decision {
    /// No calibration loop is active (static mode)
    Idle,
    /// Host is shutting down, nothing measured
    Shutdown,
    /// Estimate within the dead-band, no write
    InTolerance { estimate: i64 },
    /// Trim already at the end of its range, no write
    Saturated { trim: TrimField, estimate: i64 },
    /// New trim written to the device
    Adjusted {
        trim: TrimField,
        register: ControlRegister,
        estimate: i64,
    },
}

/// A completed attempt and when to run the next one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attempt {
    pub decision: Decision,
    pub wake: Wake,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationStats {
    /// Attempts that took a measurement
    pub attempts: u32,
    /// Trim changes written to the device
    pub adjustments: u32,
    /// Attempts that found the clock within the dead-band
    pub in_tolerance: u32,
    /// Attempts blocked by a saturated trim field
    pub saturations: u32,
    /// Trim writes that failed on the transport
    pub write_failures: u32,
    /// Most recent frequency estimate, ticks per second
    pub last_estimate: Option<i64>,
}

/// Dynamic calibration loop for one device
#[derive(Debug, Clone)]
pub struct DynamicCalibrator {
    addr: u32,
    target_freq: u64,
    deadband: f64,
    timing: CalibrationTiming,
    state: LoopState,
    stats: CalibrationStats,
}

impl DynamicCalibrator {
    /// Create a dormant calibrator aiming at `target_freq` ticks per second
    pub fn new(config: &TrimConfig, target_freq: u64) -> Self {
        Self {
            addr: config.register_addr,
            target_freq,
            deadband: config.deadband(),
            timing: config.timing,
            state: LoopState::Dormant,
            stats: CalibrationStats::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> &CalibrationStats {
        &self.stats
    }

    pub fn target_freq(&self) -> u64 {
        self.target_freq
    }

    /// Due time of the first attempt when armed at `now`
    pub fn first_wake(&self, now: f64) -> f64 {
        now + self.timing.warmup
    }

    /// Device ticks elapsed over one sample window starting at `eventtime`
    ///
    /// Both samples come from the clock reference keyed by host time, so
    /// nothing blocks here.
    pub fn estimate<C: ClockReference>(&self, clock: &C, eventtime: f64) -> i64 {
        let c1 = clock.clock_at(eventtime);
        let c2 = clock.clock_at(eventtime + self.timing.sample_window);
        c2.wrapping_sub(c1) as i64
    }

    /// Run one attempt at `eventtime`
    ///
    /// `register` is the cached control register; it is only updated once the
    /// device has accepted the write. On a failed write the returned error
    /// still carries the wake time of the settle interval.
    pub fn attempt<T, C, H>(
        &mut self,
        register: &mut ControlRegister,
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
        if host.is_shutdown() {
            if self.state != LoopState::Suspended {
                info!("Host shutdown, HSI calibration suspended");
            }
            self.state = LoopState::Suspended;
            return Ok(Attempt {
                decision: Decision::Shutdown,
                wake: Wake::Stop,
            });
        }
        if self.state == LoopState::Dormant {
            debug!("HSI calibration started, target freq {}", self.target_freq);
        }
        self.state = LoopState::Calibrating;

        let estimate = self.estimate(clock, eventtime);
        self.stats.attempts = self.stats.attempts.wrapping_add(1);
        self.stats.last_estimate = Some(estimate);

        let delta = estimate - self.target_freq as i64;
        let retry = Wake::Reschedule(eventtime + self.timing.retry);
        if (delta.unsigned_abs() as f64) < self.deadband {
            trace!("HSI freq {} within tolerance (delta {})", estimate, delta);
            self.stats.in_tolerance = self.stats.in_tolerance.wrapping_add(1);
            return Ok(Attempt {
                decision: Decision::InTolerance { estimate },
                wake: retry,
            });
        }

        let direction = if delta < 0 { Step::Up } else { Step::Down };
        let current = register.trim();
        let Some(trim) = current.step(direction) else {
            warn!(
                "HSI trim saturated at {} for freq {} (target {})",
                current.get(),
                estimate,
                self.target_freq
            );
            self.stats.saturations = self.stats.saturations.wrapping_add(1);
            return Ok(Attempt {
                decision: Decision::Saturated {
                    trim: current,
                    estimate,
                },
                wake: retry,
            });
        };

        let updated = register.with_trim(trim);
        let wake = Wake::Reschedule(eventtime + self.timing.settle);
        info!(
            "Setting new HSI trim of {} ({:#x}) for freq {}",
            trim.get(),
            updated.raw(),
            estimate
        );
        if let Err(error) = transport.write(self.addr, updated.raw()) {
            error!(
                "HSI trim write failed: {}",
                kind_name(embedded_io::Error::kind(&error))
            );
            self.stats.write_failures = self.stats.write_failures.wrapping_add(1);
            return Err(AttemptFailed { error, wake });
        }
        *register = updated;
        self.stats.adjustments = self.stats.adjustments.wrapping_add(1);
        Ok(Attempt {
            decision: Decision::Adjusted {
                trim,
                register: updated,
                estimate,
            },
            wake,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClock, MockHost, MockTransport};
    use crate::register::RCC_CR_ADDR;
    use trim_hal_abstractions::LinkError;

    const TARGET: u64 = 1_000_000;

    fn calibrator() -> DynamicCalibrator {
        DynamicCalibrator::new(&TrimConfig::default(), TARGET)
    }

    fn reg_with_trim(trim: u8) -> ControlRegister {
        ControlRegister::new(0x0000_0003).with_trim(TrimField::new(trim).unwrap())
    }

    #[test]
    fn test_estimate_one_second_window() {
        let cal = calibrator();
        let clock = MockClock::new(TARGET, 1_200_000);
        assert_eq!(cal.estimate(&clock, 100.0), 1_200_000);
        assert_eq!(clock.queries(), 2);
    }

    #[test]
    fn test_within_deadband_no_write() {
        let mut cal = calibrator();
        let mut reg = reg_with_trim(16);
        let mut transport = MockTransport::new(reg.raw());
        let clock = MockClock::new(TARGET, 1_200_000);

        let attempt = cal
            .attempt(&mut reg, 100.0, &mut transport, &clock, &MockHost::running())
            .unwrap();
        assert_eq!(
            attempt.decision,
            Decision::InTolerance {
                estimate: 1_200_000
            }
        );
        assert_eq!(attempt.wake, Wake::Reschedule(110.0));
        assert!(transport.writes.is_empty());
        assert_eq!(reg, reg_with_trim(16));
        assert_eq!(cal.state(), LoopState::Calibrating);
    }

    #[test]
    fn test_slow_clock_steps_up() {
        let mut cal = calibrator();
        let mut reg = reg_with_trim(10);
        let mut transport = MockTransport::new(reg.raw());
        let clock = MockClock::new(TARGET, 700_000);

        let attempt = cal
            .attempt(&mut reg, 100.0, &mut transport, &clock, &MockHost::running())
            .unwrap();
        let expected = reg_with_trim(11);
        assert_eq!(
            attempt.decision,
            Decision::Adjusted {
                trim: TrimField::new(11).unwrap(),
                register: expected,
                estimate: 700_000,
            }
        );
        assert_eq!(attempt.wake, Wake::Reschedule(160.0));
        assert_eq!(transport.writes.as_slice(), &[(RCC_CR_ADDR, expected.raw())]);
        assert_eq!(reg, expected);
        assert_eq!(cal.stats().adjustments, 1);
    }

    #[test]
    fn test_fast_clock_steps_down() {
        let mut cal = calibrator();
        let mut reg = reg_with_trim(10);
        let mut transport = MockTransport::new(reg.raw());
        let clock = MockClock::new(TARGET, 1_300_000);

        let attempt = cal
            .attempt(&mut reg, 5.0, &mut transport, &clock, &MockHost::running())
            .unwrap();
        assert_eq!(reg.trim().get(), 9);
        assert_eq!(attempt.wake, Wake::Reschedule(65.0));
        assert_eq!(transport.value, reg.raw());
    }

    #[test]
    fn test_deadband_edge_is_corrected() {
        // |delta| == 1.25 * STEP is outside the dead-band
        let mut cal = calibrator();
        let mut reg = reg_with_trim(10);
        let mut transport = MockTransport::new(reg.raw());
        let clock = MockClock::new(TARGET, 1_300_000);
        let attempt = cal
            .attempt(&mut reg, 0.0, &mut transport, &clock, &MockHost::running())
            .unwrap();
        assert!(matches!(attempt.decision, Decision::Adjusted { .. }));

        let clock = MockClock::new(TARGET, 1_299_999);
        let attempt = cal
            .attempt(&mut reg, 60.0, &mut transport, &clock, &MockHost::running())
            .unwrap();
        assert!(matches!(attempt.decision, Decision::InTolerance { .. }));
    }

    #[test]
    fn test_saturated_high() {
        let mut cal = calibrator();
        let mut reg = reg_with_trim(31);
        let mut transport = MockTransport::new(reg.raw());
        let clock = MockClock::new(TARGET, 500_000);

        let attempt = cal
            .attempt(&mut reg, 20.0, &mut transport, &clock, &MockHost::running())
            .unwrap();
        assert_eq!(
            attempt.decision,
            Decision::Saturated {
                trim: TrimField::MAX,
                estimate: 500_000
            }
        );
        assert_eq!(attempt.wake, Wake::Reschedule(30.0));
        assert!(transport.writes.is_empty());
        assert_eq!(reg, reg_with_trim(31));
        assert_eq!(cal.stats().saturations, 1);
    }

    #[test]
    fn test_saturated_low() {
        let mut cal = calibrator();
        let mut reg = reg_with_trim(0);
        let mut transport = MockTransport::new(reg.raw());
        let clock = MockClock::new(TARGET, 1_500_000);

        let attempt = cal
            .attempt(&mut reg, 20.0, &mut transport, &clock, &MockHost::running())
            .unwrap();
        assert!(matches!(attempt.decision, Decision::Saturated { .. }));
        assert_eq!(attempt.wake, Wake::Reschedule(30.0));
        assert!(transport.writes.is_empty());
        assert_eq!(reg.trim(), TrimField::MIN);
    }

    #[test]
    fn test_shutdown_stops_without_io() {
        let mut cal = calibrator();
        let mut reg = reg_with_trim(10);
        let mut transport = MockTransport::new(reg.raw());
        let clock = MockClock::new(TARGET, 700_000);

        let attempt = cal
            .attempt(&mut reg, 100.0, &mut transport, &clock, &MockHost::shut_down())
            .unwrap();
        assert_eq!(attempt.decision, Decision::Shutdown);
        assert_eq!(attempt.wake, Wake::Stop);
        assert_eq!(clock.queries(), 0);
        assert_eq!(transport.reads, 0);
        assert!(transport.writes.is_empty());
        assert_eq!(cal.state(), LoopState::Suspended);
        assert_eq!(cal.stats().attempts, 0);
    }

    #[test]
    fn test_write_failure_keeps_schedule() {
        let mut cal = calibrator();
        let mut reg = reg_with_trim(10);
        let mut transport = MockTransport::new(reg.raw());
        transport.fail_writes = Some(LinkError::Timeout);
        let clock = MockClock::new(TARGET, 700_000);

        let failed = cal
            .attempt(&mut reg, 100.0, &mut transport, &clock, &MockHost::running())
            .unwrap_err();
        assert_eq!(failed.error, LinkError::Timeout);
        assert_eq!(failed.wake, Wake::Reschedule(160.0));
        assert_eq!(reg, reg_with_trim(10));
        assert_eq!(cal.stats().write_failures, 1);
        assert_eq!(cal.stats().adjustments, 0);

        // Next attempt proceeds from the unchanged cache
        transport.fail_writes = None;
        let attempt = cal
            .attempt(&mut reg, 160.0, &mut transport, &clock, &MockHost::running())
            .unwrap();
        assert_eq!(reg.trim().get(), 11);
        assert_eq!(attempt.wake, Wake::Reschedule(220.0));
    }

    #[test]
    fn test_walks_to_target() {
        // Each trim unit adds one STEP and trim 15 is exact. The dead-band is
        // wider than one step, so the loop settles at 14.
        let mut cal = calibrator();
        let mut reg = reg_with_trim(12);
        let mut transport = MockTransport::new(reg.raw());
        let host = MockHost::running();
        let mut now = 60.0;
        for _ in 0..6 {
            let offset = (reg.trim().get() as i64 - 15) * TRIM_STEP_I64;
            let clock = MockClock::new(TARGET, (TARGET as i64 + offset) as u64);
            let attempt = cal
                .attempt(&mut reg, now, &mut transport, &clock, &host)
                .unwrap();
            now = attempt.wake.due().unwrap();
        }
        assert_eq!(reg.trim().get(), 14);
        assert_eq!(transport.writes.len(), 2);
        assert_eq!(cal.stats().in_tolerance, 4);
        assert_eq!(cal.stats().attempts, 6);
    }

    const TRIM_STEP_I64: i64 = crate::config::TRIM_STEP as i64;
}
