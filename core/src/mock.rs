//! Test doubles for the collaborator traits

use core::cell::Cell;

use heapless::Vec;
use trim_hal_abstractions::{
    ClockReference, HostStatus, LinkError, McuIdentity, RegisterTransport, Scheduler,
};

/// Single-register device that records every write
pub struct MockTransport {
    pub value: u32,
    pub reads: usize,
    pub writes: Vec<(u32, u32), 16>,
    pub fail_reads: Option<LinkError>,
    pub fail_writes: Option<LinkError>,
}

impl MockTransport {
    pub fn new(value: u32) -> Self {
        Self {
            value,
            reads: 0,
            writes: Vec::new(),
            fail_reads: None,
            fail_writes: None,
        }
    }
}

impl RegisterTransport for MockTransport {
    type Error = LinkError;

    fn read(&mut self, _addr: u32) -> Result<u32, LinkError> {
        if let Some(e) = self.fail_reads {
            return Err(e);
        }
        self.reads += 1;
        Ok(self.value)
    }

    fn write(&mut self, addr: u32, value: u32) -> Result<(), LinkError> {
        if let Some(e) = self.fail_writes {
            return Err(e);
        }
        self.writes.push((addr, value)).expect("too many writes");
        self.value = value;
        Ok(())
    }
}

/// Device clock running at a fixed `rate` against a `nominal` frequency
pub struct MockClock {
    nominal: u64,
    rate: u64,
    queries: Cell<usize>,
}

impl MockClock {
    pub fn new(nominal: u64, rate: u64) -> Self {
        Self {
            nominal,
            rate,
            queries: Cell::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.get()
    }
}

impl ClockReference for MockClock {
    fn clock_at(&self, time: f64) -> u64 {
        self.queries.set(self.queries.get() + 1);
        (time * self.rate as f64) as u64
    }

    fn seconds_to_clock(&self, secs: f64) -> u64 {
        (secs * self.nominal as f64) as u64
    }
}

pub struct MockHost {
    shutdown: bool,
}

impl MockHost {
    pub fn running() -> Self {
        Self { shutdown: false }
    }

    pub fn shut_down() -> Self {
        Self { shutdown: true }
    }
}

impl HostStatus for MockHost {
    fn is_shutdown(&self) -> bool {
        self.shutdown
    }
}

pub struct MockIdentity(pub &'static str);

impl McuIdentity for MockIdentity {
    fn mcu_type(&self) -> &str {
        self.0
    }
}

/// Records registered due times; handles are indices
pub struct MockScheduler {
    pub now: f64,
    pub timers: Vec<f64, 4>,
}

impl MockScheduler {
    pub fn new(now: f64) -> Self {
        Self {
            now,
            timers: Vec::new(),
        }
    }
}

impl Scheduler for MockScheduler {
    type Handle = usize;

    fn monotonic(&self) -> f64 {
        self.now
    }

    fn register_timer(&mut self, waketime: f64) -> usize {
        self.timers.push(waketime).expect("too many timers");
        self.timers.len() - 1
    }
}
