//! Collaborator traits for the HSI trim calibrator
//!
//! This crate defines the traits the calibrator consumes. The embedding
//! application (host daemon or firmware) implements them on top of its own
//! serial link, clock synchronisation and timer reactor.
//!
//! - **`transport`**: remote register reads/writes on the target device
//! - **`clock`**: host time to device clock tick conversion
//! - **`scheduler`**: timer registration and the tagged `Wake` result
//! - **`host`**: shutdown flag and MCU identification

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod host;
pub mod scheduler;
pub mod transport;

pub use clock::ClockReference;
pub use host::{HostStatus, McuIdentity};
pub use scheduler::{Scheduler, Wake};
pub use transport::{LinkError, RegisterTransport};
