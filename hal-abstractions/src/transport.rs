//! Register transport trait and link error type

use embedded_io::ErrorKind;

/// Remote 32-bit register access on the target device
///
/// Both operations are blocking round-trips from the caller's point of view:
/// when `write` returns `Ok`, the command has been handed to the link and
/// any later `read` observes it. Implementors must not retry internally;
/// the calibrator decides what a failure means.
pub trait RegisterTransport {
    /// Link-level failure (link down, malformed response, timeout)
    type Error: embedded_io::Error;

    /// Read the current value of the register at `addr`
    fn read(&mut self, addr: u32) -> Result<u32, Self::Error>;

    /// Write `value` to the register at `addr`
    fn write(&mut self, addr: u32, value: u32) -> Result<(), Self::Error>;
}

impl<T: RegisterTransport + ?Sized> RegisterTransport for &mut T {
    type Error = T::Error;

    fn read(&mut self, addr: u32) -> Result<u32, Self::Error> {
        T::read(self, addr)
    }

    fn write(&mut self, addr: u32, value: u32) -> Result<(), Self::Error> {
        T::write(self, addr, value)
    }
}

/// Transport errors for serial/debug links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Link to the device is down
    LinkDown,
    /// Response could not be decoded
    MalformedResponse,
    /// No response within the link's deadline
    Timeout,
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LinkDown => write!(f, "Link down"),
            Self::MalformedResponse => write!(f, "Malformed response"),
            Self::Timeout => write!(f, "Request timeout"),
        }
    }
}

impl core::error::Error for LinkError {}

impl embedded_io::Error for LinkError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::LinkDown => ErrorKind::NotConnected,
            Self::MalformedResponse => ErrorKind::InvalidData,
            Self::Timeout => ErrorKind::TimedOut,
        }
    }
}

/// Short name for an error kind, usable with any log backend
pub fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotConnected => "not connected",
        ErrorKind::BrokenPipe => "broken pipe",
        ErrorKind::ConnectionReset => "connection reset",
        ErrorKind::InvalidData => "invalid data",
        ErrorKind::TimedOut => "timed out",
        ErrorKind::Interrupted => "interrupted",
        _ => "other",
    }
}
