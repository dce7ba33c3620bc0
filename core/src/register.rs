//! RCC_CR trim field model
//!
//! The STM32F0 `RCC_CR` register carries the HSI trim in `HSITRIM[4:0]`,
//! bits 7:3. Everything in here is a pure transform on register values;
//! nothing touches the device.

/// Address of `RCC_CR` on STM32F0 parts
pub const RCC_CR_ADDR: u32 = 0x4002_1000;

/// Bit position of `HSITRIM[0]`
pub const TRIM_SHIFT: u32 = 3;

/// Largest trim value the 5-bit field can hold
pub const TRIM_MAX: u8 = 0b1_1111;

/// `HSITRIM` bits within the register (`0xF8`)
pub const TRIM_MASK: u32 = (TRIM_MAX as u32) << TRIM_SHIFT;

/// Extract `HSITRIM` (bits 7:3) from a raw register value
pub const fn extract_trim(register: u32) -> u8 {
    ((register >> TRIM_SHIFT) & TRIM_MAX as u32) as u8
}

/// Replace `HSITRIM` in a raw register value
///
/// `trim` is masked to five bits. Callers that compute a trim value must
/// range-check it first (see [`TrimField::new`]) rather than rely on the
/// mask.
pub const fn with_trim(register: u32, trim: u8) -> u32 {
    (register & !TRIM_MASK) | (((trim & TRIM_MAX) as u32) << TRIM_SHIFT)
}

/// Direction of a single trim step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Raise the trim, speeding the oscillator up
    Up,
    /// Lower the trim, slowing the oscillator down
    Down,
}

/// A validated trim value in `0..=31`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrimField(u8);

impl TrimField {
    /// Lowest trim value
    pub const MIN: Self = Self(0);
    /// Highest trim value
    pub const MAX: Self = Self(TRIM_MAX);

    /// Returns `None` if `value` does not fit the 5-bit field
    pub const fn new(value: u8) -> Option<Self> {
        if value <= TRIM_MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Raw trim value
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The neighbouring trim value in `direction`
    ///
    /// Returns `None` when the field is saturated in that direction.
    pub fn step(self, direction: Step) -> Option<Self> {
        match direction {
            Step::Up => self.0.checked_add(1).and_then(Self::new),
            Step::Down => self.0.checked_sub(1).map(Self),
        }
    }
}

/// Cached copy of the device's `RCC_CR`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlRegister(u32);

impl ControlRegister {
    /// Wrap a raw register value read from the device
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw value, as written to the device
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Current `HSITRIM` value
    pub const fn trim(self) -> TrimField {
        TrimField(extract_trim(self.0))
    }

    /// Copy of this register with `HSITRIM` replaced and every other bit kept
    #[must_use]
    pub const fn with_trim(self, trim: TrimField) -> Self {
        Self(with_trim(self.0, trim.0))
    }
}

impl From<u32> for ControlRegister {
    fn from(raw: u32) -> Self {
        Self::new(raw)
    }
}
