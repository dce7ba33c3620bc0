//! One-shot static trim

use trim_hal_abstractions::RegisterTransport;

use crate::register::{ControlRegister, TrimField};

/// Write a fixed trim into the device's control register
///
/// `current` is the register value fetched from the device during identify.
/// Returns the value written, which becomes the new cached register. The
/// caller must not write the trim field again afterwards.
pub fn apply_static_trim<T: RegisterTransport>(
    transport: &mut T,
    addr: u32,
    current: ControlRegister,
    trim: TrimField,
) -> Result<ControlRegister, T::Error> {
    let updated = current.with_trim(trim);
    info!(
        "Setting HSI trim of {} ({:#x})",
        trim.get(),
        updated.raw()
    );
    transport.write(addr, updated.raw())?;
    Ok(updated)
}
