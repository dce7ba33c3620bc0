//! Host lifecycle queries

/// Shutdown state of the owning host
pub trait HostStatus {
    /// `true` once the host has entered a shutdown condition
    fn is_shutdown(&self) -> bool;
}

/// Identification data reported by the device during its identify phase
pub trait McuIdentity {
    /// MCU type string, e.g. `"stm32f042x6"`
    fn mcu_type(&self) -> &str;
}
