//! Error definitions for MAX17320 driver.

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<BusError> {
    /// Register write failed in the transport.
    Write(BusError),
    /// Register read failed in the transport.
    Read(BusError),
    /// A latched protection fault forbids reviving the pack. Carries the matching mask.
    Unrecoverable(u16),
    /// nBattStatus reports a permanent failure.
    PermanentFailure,
    /// Full reset was attempted but did not complete.
    ResetFailed,
    /// Operation is reserved for a privileged (factory) build.
    NotApplicable,
}

impl<BusError: core::fmt::Debug> core::fmt::Display for Error<BusError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Write(e) => write!(f, "register write error: {:?}", e),
            Error::Read(e) => write!(f, "register read error: {:?}", e),
            Error::Unrecoverable(mask) => write!(f, "unrecoverable protection fault {:#06x}", mask),
            Error::PermanentFailure => write!(f, "permanent failure latched"),
            Error::ResetFailed => write!(f, "full reset did not complete"),
            Error::NotApplicable => write!(f, "configuration not applicable in this build"),
        }
    }
}
