//! Factory-only operations.
//!
//! The driver is generic over a [`FactoryAccess`] implementation. The default,
//! [`Locked`], rejects everything with [`Error::NotApplicable`]; a privileged build
//! swaps in [`PowerCycle`] or its own implementation.

use embedded_hal::delay::DelayNs;

use crate::error::Error;
use crate::registers::{
    addr, Config2Bits, CMD_HARDWARE_RESET, HARDWARE_RESET_SETTLE_MS, POR_POLL_INTERVAL_MS, POR_TIMEOUT_MS,
};
use crate::transport::{lock, read_word, unlock, write_word, RegisterTransport};

/// Privileged operations that change pack state or NV configuration.
pub trait FactoryAccess<T: RegisterTransport> {
    /// Reset the pack as if the cells were removed and reconnected.
    fn full_reset(&mut self, _transport: &mut T) -> Result<(), Error<T::Error>> {
        Err(Error::NotApplicable)
    }

    /// Program the non-volatile configuration.
    fn apply_configuration(&mut self, _transport: &mut T) -> Result<(), Error<T::Error>> {
        Err(Error::NotApplicable)
    }

    /// Clear a latched permanent failure.
    fn clear_permanent_failure(&mut self, _transport: &mut T) -> Result<(), Error<T::Error>> {
        Err(Error::NotApplicable)
    }
}

/// Default access level: every factory operation is rejected.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Locked;

impl<T: RegisterTransport> FactoryAccess<T> for Locked {}

/// Access level that permits a full reset (hardware reset followed by a firmware POR).
///
/// Configuration programming and permanent-failure clearing stay rejected.
pub struct PowerCycle<D> {
    delay: D,
}

impl<D> PowerCycle<D> {
    pub fn new(delay: D) -> Self {
        Self { delay }
    }

    pub fn free(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> PowerCycle<D> {
    fn restart<T: RegisterTransport>(&mut self, transport: &mut T) -> Result<(), Error<T::Error>> {
        write_word(transport, addr::CMD, CMD_HARDWARE_RESET)?;
        self.delay.delay_ms(HARDWARE_RESET_SETTLE_MS);

        // Hardware reset restores write protection.
        unlock(transport)?;
        write_word(transport, addr::CONFIG2, Config2Bits::POR_CMD.bits())?;

        let mut waited = 0;
        loop {
            self.delay.delay_ms(POR_POLL_INTERVAL_MS);
            waited += POR_POLL_INTERVAL_MS;
            let config = Config2Bits::from_bits_retain(read_word(transport, addr::CONFIG2)?);
            if !config.contains(Config2Bits::POR_CMD) {
                debug!("full reset: firmware restarted after {=u32} ms", waited);
                return Ok(());
            }
            if waited >= POR_TIMEOUT_MS {
                warn!("full reset: POR_CMD still set after {=u32} ms", waited);
                return Err(Error::ResetFailed);
            }
        }
    }
}

impl<T: RegisterTransport, D: DelayNs> FactoryAccess<T> for PowerCycle<D> {
    fn full_reset(&mut self, transport: &mut T) -> Result<(), Error<T::Error>> {
        unlock(transport)?;
        match self.restart(transport) {
            Ok(()) => lock(transport),
            Err(e) => {
                let _ = lock(transport);
                Err(e)
            }
        }
    }
}
