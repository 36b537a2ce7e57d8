//! Blocking driver for MAX17320: telemetry, pack health and NV write-cycle diagnostics.

use embedded_hal::delay::DelayNs;

use crate::data_types::{BatteryStats, Quantity};
use crate::error::Error;
use crate::factory::{FactoryAccess, Locked};
use crate::registers::{
    addr, blacklisted_fault, remaining_from_write_cycles, BattStatusBits, ProtAlertBits, StatusBits,
    CMD_RECALL_WRITE_CYCLES, RECALL_SETTLE_MS,
};
use crate::transport::{lock, read_word, unlock, write_word, I2cTransport, RegisterTransport};

/// MAX17320 driver.
///
/// The device is exclusively owned for the duration of every call; callers sharing a
/// bus must serialize whole operations, not individual transactions.
pub struct Max17320<T, D, F = Locked> {
    transport: T,
    delay: D,
    factory: F,
}

impl<I2C, D> Max17320<I2cTransport<I2C>, D> {
    /// Create a new driver on an I2C bus with factory operations locked.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_transport(I2cTransport::new(i2c), delay)
    }
}

impl<I2C, D, F> Max17320<I2cTransport<I2C>, D, F> {
    /// Consume the driver and return the I2C bus.
    pub fn release(self) -> I2C {
        self.transport.free()
    }
}

impl<T, D> Max17320<T, D> {
    /// Create a new driver on a custom register transport.
    pub fn with_transport(transport: T, delay: D) -> Self {
        Self {
            transport,
            delay,
            factory: Locked,
        }
    }
}

impl<T, D, F> Max17320<T, D, F> {
    /// Replace the factory access level.
    pub fn with_factory<G>(self, factory: G) -> Max17320<T, D, G> {
        Max17320 {
            transport: self.transport,
            delay: self.delay,
            factory,
        }
    }

    /// Consume the driver and return its parts.
    pub fn free(self) -> (T, D, F) {
        (self.transport, self.delay, self.factory)
    }
}

impl<T, D, F> Max17320<T, D, F>
where
    T: RegisterTransport,
    D: DelayNs,
    F: FactoryAccess<T>,
{
    /// Decide whether the pack is fit for use, attempting one full reset if a
    /// protection alert latched a recoverable fault.
    ///
    /// Checks run most severe first: permanent failure, then the protection alert,
    /// then the blacklist of faults that must never be cleared. Only when all of those
    /// pass is the full reset issued; its result is returned unchanged.
    pub fn bat_okay(&mut self) -> Result<(), Error<T::Error>> {
        let batt = self
            .read_batt_status()
            .inspect_err(|_| warn!("bat_okay: nBattStatus read failed"))?;
        if batt.contains(BattStatusBits::PERMFAIL) {
            warn!("bat_okay: permanent failure latched, pack is irreparable");
            return Err(Error::PermanentFailure);
        }

        let status = self
            .read_status()
            .inspect_err(|_| warn!("bat_okay: Status read failed"))?;
        if !status.contains(StatusBits::PA) {
            trace!("bat_okay: no protection alert");
            return Ok(());
        }
        debug!("bat_okay: protection alert set, checking latched faults");

        let alerts = self
            .read_protection_alerts()
            .inspect_err(|_| warn!("bat_okay: ProtAlrt read failed"))?;
        if let Some(fault) = blacklisted_fault(alerts) {
            warn!("bat_okay: cannot recover from fault {=u16:#x}", fault.bits());
            return Err(Error::Unrecoverable(fault.bits()));
        }

        debug!("bat_okay: faults {=u16:#x} are recoverable, full reset", alerts.bits());
        self.factory
            .full_reset(&mut self.transport)
            .inspect_err(|_| warn!("bat_okay: full reset failed"))?;
        debug!("bat_okay: pack okay");
        Ok(())
    }

    /// Read one telemetry register and scale it to physical units.
    pub fn read_scaled(&mut self, quantity: Quantity) -> Result<f32, Error<T::Error>> {
        let raw = read_word(&mut self.transport, quantity.register())
            .inspect_err(|_| warn!("read_scaled: {} read failed", quantity))?;
        Ok(quantity.convert(raw))
    }

    /// Pack voltage in volts.
    pub fn get_voltage(&mut self) -> Result<f32, Error<T::Error>> {
        self.read_scaled(Quantity::Voltage)
    }

    /// Pack current in amps, negative while discharging.
    pub fn get_current(&mut self) -> Result<f32, Error<T::Error>> {
        self.read_scaled(Quantity::Current)
    }

    /// Reported remaining capacity in amp-hours.
    pub fn get_soc(&mut self) -> Result<f32, Error<T::Error>> {
        self.read_scaled(Quantity::StateOfCharge)
    }

    /// Learned full capacity in amp-hours.
    pub fn get_full_capacity(&mut self) -> Result<f32, Error<T::Error>> {
        self.read_scaled(Quantity::FullCapacity)
    }

    /// Voltage, current, state of charge and full capacity, read in that order.
    /// Stops at the first failed read.
    pub fn get_stats(&mut self) -> Result<BatteryStats, Error<T::Error>> {
        let voltage = self.get_voltage()?;
        let current = self.get_current()?;
        let state_of_charge = self.get_soc()?;
        let full_capacity = self.get_full_capacity()?;
        Ok(BatteryStats {
            voltage,
            current,
            state_of_charge,
            full_capacity,
        })
    }

    /// Remaining non-volatile write cycles.
    ///
    /// Unlocks write protection, recalls the write history, decodes it and locks again.
    /// `Ok(None)` means the history has no set bit in its top byte. If the recall or its
    /// readback fails after unlocking, a re-lock is still attempted before the
    /// original error is returned.
    pub fn nv_writes_remaining(&mut self) -> Result<Option<u8>, Error<T::Error>> {
        unlock(&mut self.transport).inspect_err(|_| warn!("nv_writes_remaining: unlock failed"))?;

        let raw = match self.recall_write_cycles() {
            Ok(raw) => raw,
            Err(e) => {
                let _ = lock(&mut self.transport);
                return Err(e);
            }
        };

        lock(&mut self.transport).inspect_err(|_| warn!("nv_writes_remaining: lock failed"))?;

        let remaining = remaining_from_write_cycles(raw);
        if remaining.is_none() {
            warn!("nv_writes_remaining: no history bit set in {=u16:#x}", raw);
        }
        Ok(remaining)
    }

    fn recall_write_cycles(&mut self) -> Result<u16, Error<T::Error>> {
        write_word(&mut self.transport, addr::CMD, CMD_RECALL_WRITE_CYCLES)
            .inspect_err(|_| warn!("nv_writes_remaining: recall command failed"))?;
        self.delay.delay_ms(RECALL_SETTLE_MS);
        read_word(&mut self.transport, addr::WRITE_CYCLES)
            .inspect_err(|_| warn!("nv_writes_remaining: write history read failed"))
    }

    /// Reset the pack as if power were cycled. Rejected unless factory access allows it.
    pub fn full_reset(&mut self) -> Result<(), Error<T::Error>> {
        self.factory.full_reset(&mut self.transport)
    }

    /// Program the NV configuration. Rejected unless factory access allows it.
    pub fn apply_configuration(&mut self) -> Result<(), Error<T::Error>> {
        self.factory
            .apply_configuration(&mut self.transport)
            .inspect_err(|_| debug!("apply_configuration: configuration is programmed in the factory"))
    }

    /// Clear a permanent failure. Rejected unless factory access allows it.
    pub fn clear_permanent_failure(&mut self) -> Result<(), Error<T::Error>> {
        self.factory.clear_permanent_failure(&mut self.transport)
    }

    /// Read Status (0x000).
    pub fn read_status(&mut self) -> Result<StatusBits, Error<T::Error>> {
        let val = read_word(&mut self.transport, addr::STATUS)?;
        Ok(StatusBits::from_bits_retain(val))
    }

    /// Read nBattStatus (0x1A8).
    pub fn read_batt_status(&mut self) -> Result<BattStatusBits, Error<T::Error>> {
        let val = read_word(&mut self.transport, addr::NBATTSTATUS)?;
        Ok(BattStatusBits::from_bits_retain(val))
    }

    /// Read the latched protection alerts, ProtAlrt (0x0AF).
    pub fn read_protection_alerts(&mut self) -> Result<ProtAlertBits, Error<T::Error>> {
        let val = read_word(&mut self.transport, addr::PROTALRT)?;
        Ok(ProtAlertBits::from_bits_retain(val))
    }

    /// Read the live protection status, ProtStatus (0x0D9).
    pub fn read_protection_status(&mut self) -> Result<ProtAlertBits, Error<T::Error>> {
        let val = read_word(&mut self.transport, addr::PROTSTATUS)?;
        Ok(ProtAlertBits::from_bits_retain(val))
    }
}
