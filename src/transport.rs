//! Register transport: multi-byte access to the 16-bit register space.

use crate::error::Error;
use crate::registers::{addr, LOCK_PATTERN, LOWER_I2C_ADDRESS, UNLOCK_PATTERN, UPPER_I2C_ADDRESS};

/// Raw register access at 16-bit addresses.
///
/// Implementations own bank selection; callers only pass logical addresses.
pub trait RegisterTransport {
    type Error;

    /// Write `data` starting at `reg`.
    fn write(&mut self, reg: u16, data: &[u8]) -> Result<(), Self::Error>;

    /// Fill `buf` from registers starting at `reg`.
    fn read(&mut self, reg: u16, buf: &mut [u8]) -> Result<(), Self::Error>;
}

/// [`RegisterTransport`] over a blocking embedded-hal I2C bus.
pub struct I2cTransport<I2C> {
    i2c: I2C,
}

impl<I2C> I2cTransport<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Release the bus.
    pub fn free(self) -> I2C {
        self.i2c
    }

    /// 7-bit device address answering for `reg`.
    pub fn device_address(reg: u16) -> u8 {
        if reg > 0xFF {
            UPPER_I2C_ADDRESS
        } else {
            LOWER_I2C_ADDRESS
        }
    }
}

impl<I2C> RegisterTransport for I2cTransport<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    type Error = I2C::Error;

    fn write(&mut self, reg: u16, data: &[u8]) -> Result<(), Self::Error> {
        // One word per transaction; the register pointer advances by one per word.
        for (offset, word) in data.chunks(2).enumerate() {
            let reg = reg.wrapping_add(offset as u16);
            let mut buf = [reg as u8, 0, 0];
            buf[1..=word.len()].copy_from_slice(word);
            self.i2c
                .write(Self::device_address(reg), &buf[..=word.len()])?;
        }
        Ok(())
    }

    fn read(&mut self, reg: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c
            .write_read(Self::device_address(reg), &[reg as u8], buf)
    }
}

/// Read one little-endian word.
pub fn read_word<T: RegisterTransport>(transport: &mut T, reg: u16) -> Result<u16, Error<T::Error>> {
    let mut buf = [0u8; 2];
    transport.read(reg, &mut buf).map_err(Error::Read)?;
    Ok(u16::from_le_bytes(buf))
}

/// Write one little-endian word.
pub fn write_word<T: RegisterTransport>(transport: &mut T, reg: u16, value: u16) -> Result<(), Error<T::Error>> {
    transport
        .write(reg, &value.to_le_bytes())
        .map_err(Error::Write)
}

/// Clear write protection. The device ignores a single write of the pattern.
pub fn unlock<T: RegisterTransport>(transport: &mut T) -> Result<(), Error<T::Error>> {
    write_word(transport, addr::COMMSTAT, UNLOCK_PATTERN)?;
    write_word(transport, addr::COMMSTAT, UNLOCK_PATTERN)
}

/// Restore write protection.
pub fn lock<T: RegisterTransport>(transport: &mut T) -> Result<(), Error<T::Error>> {
    write_word(transport, addr::COMMSTAT, LOCK_PATTERN)?;
    write_word(transport, addr::COMMSTAT, LOCK_PATTERN)
}
