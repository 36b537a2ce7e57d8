//! Register map and constants for MAX17320.
//! Addresses, masks and LSB weights come from the datasheet register table.

/// 7-bit I2C address serving registers 0x000-0x0FF (0x6C in 8-bit form).
pub const LOWER_I2C_ADDRESS: u8 = 0x36;
/// 7-bit I2C address serving registers 0x100-0x1FF (0x16 in 8-bit form).
pub const UPPER_I2C_ADDRESS: u8 = 0x0B;

/// Register addresses (16-bit, bank encoded in bit 8).
pub mod addr {
    /// Status flags, protection alert in bit 15.
    pub const STATUS: u16 = 0x000;
    /// Reported remaining capacity (5 mAh LSB with the default sense resistor).
    pub const REPCAP: u16 = 0x005;
    /// Instantaneous current, signed.
    pub const CURRENT: u16 = 0x01C;
    /// Full capacity as currently learned.
    pub const FULLCAP: u16 = 0x035;
    pub const CMD: u16 = 0x060;
    /// Write-protection control.
    pub const COMMSTAT: u16 = 0x061;
    pub const CONFIG2: u16 = 0x0AB;
    /// Latched (historic) protection alerts.
    pub const PROTALRT: u16 = 0x0AF;
    /// Live protection status.
    pub const PROTSTATUS: u16 = 0x0D9;
    /// Pack voltage.
    pub const BATT: u16 = 0x0DA;
    /// Non-volatile battery status, permanent fail in bit 15.
    pub const NBATTSTATUS: u16 = 0x1A8;
    /// Shadow of the NV write history, valid after a recall command.
    pub const WRITE_CYCLES: u16 = 0x1FD;
}

/// COMMSTAT pattern that clears write protection (written twice).
pub const UNLOCK_PATTERN: u16 = 0x0000;
/// COMMSTAT pattern that restores write protection (written twice).
pub const LOCK_PATTERN: u16 = 0x00F9;
/// CMD value recalling the NV write history into [`addr::WRITE_CYCLES`].
pub const CMD_RECALL_WRITE_CYCLES: u16 = 0xE29B;
/// CMD value triggering a hardware reset.
pub const CMD_HARDWARE_RESET: u16 = 0x000F;

/// Minimum wait after a recall before reading back (tRECALL is 5 ms).
pub const RECALL_SETTLE_MS: u32 = 10;
/// Wait after a hardware reset command before touching the device again.
pub const HARDWARE_RESET_SETTLE_MS: u32 = 10;
/// Upper bound on the firmware restart after a POR command.
pub const POR_TIMEOUT_MS: u32 = 10_000;
pub const POR_POLL_INTERVAL_MS: u32 = 10;

/// Pack voltage LSB.
pub const VOLTAGE_LSB_V: f32 = 0.3125e-3;
/// Current LSB, two's complement.
pub const CURRENT_LSB_A: f32 = 1.5625e-3;
/// Capacity LSB for REPCAP and FULLCAP.
pub const CAPACITY_LSB_AH: f32 = 5e-3;

bitflags::bitflags! {
    /// STATUS register bits (0x000).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct StatusBits: u16 {
        /// Bit 15: protection alert, set when any PROTALRT bit latches.
        const PA  = 1 << 15;
        /// Bit 1: power-on reset occurred.
        const POR = 1 << 1;
    }

    /// nBattStatus register bits (0x1A8).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct BattStatusBits: u16 {
        /// Bit 15: permanent failure, the pack cannot be returned to service.
        const PERMFAIL = 1 << 15;
    }

    /// ProtAlrt (0x0AF) and ProtStatus (0x0D9) bits.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct ProtAlertBits: u16 {
        /// Charge watchdog timer.
        const CHGWDT    = 1 << 15;
        /// Overtemperature during charge.
        const TOOHOTC   = 1 << 14;
        /// Full detection.
        const FULL      = 1 << 13;
        /// Undertemperature during charge.
        const TOOCOLDC  = 1 << 12;
        /// Overvoltage.
        const OVP       = 1 << 11;
        /// Overcharge current.
        const OCCP      = 1 << 10;
        /// Charge counter overflow.
        const QOVFLW    = 1 << 9;
        /// Prequalification timeout.
        const PREQF     = 1 << 8;
        /// Cell imbalance.
        const IMBALANCE = 1 << 7;
        /// Permanent failure detected by measurement.
        const PMFAIL    = 1 << 6;
        /// Die overtemperature.
        const DIEHOT    = 1 << 5;
        /// Overtemperature during discharge.
        const TOOHOTD   = 1 << 4;
        /// Undervoltage.
        const UVP       = 1 << 3;
        /// Overdischarge current.
        const ODCP      = 1 << 2;
        /// Discharge resistance fault.
        const RESDFAULT = 1 << 1;
        /// Leakage detection.
        const LDET      = 1 << 0;
    }

    /// Config2 register bits (0x0AB).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Config2Bits: u16 {
        /// Bit 15: firmware reset request, self-clearing once restart completes.
        const POR_CMD = 1 << 15;
    }
}

/// Latched faults that must never be cleared by a full reset.
pub const REVIVE_BLACKLIST: [ProtAlertBits; 4] = [
    ProtAlertBits::OVP,
    ProtAlertBits::IMBALANCE,
    ProtAlertBits::PREQF,
    ProtAlertBits::PMFAIL,
];

/// First blacklisted fault present in `alerts`, scanning [`REVIVE_BLACKLIST`] in order.
pub fn blacklisted_fault(alerts: ProtAlertBits) -> Option<ProtAlertBits> {
    REVIVE_BLACKLIST
        .iter()
        .copied()
        .find(|mask| alerts.intersects(*mask))
}

/// Convert a raw BATT reading to volts.
pub fn raw_to_volts(raw: u16) -> f32 {
    raw as f32 * VOLTAGE_LSB_V
}

/// Convert a raw CURRENT reading to amps. Negative values mean discharge.
pub fn raw_to_amps(raw: u16) -> f32 {
    (raw as i16) as f32 * CURRENT_LSB_A
}

/// Convert a raw REPCAP/FULLCAP reading to amp-hours.
pub fn raw_to_amp_hours(raw: u16) -> f32 {
    raw as f32 * CAPACITY_LSB_AH
}

/// Decode remaining NV write cycles from the recalled write history.
///
/// Each programming pass sets the next bit of the top byte from the MSB down, so the
/// 0-based index of the first set bit counting from bit 15 is the remaining count.
/// Returns `None` when none of bits 15..8 is set.
pub fn remaining_from_write_cycles(raw: u16) -> Option<u8> {
    let top = (raw >> 8) as u8;
    if top == 0 {
        None
    } else {
        Some(top.leading_zeros() as u8)
    }
}
