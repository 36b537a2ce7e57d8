use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};
use max17320_rs::{Error, Max17320, PowerCycle};

#[derive(Default)]
struct RecordingDelay {
    total_ns: u64,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

fn commstat(value: u16) -> I2cTrans {
    let [lo, hi] = value.to_le_bytes();
    I2cTrans::write(0x36, vec![0x61, lo, hi])
}

fn unlock() -> [I2cTrans; 2] {
    [commstat(0x0000), commstat(0x0000)]
}

fn lock() -> [I2cTrans; 2] {
    [commstat(0x00F9), commstat(0x00F9)]
}

fn recall() -> I2cTrans {
    I2cTrans::write(0x36, vec![0x60, 0x9B, 0xE2])
}

fn history(value: u16) -> I2cTrans {
    I2cTrans::write_read(0x0B, vec![0xFD], value.to_le_bytes().to_vec())
}

fn full_sequence(value: u16) -> Vec<I2cTrans> {
    let mut seq = unlock().to_vec();
    seq.push(recall());
    seq.push(history(value));
    seq.extend(lock());
    seq
}

#[test]
fn remaining_cycles_from_first_set_bit() {
    for (raw, expected) in [(0b0001_0000_0000_0000, 3), (0x8000, 0), (0x01FF, 7)] {
        let expectations = full_sequence(raw);
        let mock = I2cMock::new(&expectations);
        let mut driver = Max17320::new(mock, RecordingDelay::default());
        assert_eq!(driver.nv_writes_remaining(), Ok(Some(expected)));
        let (transport, delay, _) = driver.free();
        assert!(delay.total_ns >= 10_000_000);
        transport.free().done();
    }
}

#[test]
fn empty_history_is_reported_and_still_locks() {
    let expectations = full_sequence(0x00FF);
    let mock = I2cMock::new(&expectations);
    let mut driver = Max17320::new(mock, RecordingDelay::default());
    assert_eq!(driver.nv_writes_remaining(), Ok(None));
    driver.release().done();
}

#[test]
fn unlock_failure_aborts_immediately() {
    let expectations = [commstat(0x0000), commstat(0x0000).with_error(ErrorKind::Other)];
    let mock = I2cMock::new(&expectations);
    let mut driver = Max17320::new(mock, RecordingDelay::default());
    assert_eq!(driver.nv_writes_remaining(), Err(Error::Write(ErrorKind::Other)));
    let (transport, delay, _) = driver.free();
    assert_eq!(delay.total_ns, 0);
    transport.free().done();
}

#[test]
fn recall_failure_relocks_and_returns_original_error() {
    let mut expectations = unlock().to_vec();
    expectations.push(recall().with_error(ErrorKind::Other));
    expectations.extend(lock());
    let mock = I2cMock::new(&expectations);
    let mut driver = Max17320::new(mock, RecordingDelay::default());
    assert_eq!(driver.nv_writes_remaining(), Err(Error::Write(ErrorKind::Other)));
    driver.release().done();
}

#[test]
fn history_read_failure_relocks_and_returns_read_error() {
    let mut expectations = unlock().to_vec();
    expectations.push(recall());
    expectations.push(history(0).with_error(ErrorKind::Other));
    expectations.extend(lock());
    let mock = I2cMock::new(&expectations);
    let mut driver = Max17320::new(mock, RecordingDelay::default());
    assert_eq!(driver.nv_writes_remaining(), Err(Error::Read(ErrorKind::Other)));
    driver.release().done();
}

#[test]
fn relock_failure_is_reported() {
    let mut expectations = unlock().to_vec();
    expectations.push(recall());
    expectations.push(history(0x8000));
    expectations.push(commstat(0x00F9).with_error(ErrorKind::Other));
    let mock = I2cMock::new(&expectations);
    let mut driver = Max17320::new(mock, RecordingDelay::default());
    assert_eq!(driver.nv_writes_remaining(), Err(Error::Write(ErrorKind::Other)));
    driver.release().done();
}

fn config2_write() -> I2cTrans {
    I2cTrans::write(0x36, vec![0xAB, 0x00, 0x80])
}

fn config2_read(value: u16) -> I2cTrans {
    I2cTrans::write_read(0x36, vec![0xAB], value.to_le_bytes().to_vec())
}

fn hardware_reset() -> I2cTrans {
    I2cTrans::write(0x36, vec![0x60, 0x0F, 0x00])
}

#[test]
fn power_cycle_reset_waits_for_por_to_clear() {
    let mut expectations = unlock().to_vec();
    expectations.push(hardware_reset());
    expectations.extend(unlock());
    expectations.push(config2_write());
    expectations.push(config2_read(0x8000));
    expectations.push(config2_read(0x0000));
    expectations.extend(lock());
    let mock = I2cMock::new(&expectations);
    let mut driver =
        Max17320::new(mock, RecordingDelay::default()).with_factory(PowerCycle::new(RecordingDelay::default()));
    assert_eq!(driver.full_reset(), Ok(()));
    assert_eq!(driver.apply_configuration(), Err(Error::NotApplicable));
    assert_eq!(driver.clear_permanent_failure(), Err(Error::NotApplicable));
    let (transport, _, factory) = driver.free();
    assert_eq!(factory.free().total_ns, 30_000_000);
    transport.free().done();
}

#[test]
fn power_cycle_reset_times_out() {
    let mut expectations = unlock().to_vec();
    expectations.push(hardware_reset());
    expectations.extend(unlock());
    expectations.push(config2_write());
    expectations.extend((0..1000).map(|_| config2_read(0x8000)));
    expectations.extend(lock());
    let mock = I2cMock::new(&expectations);
    let mut driver =
        Max17320::new(mock, RecordingDelay::default()).with_factory(PowerCycle::new(RecordingDelay::default()));
    assert_eq!(driver.full_reset(), Err(Error::ResetFailed));
    driver.release().done();
}

#[test]
fn bat_okay_recovers_through_power_cycle() {
    let mut expectations = vec![
        I2cTrans::write_read(0x0B, vec![0xA8], vec![0x00, 0x00]),
        I2cTrans::write_read(0x36, vec![0x00], vec![0x00, 0x80]),
        I2cTrans::write_read(0x36, vec![0xAF], vec![0x10, 0x00]),
    ];
    expectations.extend(unlock());
    expectations.push(hardware_reset());
    expectations.extend(unlock());
    expectations.push(config2_write());
    expectations.push(config2_read(0x0000));
    expectations.extend(lock());
    let mock = I2cMock::new(&expectations);
    let mut driver =
        Max17320::new(mock, RecordingDelay::default()).with_factory(PowerCycle::new(RecordingDelay::default()));
    assert_eq!(driver.bat_okay(), Ok(()));
    driver.release().done();
}
