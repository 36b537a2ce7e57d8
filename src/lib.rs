//! MAX17320 Rust Driver
//!
//! no-std driver for the MAX17320 fuel gauge and protector over a register-mapped
//! bus: scaled telemetry, a pack health check with one guarded recovery attempt, and
//! the remaining NV write-cycle count. Factory-only operations are declared but locked
//! unless a privileged [`factory::FactoryAccess`] is supplied.

#![no_std]

pub(crate) mod fmt;

pub mod data_types;
pub mod driver;
pub mod error;
pub mod factory;
pub mod registers;
pub mod transport;

pub use data_types::{BatteryStats, Quantity};
pub use driver::Max17320;
pub use error::Error;
pub use factory::{FactoryAccess, Locked, PowerCycle};
pub use transport::{I2cTransport, RegisterTransport};
