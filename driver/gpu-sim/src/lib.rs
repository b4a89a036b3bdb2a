//! # Simulated Accelerator
//!
//! Host-side stand-ins for the device's register window, used by the driver
//! tests and the `bringup` demo.
//!
//! * [`RegisterFile`] is a passive register file that records every access
//!   in order. DONE registers can be told to complete after a number of
//!   polls, and a read budget turns a hang into a panic so tests can observe
//!   "never returns" without actually hanging.
//! * [`SimulatedDevice`] adds behavior on top: DMA transfers move bytes in a
//!   sparse [`Memory`], kernel launches run a host closure, and reset returns
//!   all registers to zero.

mod device;
mod memory;
mod register_file;

pub use device::{DmaRecord, KernelFn, LaunchParams, SimulatedDevice};
pub use memory::Memory;
pub use register_file::{Access, RegisterFile};
