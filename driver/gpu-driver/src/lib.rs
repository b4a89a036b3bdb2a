//! # Accelerator Bring-Up Driver
//!
//! Takes the device from an unknown state to "kernel executing" and back to
//! "results available", using nothing but ordered 32-bit register accesses
//! through [`RegisterIo`](gpu_registers::RegisterIo).
//!
//! ## Layers
//!
//! ```text
//! Caller (runtime, test harness, demo)
//!     ↓
//! Session            global_init · load_kernel · copy_* · launch · wait
//!     ↓
//! Controllers        Reset · MMU · L2 · SM · DMA   (one register block each)
//!     ↓
//! RegisterIo         Mmio (volatile) or a simulated register file
//! ```
//!
//! ## Bring-Up Order
//!
//! [`Session::global_init`] always runs, in this order and without skipping:
//!
//! 1. reset (assert, fixed spin delay, deassert)
//! 2. MMU: page table base, enable, flush
//! 3. L2: enable, flush
//! 4. SM: enable
//!
//! ## Completion
//!
//! Nothing in the driver is interrupt driven. DMA transfers and kernel runs
//! complete by busy-polling a DONE register. The blocking primitives
//! ([`Session::wait`], the `copy_*` operations) spin until DONE reads
//! nonzero and never time out; a device that never finishes hangs the
//! caller. The `*_bounded` variants take a [`PollBudget`] and return
//! [`DriverError::Timeout`] instead.
//!
//! ## Example
//! ```rust,no_run
//! use gpu_driver::{BringUpConfig, KernelDescriptor, Session};
//! use gpu_registers::{DeviceAddress, HostAddress, Mmio};
//!
//! # fn main() -> Result<(), gpu_driver::DriverError> {
//! let io = unsafe { Mmio::new() };
//! let mut session = Session::new(io, BringUpConfig::new());
//! session.global_init()?;
//!
//! session.load_kernel(HostAddress::new(0x0010_0000), 1024, DeviceAddress::new(0xA000_0000))?;
//! session.launch_and_wait(&KernelDescriptor::new(
//!     DeviceAddress::new(0xA000_0000),
//!     DeviceAddress::new(0xA100_0000),
//!     4,
//!     64,
//! ))?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod config;
pub mod controller;
mod error;
mod kernel;
mod poll;
mod session;

pub use config::BringUpConfig;
pub use controller::{
    DmaController, DmaTransfer, L2Controller, MmuController, ResetController, SmController,
};
pub use error::DriverError;
pub use kernel::KernelDescriptor;
pub use poll::PollBudget;
pub use session::{Session, SessionState};
