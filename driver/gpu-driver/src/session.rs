//! # Device Session
//!
//! The single owner of the device. A session holds the register I/O object
//! and is the only code that drives the controllers; there is no global
//! device state. Sessions are not meant to be shared between threads; wrap
//! one in a lock if several threads need the device.

use crate::controller::{
    DmaController, DmaTransfer, L2Controller, MmuController, ResetController, SmController,
};
use crate::{BringUpConfig, DriverError, KernelDescriptor, PollBudget};
use gpu_registers::{DeviceAddress, HostAddress, RegisterIo};
use log::{debug, info};

/// Logical state of the device as tracked by the session.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum SessionState {
    /// Power-on; nothing has been programmed.
    #[default]
    Uninitialized,
    /// Bring-up is in progress.
    Resetting,
    /// Reset, MMU, L2 and SMs are up.
    Initialized,
    /// A kernel binary was copied to device memory.
    KernelLoaded,
    /// Input data was copied to device memory.
    DataStaged,
    /// A kernel was started and not yet waited on.
    Launched,
    /// The last launched kernel finished.
    Complete,
}

impl SessionState {
    /// Whether bring-up has completed.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        !matches!(self, Self::Uninitialized | Self::Resetting)
    }
}

/// Exclusive handle to one device.
#[derive(Debug)]
pub struct Session<R> {
    io: R,
    config: BringUpConfig,
    reset: ResetController,
    mmu: MmuController,
    l2: L2Controller,
    sm: SmController,
    dma: DmaController,
    state: SessionState,
    /// A bounded copy timed out and DMA DONE has not been seen since.
    dma_in_flight: bool,
}

impl<R> Session<R>
where
    R: RegisterIo,
{
    /// Take ownership of the device's register space. Nothing is written
    /// until [`Self::global_init`].
    #[must_use]
    pub const fn new(io: R, config: BringUpConfig) -> Self {
        let base = config.device_base();
        let policy = config.address_policy();
        Self {
            io,
            config,
            reset: ResetController::new(base),
            mmu: MmuController::new(base, policy),
            l2: L2Controller::new(base),
            sm: SmController::new(base, policy),
            dma: DmaController::new(base, policy),
            state: SessionState::Uninitialized,
            dma_in_flight: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a timed-out transfer may still be running on the DMA engine.
    #[must_use]
    pub const fn dma_in_flight(&self) -> bool {
        self.dma_in_flight
    }

    #[must_use]
    pub const fn config(&self) -> &BringUpConfig {
        &self.config
    }

    #[must_use]
    pub const fn io(&self) -> &R {
        &self.io
    }

    pub const fn io_mut(&mut self) -> &mut R {
        &mut self.io
    }

    /// Give up the device and return the register I/O object.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.io
    }

    /// Bring the device up: reset, MMU, L2, then SMs, in exactly that order.
    ///
    /// Reset comes first because register contents only mean something
    /// after it; MMU and L2 precede the SMs because dispatched kernels access
    /// memory immediately. May be called again to redo bring-up.
    ///
    /// # Errors
    /// [`DriverError::Narrowing`] if the configured page table base does not
    /// fit the MMU register. This is checked before reset is asserted, so the
    /// device is left untouched and the state unchanged.
    pub fn global_init(&mut self) -> Result<(), DriverError> {
        let page_table_base = self.config.page_table_base();
        self.mmu.page_table_register(page_table_base)?;

        info!(
            "bringing up device at {:#x}, page table at {page_table_base}",
            self.config.device_base().as_u64()
        );

        self.state = SessionState::Resetting;
        self.reset.reset(&mut self.io, self.config.reset_hold_cycles());
        self.dma_in_flight = false;
        self.mmu.init(&mut self.io, page_table_base)?;
        self.l2.init(&mut self.io);
        self.sm.enable(&mut self.io);
        self.state = SessionState::Initialized;

        info!("device initialized");
        Ok(())
    }

    /// Copy a kernel binary from host memory to `device_address`.
    ///
    /// If an earlier bounded copy timed out, its DONE is awaited first so the
    /// engine is never reprogrammed under a running transfer.
    ///
    /// # Errors
    /// [`DriverError::NotInitialized`] before bring-up;
    /// [`DriverError::Narrowing`] if an address or `size` does not fit.
    pub fn load_kernel(
        &mut self,
        binary: HostAddress,
        size: usize,
        device_address: DeviceAddress,
    ) -> Result<(), DriverError> {
        self.require_ready()?;
        debug!("loading {size} byte kernel to {device_address}");
        let transfer = DmaTransfer::to_device(binary, device_address, size);
        self.transfer(transfer, PollBudget::Unbounded)?;
        self.advance(SessionState::KernelLoaded);
        Ok(())
    }

    /// Copy `size` bytes from host memory at `src` to device memory at `dst`.
    ///
    /// # Errors
    /// As for [`Self::load_kernel`].
    pub fn copy_to_device(
        &mut self,
        dst: DeviceAddress,
        src: HostAddress,
        size: usize,
    ) -> Result<(), DriverError> {
        self.transfer(DmaTransfer::to_device(src, dst, size), PollBudget::Unbounded)?;
        self.advance(SessionState::DataStaged);
        Ok(())
    }

    /// Copy `size` bytes from device memory at `src` back to host memory at `dst`.
    ///
    /// # Errors
    /// As for [`Self::load_kernel`].
    pub fn copy_from_device(
        &mut self,
        dst: HostAddress,
        src: DeviceAddress,
        size: usize,
    ) -> Result<(), DriverError> {
        self.transfer(DmaTransfer::from_device(src, dst, size), PollBudget::Unbounded)
    }

    /// Issue a raw transfer and poll for completion within `budget`.
    ///
    /// Does not change the session state. On timeout the transfer is
    /// remembered as in flight; the next DMA operation polls its DONE before
    /// writing any DMA register. That poll and the new transfer each get the
    /// full `budget`.
    ///
    /// # Errors
    /// As for [`Self::load_kernel`], plus [`DriverError::Timeout`].
    pub fn copy_bounded(
        &mut self,
        transfer: DmaTransfer,
        budget: PollBudget,
    ) -> Result<(), DriverError> {
        self.transfer(transfer, budget)
    }

    /// Start a kernel without waiting for it.
    ///
    /// # Errors
    /// [`DriverError::NotInitialized`] before bring-up;
    /// [`DriverError::KernelInFlight`] if the previous launch was not waited on;
    /// [`DriverError::InvalidDescriptor`] for zero grid or block dimensions;
    /// [`DriverError::Narrowing`] if an address does not fit.
    pub fn launch(&mut self, kernel: &KernelDescriptor) -> Result<(), DriverError> {
        self.require_ready()?;
        if self.state == SessionState::Launched {
            return Err(DriverError::KernelInFlight);
        }
        kernel.validate()?;

        self.sm.launch(&mut self.io, kernel)?;
        self.state = SessionState::Launched;
        Ok(())
    }

    /// Spin until the SM block reports the kernel done.
    ///
    /// # Errors
    /// [`DriverError::NotInitialized`] before bring-up;
    /// [`DriverError::NotLaunched`] if no kernel is in flight. DONE is not
    /// polled in either case.
    pub fn wait(&mut self) -> Result<(), DriverError> {
        self.require_launched()?;
        self.sm.wait(&mut self.io);
        self.state = SessionState::Complete;
        Ok(())
    }

    /// Like [`Self::wait`], but gives up after `budget`. On timeout the
    /// kernel is still considered in flight.
    ///
    /// # Errors
    /// As for [`Self::wait`], plus [`DriverError::Timeout`] if the kernel did
    /// not finish in time.
    pub fn wait_bounded(&mut self, budget: PollBudget) -> Result<(), DriverError> {
        self.require_launched()?;
        self.sm.wait_bounded(&mut self.io, budget)?;
        self.state = SessionState::Complete;
        Ok(())
    }

    /// [`Self::launch`] followed by [`Self::wait`].
    ///
    /// # Errors
    /// As for [`Self::launch`].
    pub fn launch_and_wait(&mut self, kernel: &KernelDescriptor) -> Result<(), DriverError> {
        self.launch(kernel)?;
        self.wait()
    }

    const fn require_ready(&self) -> Result<(), DriverError> {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(DriverError::NotInitialized)
        }
    }

    const fn require_launched(&self) -> Result<(), DriverError> {
        match self.state {
            SessionState::Launched => Ok(()),
            SessionState::Uninitialized | SessionState::Resetting => {
                Err(DriverError::NotInitialized)
            }
            _ => Err(DriverError::NotLaunched),
        }
    }

    /// Run one DMA transfer, first finishing a transfer an earlier timeout
    /// left behind.
    fn transfer(&mut self, transfer: DmaTransfer, budget: PollBudget) -> Result<(), DriverError> {
        self.require_ready()?;
        if self.dma_in_flight {
            debug!("waiting for the previous DMA transfer to finish");
            self.dma.drain(&mut self.io, budget)?;
            self.dma_in_flight = false;
        }

        let result = self.dma.copy_bounded(&mut self.io, transfer, budget);
        if matches!(result, Err(DriverError::Timeout { .. })) {
            self.dma_in_flight = true;
        }
        result
    }

    /// Record a staging step. Transfers that overlap a running kernel leave
    /// the state at `Launched`.
    const fn advance(&mut self, next: SessionState) {
        if !matches!(self.state, SessionState::Launched) {
            self.state = next;
        }
    }
}
