use crate::DriverError;
use gpu_registers::DeviceAddress;

/// Launch parameters for one kernel.
///
/// `entry_point` and `arg_ptr` must point at device memory that a completed
/// DMA transfer has filled; the driver does not track device memory and
/// cannot check this.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct KernelDescriptor {
    pub entry_point: DeviceAddress,
    pub arg_ptr: DeviceAddress,
    pub grid_x: u32,
    pub block_x: u32,
}

impl KernelDescriptor {
    #[must_use]
    pub const fn new(
        entry_point: DeviceAddress,
        arg_ptr: DeviceAddress,
        grid_x: u32,
        block_x: u32,
    ) -> Self {
        Self {
            entry_point,
            arg_ptr,
            grid_x,
            block_x,
        }
    }

    /// Number of threads the launch covers.
    #[must_use]
    pub const fn threads(&self) -> u64 {
        self.grid_x as u64 * self.block_x as u64
    }

    /// The hardware accepts zero dimensions, but such a launch does nothing
    /// meaningful.
    ///
    /// # Errors
    /// [`DriverError::InvalidDescriptor`] naming the first zero dimension.
    pub const fn validate(&self) -> Result<(), DriverError> {
        if self.grid_x == 0 {
            return Err(DriverError::InvalidDescriptor { field: "grid_x" });
        }
        if self.block_x == 0 {
            return Err(DriverError::InvalidDescriptor { field: "block_x" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_are_rejected() {
        let entry = DeviceAddress::new(0xA000_0000);
        let args = DeviceAddress::new(0xA100_0000);
        let mut kd = KernelDescriptor::new(entry, args, 4, 64);
        assert_eq!(kd.validate(), Ok(()));
        assert_eq!(kd.threads(), 256);

        kd.block_x = 0;
        assert_eq!(kd.validate(), Err(DriverError::InvalidDescriptor { field: "block_x" }));

        kd.grid_x = 0;
        assert_eq!(kd.validate(), Err(DriverError::InvalidDescriptor { field: "grid_x" }));
    }
}
