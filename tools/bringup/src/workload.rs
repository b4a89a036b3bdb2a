//! The demo workload: buffer layout and the kernel the simulator plays.

use gpu_driver::KernelDescriptor;
use gpu_registers::{DeviceAddress, HostAddress};
use gpu_sim::{LaunchParams, Memory};

/// Words per buffer.
pub const WORDS: usize = 256;

/// Bytes per buffer.
pub const BYTES: usize = WORDS * size_of::<u32>();

pub const KERNEL_DEVICE: DeviceAddress = DeviceAddress::new(0xA000_0000);
pub const INPUT_DEVICE: DeviceAddress = DeviceAddress::new(0xA100_0000);
pub const OUTPUT_DEVICE: DeviceAddress = DeviceAddress::new(0xA200_0000);

/// Host staging buffers as the DMA engine sees them.
pub const KERNEL_HOST: HostAddress = HostAddress::new(0x0010_0000);
pub const INPUT_HOST: HostAddress = HostAddress::new(0x0010_1000);
pub const OUTPUT_HOST: HostAddress = HostAddress::new(0x0010_2000);

#[must_use]
pub const fn descriptor() -> KernelDescriptor {
    KernelDescriptor::new(KERNEL_DEVICE, INPUT_DEVICE, 4, 64)
}

/// `input[i] = i`.
#[must_use]
pub fn input() -> Vec<u32> {
    (0..).take(WORDS).collect()
}

/// What the kernel writes for a given input word.
#[must_use]
pub const fn expected(input: u32) -> u32 {
    input.wrapping_mul(2)
}

/// Doubles `grid_x * block_x` words from the argument buffer into the
/// output buffer.
pub fn double_kernel(params: &LaunchParams, memory: &mut Memory) {
    let threads = params.grid_x as usize * params.block_x as usize;
    let input = memory.read_u32s(u64::from(params.arg_ptr), threads);
    let output: Vec<u32> = input.into_iter().map(expected).collect();
    memory.write_u32s(OUTPUT_DEVICE.as_u64(), &output);
}
