//! # Bring-Up Demo
//!
//! Drives one full cycle against the simulated accelerator: bring-up, kernel
//! upload, input upload, launch, wait, readback, verify.

mod logger;
mod workload;

use crate::logger::StderrLogger;
use gpu_driver::{BringUpConfig, DriverError, Session};
use gpu_sim::SimulatedDevice;
use log::{LevelFilter, info};

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("failed to install logger")]
    Logger(#[from] log::SetLoggerError),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("output[{index}] = {actual:#x}, expected {expected:#x}")]
    Mismatch { index: usize, actual: u32, expected: u32 },
}

fn main() -> Result<(), DemoError> {
    StderrLogger::new(LevelFilter::Debug).init()?;

    let config = BringUpConfig::new().with_reset_hold_cycles(1_000);
    let device = SimulatedDevice::new(config.device_base())
        .with_dma_latency(8)
        .with_kernel_latency(64)
        .with_kernel(workload::double_kernel);

    let mut session = Session::new(device, config);
    session.global_init()?;

    // Stage the host-side buffers where the DMA engine will pick them up.
    let input = workload::input();
    let memory = session.io_mut().memory_mut();
    memory.write_u32s(workload::KERNEL_HOST.as_u64(), &[0; workload::WORDS]);
    memory.write_u32s(workload::INPUT_HOST.as_u64(), &input);

    session.load_kernel(workload::KERNEL_HOST, workload::BYTES, workload::KERNEL_DEVICE)?;
    session.copy_to_device(workload::INPUT_DEVICE, workload::INPUT_HOST, workload::BYTES)?;

    let kernel = workload::descriptor();
    info!("launching {} threads", kernel.threads());
    session.launch_and_wait(&kernel)?;

    session.copy_from_device(workload::OUTPUT_HOST, workload::OUTPUT_DEVICE, workload::BYTES)?;

    let device = session.into_inner();
    let output = device
        .memory()
        .read_u32s(workload::OUTPUT_HOST.as_u64(), workload::WORDS);
    for (index, (&actual, &source)) in output.iter().zip(&input).enumerate() {
        let expected = workload::expected(source);
        if actual != expected {
            return Err(DemoError::Mismatch {
                index,
                actual,
                expected,
            });
        }
    }

    info!(
        "{} words verified; {} DMA transfers, {} register accesses",
        output.len(),
        device.transfers().len(),
        device.registers().trace().len()
    );
    Ok(())
}
