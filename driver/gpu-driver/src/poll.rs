use core::hint::spin_loop;
use core::num::NonZeroU32;
use gpu_registers::{RegisterAddress, RegisterIo, Strobe};

/// How long to poll a DONE register.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PollBudget {
    /// Spin until DONE reads nonzero, however long that takes.
    #[default]
    Unbounded,
    /// Give up after this many reads of DONE.
    Attempts(NonZeroU32),
}

impl PollBudget {
    /// A bounded budget; `0` is treated as a single attempt.
    #[must_use]
    pub const fn attempts(n: u32) -> Self {
        match NonZeroU32::new(n) {
            Some(n) => Self::Attempts(n),
            None => Self::Attempts(NonZeroU32::MIN),
        }
    }
}

/// Read `done` until it is nonzero or the budget runs out.
///
/// Returns `Ok(reads)` once completion was observed and `Err(reads)` when the
/// budget was exhausted. With [`PollBudget::Unbounded`] only `Ok` is ever
/// returned.
pub(crate) fn poll_done<R>(
    io: &mut R,
    done: RegisterAddress,
    budget: PollBudget,
) -> Result<u32, u32>
where
    R: RegisterIo + ?Sized,
{
    let mut reads = 0u32;
    loop {
        let raw = io.read(done);
        reads = reads.saturating_add(1);
        if Strobe::is_done(raw) {
            return Ok(reads);
        }

        if let PollBudget::Attempts(limit) = budget
            && reads >= limit.get()
        {
            return Err(reads);
        }

        spin_loop();
    }
}
