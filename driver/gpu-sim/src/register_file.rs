use gpu_registers::{RegisterAddress, RegisterIo};
use std::collections::BTreeMap;

/// One observed register access.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Access {
    Read { address: RegisterAddress, value: u32 },
    Write { address: RegisterAddress, value: u32 },
}

impl Access {
    #[must_use]
    pub const fn address(&self) -> RegisterAddress {
        match *self {
            Self::Read { address, .. } | Self::Write { address, .. } => address,
        }
    }

    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

/// Passive 32-bit register file with an access trace.
///
/// Unwritten registers read as zero.
#[derive(Debug, Default, Clone)]
pub struct RegisterFile {
    values: BTreeMap<RegisterAddress, u32>,
    /// Remaining zero reads before a register flips to 1.
    countdown: BTreeMap<RegisterAddress, u32>,
    trace: Vec<Access>,
    reads: usize,
    read_budget: Option<usize>,
}

impl RegisterFile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Panic on the read after `reads` reads.
    ///
    /// Stands in for a test timeout around calls that would otherwise spin
    /// forever.
    #[must_use]
    pub fn with_read_budget(mut self, reads: usize) -> Self {
        self.read_budget = Some(reads);
        self
    }

    /// Set a register without recording an access.
    pub fn set(&mut self, address: RegisterAddress, value: u32) {
        self.countdown.remove(&address);
        self.values.insert(address, value);
    }

    /// Current value of a register without recording an access.
    #[must_use]
    pub fn get(&self, address: RegisterAddress) -> u32 {
        self.values.get(&address).copied().unwrap_or(0)
    }

    /// Make `address` read 0 for `polls - 1` reads and 1 from then on.
    ///
    /// `polls` of 0 or 1 completes on the next read.
    pub fn complete_after(&mut self, address: RegisterAddress, polls: u32) {
        self.values.insert(address, 0);
        self.countdown.insert(address, polls.max(1));
    }

    /// Hold `address` at 0 indefinitely.
    pub fn stall(&mut self, address: RegisterAddress) {
        self.set(address, 0);
    }

    /// Reset every register to zero. The trace is kept.
    pub fn clear_values(&mut self) {
        self.values.clear();
        self.countdown.clear();
    }

    /// All accesses so far, in issue order.
    #[must_use]
    pub fn trace(&self) -> &[Access] {
        &self.trace
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Writes so far as `(address, value)`, in issue order.
    #[must_use]
    pub fn writes(&self) -> impl Iterator<Item = (RegisterAddress, u32)> + '_ {
        self.trace.iter().filter_map(|a| match *a {
            Access::Write { address, value } => Some((address, value)),
            Access::Read { .. } => None,
        })
    }

    /// Total number of reads so far.
    #[must_use]
    pub const fn reads(&self) -> usize {
        self.reads
    }

    /// Number of reads of one register so far.
    #[must_use]
    pub fn reads_of(&self, address: RegisterAddress) -> usize {
        self.trace
            .iter()
            .filter(|a| matches!(a, Access::Read { address: at, .. } if *at == address))
            .count()
    }
}

impl RegisterIo for RegisterFile {
    fn read(&mut self, address: RegisterAddress) -> u32 {
        if let Some(budget) = self.read_budget
            && self.reads >= budget
        {
            panic!("poll budget exhausted after {budget} reads (last: {address})");
        }

        if let Some(remaining) = self.countdown.get_mut(&address) {
            *remaining -= 1;
            if *remaining == 0 {
                self.countdown.remove(&address);
                self.values.insert(address, 1);
            }
        }

        let value = self.get(address);
        self.reads += 1;
        self.trace.push(Access::Read { address, value });
        value
    }

    fn write(&mut self, address: RegisterAddress, value: u32) {
        self.countdown.remove(&address);
        self.values.insert(address, value);
        self.trace.push(Access::Write { address, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: RegisterAddress = RegisterAddress::new(0x100);
    const B: RegisterAddress = RegisterAddress::new(0x104);

    #[test]
    fn unwritten_registers_read_zero() {
        let mut regs = RegisterFile::new();
        assert_eq!(regs.read(A), 0);
        assert_eq!(regs.trace(), &[Access::Read { address: A, value: 0 }]);
    }

    #[test]
    fn writes_are_recorded_and_never_merged() {
        let mut regs = RegisterFile::new();
        regs.write(A, 1);
        regs.write(A, 1);
        regs.write(B, 7);
        let writes: Vec<_> = regs.writes().collect();
        assert_eq!(writes, [(A, 1), (A, 1), (B, 7)]);
        assert_eq!(regs.get(A), 1);
    }

    #[test]
    fn countdown_flips_on_the_nth_read() {
        let mut regs = RegisterFile::new();
        regs.complete_after(A, 3);
        assert_eq!([regs.read(A), regs.read(A), regs.read(A), regs.read(A)], [0, 0, 1, 1]);
        assert_eq!(regs.reads_of(A), 4);
        assert_eq!(regs.reads_of(B), 0);
    }

    #[test]
    #[should_panic(expected = "poll budget exhausted")]
    fn read_budget_panics() {
        let mut regs = RegisterFile::new().with_read_budget(2);
        regs.read(A);
        regs.read(A);
        regs.read(A);
    }

    #[test]
    fn clear_values_keeps_trace() {
        let mut regs = RegisterFile::new();
        regs.write(A, 5);
        regs.clear_values();
        assert_eq!(regs.get(A), 0);
        assert_eq!(regs.trace().len(), 1);
        assert!(regs.trace()[0].is_write());
        assert_eq!(regs.trace()[0].address(), A);
    }
}
