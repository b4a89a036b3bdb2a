use std::collections::BTreeMap;

const PAGE_SIZE: u64 = 4096;
// Lossless: PAGE_SIZE fits every supported usize.
#[allow(clippy::cast_possible_truncation)]
const PAGE_BYTES: usize = PAGE_SIZE as usize;

/// Sparse byte-addressable memory shared by the simulated host and device.
///
/// Pages are allocated on first write; untouched memory reads as zero.
#[derive(Debug, Default, Clone)]
pub struct Memory {
    pages: BTreeMap<u64, Box<[u8; PAGE_BYTES]>>,
}

impl Memory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages that have been written.
    #[must_use]
    pub fn resident_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn write(&mut self, address: u64, bytes: &[u8]) {
        let mut addr = address;
        let mut rest = bytes;
        while !rest.is_empty() {
            let (page, offset) = split(addr);
            let n = rest.len().min(PAGE_BYTES - offset);
            let frame = self.pages.entry(page).or_insert_with(|| Box::new([0; PAGE_BYTES]));
            frame[offset..offset + n].copy_from_slice(&rest[..n]);
            rest = &rest[n..];
            addr = addr.wrapping_add(n as u64);
        }
    }

    pub fn read(&self, address: u64, out: &mut [u8]) {
        let mut addr = address;
        let mut done = 0;
        while done < out.len() {
            let (page, offset) = split(addr);
            let n = (out.len() - done).min(PAGE_BYTES - offset);
            match self.pages.get(&page) {
                Some(frame) => out[done..done + n].copy_from_slice(&frame[offset..offset + n]),
                None => out[done..done + n].fill(0),
            }
            done += n;
            addr = addr.wrapping_add(n as u64);
        }
    }

    /// Copy `len` bytes within memory; overlapping ranges behave like `memmove`.
    pub fn copy(&mut self, src: u64, dst: u64, len: usize) {
        let mut buf = vec![0; len];
        self.read(src, &mut buf);
        self.write(dst, &buf);
    }

    /// Write native-endian 32-bit words, as a device would see a `u32` array.
    pub fn write_u32s(&mut self, address: u64, words: &[u32]) {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_ne_bytes()).collect();
        self.write(address, &bytes);
    }

    #[must_use]
    pub fn read_u32s(&self, address: u64, count: usize) -> Vec<u32> {
        let mut bytes = vec![0; count * 4];
        self.read(address, &mut bytes);
        bytes
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn split(address: u64) -> (u64, usize) {
    (address / PAGE_SIZE, (address % PAGE_SIZE) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_memory_reads_zero() {
        let mem = Memory::new();
        let mut out = [0xFF; 8];
        mem.read(0xA000_0000, &mut out);
        assert_eq!(out, [0; 8]);
        assert_eq!(mem.resident_pages(), 0);
    }

    #[test]
    fn writes_cross_page_boundaries() {
        let mut mem = Memory::new();
        let data: Vec<u8> = (0..=255).collect();
        mem.write(PAGE_SIZE - 100, &data);

        let mut out = vec![0; data.len()];
        mem.read(PAGE_SIZE - 100, &mut out);
        assert_eq!(out, data);
        assert_eq!(mem.resident_pages(), 2);
    }

    #[test]
    fn copy_moves_words() {
        let mut mem = Memory::new();
        mem.write_u32s(0x1000, &[1, 2, 3]);
        mem.copy(0x1000, 0xA100_0000, 12);
        assert_eq!(mem.read_u32s(0xA100_0000, 3), [1, 2, 3]);
    }
}
