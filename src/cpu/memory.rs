//! Memory chip.
//!
//! One flat, linear, byte-addressable space: no segments, no pages, no
//! memory-mapped devices. 8K for no particular reason.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of bytes in the memory chip.
pub const MEMORY_SIZE: usize = 8 * 1024;

/// Flat byte memory, zero-filled on construction.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read the byte at `addr`.
    #[inline]
    pub fn read(&self, addr: usize) -> Result<u8, MemoryError> {
        self.cells
            .get(addr)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange(addr))
    }

    /// Write `value` at `addr`.
    #[inline]
    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), MemoryError> {
        let cell = self.cells
            .get_mut(addr)
            .ok_or(MemoryError::AddressOutOfRange(addr))?;
        *cell = value;
        Ok(())
    }

    /// Number of addressable bytes.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Copy `bytes` into memory starting at `start`.
    ///
    /// Nothing is written if the block does not fit.
    pub fn load(&mut self, start: usize, bytes: &[u8]) -> Result<(), MemoryError> {
        if start > MEMORY_SIZE {
            return Err(MemoryError::AddressOutOfRange(start));
        }

        let available = MEMORY_SIZE - start;
        if bytes.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                size: bytes.len(),
                available,
            });
        }

        self.cells[start..start + bytes.len()].copy_from_slice(bytes);
        log::info!("loaded {} bytes at {:#06x}", bytes.len(), start);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u8)> {
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }

    /// The raw contents, lowest address first.
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|&&b| b != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MemoryError {
    /// Address is outside valid memory range.
    #[error("memory address {0:#06x} out of range (0x0000-0x1fff)")]
    AddressOutOfRange(usize),

    /// Block is too large to fit in memory at the requested origin.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_memory_starts_zeroed() {
        let mem = Memory::new();

        assert_eq!(mem.len(), MEMORY_SIZE);
        assert!(mem.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();

        mem.write(0x45, 45).unwrap();
        assert_eq!(mem.read(0x45).unwrap(), 45);
    }

    #[test]
    fn test_memory_bounds() {
        let mut mem = Memory::new();

        assert!(mem.read(0).is_ok());
        assert!(mem.read(MEMORY_SIZE - 1).is_ok());

        assert_eq!(
            mem.read(MEMORY_SIZE),
            Err(MemoryError::AddressOutOfRange(MEMORY_SIZE))
        );
        assert!(mem.write(MEMORY_SIZE, 1).is_err());
        assert!(mem.write(usize::MAX, 1).is_err());
    }

    #[test]
    fn test_load() {
        let mut mem = Memory::new();

        mem.load(0x10, &[1, 2, 3]).unwrap();

        assert_eq!(mem.read(0x10).unwrap(), 1);
        assert_eq!(mem.read(0x11).unwrap(), 2);
        assert_eq!(mem.read(0x12).unwrap(), 3);
        assert_eq!(mem.dump(0x0f, 2), vec![(0x0f, 0), (0x10, 1)]);
    }

    #[test]
    fn test_load_too_large_leaves_memory_untouched() {
        let mut mem = Memory::new();

        let err = mem.load(MEMORY_SIZE - 2, &[9, 9, 9]).unwrap_err();

        assert_eq!(err, MemoryError::ProgramTooLarge { size: 3, available: 2 });
        assert_eq!(mem.read(MEMORY_SIZE - 2).unwrap(), 0);
    }

    #[test]
    fn test_load_past_end_is_rejected() {
        let mut mem = Memory::new();

        assert_eq!(
            mem.load(MEMORY_SIZE + 1, &[]),
            Err(MemoryError::AddressOutOfRange(MEMORY_SIZE + 1))
        );
        assert!(mem.load(usize::MAX, &[1]).is_err());
        assert_eq!(mem.load(MEMORY_SIZE, &[]), Ok(()));
    }

    #[test]
    fn test_clear() {
        let mut mem = Memory::new();
        mem.write(100, 7).unwrap();

        mem.clear();

        assert_eq!(mem, Memory::new());
    }

    proptest! {
        #[test]
        fn prop_write_then_read(addr in 0..MEMORY_SIZE, value: u8) {
            let mut mem = Memory::new();
            mem.write(addr, value).unwrap();
            prop_assert_eq!(mem.read(addr).unwrap(), value);
        }

        #[test]
        fn prop_out_of_range_is_rejected(addr in MEMORY_SIZE..usize::MAX) {
            let mem = Memory::new();
            prop_assert_eq!(mem.read(addr), Err(MemoryError::AddressOutOfRange(addr)));
        }
    }
}
