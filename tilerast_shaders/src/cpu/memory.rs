// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared heap: one linear arena of words with an atomic bump pointer.

use std::sync::atomic::{AtomicU32, Ordering};

use tilerast_encoding::{Alloc, ReadWords};

pub const NO_ERROR: u32 = 0;
pub const ERR_MALLOC_FAILED: u32 = 1;

/// Result of a heap allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MallocResult {
    pub alloc: Alloc,
    pub failed: bool,
}

/// Heap shared by every invocation of a dispatch.
///
/// Allocation is a bump of `offset`; successful allocations never overlap.
/// A request past the capacity fails and raises the error flag, which stays
/// raised for the rest of the frame. The bump pointer keeps advancing on failure so `requested` reports how much a retry needs.
pub struct Memory {
    offset: AtomicU32,
    error: AtomicU32,
    words: Box<[AtomicU32]>,
}

impl Memory {
    /// An empty heap of `size_in_bytes`; word 0 is reserved as the null reference.
    pub fn new(size_in_bytes: u32) -> Self {
        Self::with_contents(&[0], size_in_bytes)
    }

    /// A heap initialized with `contents`, allocating after them.
    ///
    /// The capacity is at least the size of `contents`.
    pub fn with_contents(contents: &[u32], size_in_bytes: u32) -> Self {
        let n_words = (size_in_bytes as usize / 4).max(contents.len()).max(1);
        let words = (0..n_words)
            .map(|ix| AtomicU32::new(contents.get(ix).copied().unwrap_or(0)))
            .collect();
        Self {
            offset: AtomicU32::new(contents.len().max(1) as u32 * 4),
            error: AtomicU32::new(NO_ERROR),
            words,
        }
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> u32 {
        (self.words.len() * 4) as u32
    }

    /// Bytes handed out or requested so far, including failed requests.
    pub fn requested(&self) -> u32 {
        self.offset.load(Ordering::Relaxed)
    }

    pub fn error(&self) -> u32 {
        self.error.load(Ordering::Relaxed)
    }

    /// Whether no allocation has failed yet.
    pub fn mem_ok(&self) -> bool {
        self.error() == NO_ERROR
    }

    /// Allocates `size` bytes.
    pub fn malloc(&self, size: u32) -> MallocResult {
        let (Ok(offset) | Err(offset)) =
            self.offset
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |offset| {
                    Some(offset.saturating_add(size))
                });
        let failed = offset
            .checked_add(size)
            .map_or(true, |end| end > self.capacity());
        if failed {
            self.raise_error();
        }
        MallocResult {
            alloc: Alloc::new(offset, size),
            failed,
        }
    }

    fn raise_error(&self) {
        if self
            .error
            .compare_exchange(
                NO_ERROR,
                ERR_MALLOC_FAILED,
                Ordering::Relaxed,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            log::debug!(
                "heap exhausted: {} bytes requested of {}",
                self.requested(),
                self.capacity()
            );
        }
    }

    /// Reads the word at word index `ix`.
    pub fn read(&self, ix: u32) -> u32 {
        self.words[ix as usize].load(Ordering::Relaxed)
    }

    /// Writes the word at word index `ix`.
    pub fn write(&self, ix: u32, value: u32) {
        self.words[ix as usize].store(value, Ordering::Relaxed);
    }

    /// Copies out the whole heap.
    pub fn to_words(&self) -> Vec<u32> {
        self.words
            .iter()
            .map(|word| word.load(Ordering::Relaxed))
            .collect()
    }
}

impl ReadWords for Memory {
    fn read_word(&self, ix: u32) -> u32 {
        self.read(ix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_bumped_after_contents() {
        let memory = Memory::with_contents(&[0, 1, 2, 3], 64);
        assert_eq!(memory.read(2), 2);
        let a = memory.malloc(8);
        let b = memory.malloc(12);
        assert!(!a.failed && !b.failed);
        assert_eq!(a.alloc, Alloc::new(16, 8));
        assert_eq!(b.alloc, Alloc::new(24, 12));
        assert!(memory.mem_ok());
    }

    #[test]
    fn reserves_null_word() {
        let memory = Memory::new(16);
        assert_eq!(memory.malloc(4).alloc.offset, 4);
    }

    #[test]
    fn exhaustion_raises_flag_and_tracks_request() {
        let memory = Memory::new(32);
        assert!(!memory.malloc(24).failed);
        let failed = memory.malloc(8);
        assert!(failed.failed);
        assert_eq!(memory.error(), ERR_MALLOC_FAILED);
        // Later requests fail too, even if they would have fit before.
        assert!(memory.malloc(0).failed);
        assert_eq!(memory.requested(), 36);
    }

    #[test]
    fn concurrent_allocations_are_disjoint() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 64;
        let memory = Memory::new(4 + 16 * 400);
        let results: Vec<MallocResult> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        (0..PER_THREAD)
                            .map(|_| memory.malloc(16))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        });
        let mut ok: Vec<Alloc> = results
            .iter()
            .filter(|r| !r.failed)
            .map(|r| r.alloc)
            .collect();
        assert_eq!(ok.len(), 400);
        ok.sort_by_key(|alloc| alloc.offset);
        for pair in ok.windows(2) {
            assert!(pair[0].end() <= pair[1].offset);
        }
        assert!(ok.iter().all(|alloc| alloc.end() <= memory.capacity()));
        assert_eq!(memory.error(), ERR_MALLOC_FAILED);
    }
}
