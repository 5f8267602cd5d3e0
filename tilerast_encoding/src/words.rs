// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Word-addressed read access to a heap.
///
/// Structures are decoded from byte offsets, but the heap itself is an
/// array of `u32`, so offsets are shifted right by two before indexing.
pub trait ReadWords {
    /// Reads the word at word index `ix`.
    fn read_word(&self, ix: u32) -> u32;
}

impl ReadWords for [u32] {
    fn read_word(&self, ix: u32) -> u32 {
        self[ix as usize]
    }
}

impl ReadWords for Vec<u32> {
    fn read_word(&self, ix: u32) -> u32 {
        self[ix as usize]
    }
}

/// Reads `N` consecutive words starting at byte `offset`.
pub fn read_words<const N: usize, M: ReadWords + ?Sized>(mem: &M, offset: u32) -> [u32; N] {
    let base = offset >> 2;
    std::array::from_fn(|i| mem.read_word(base + i as u32))
}
