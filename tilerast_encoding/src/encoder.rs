// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-side encoding of heap contents.

use std::marker::PhantomData;

/// A reference to an encoded object within the heap.
#[derive(Debug)]
pub struct Ref<T> {
    offset: u32,
    _phantom: PhantomData<T>,
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ref<T> {}

impl<T> Ref<T> {
    pub fn new(offset: u32) -> Self {
        Self {
            offset,
            _phantom: PhantomData,
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// Growable byte image of the initial heap contents.
#[derive(Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

pub trait Encode: Sized {
    /// Size of the encoded object in bytes.
    fn fixed_size() -> usize;

    /// Encode into a buffer; panics if not appropriately sized.
    fn encode_to(&self, buf: &mut [u8]);

    /// Allocate a chunk and encode, returning a reference.
    fn encode(&self, encoder: &mut Encoder) -> Ref<Self> {
        let (offset, buf) = encoder.alloc_chunk(Self::fixed_size() as u32);
        self.encode_to(buf);
        Ref::new(offset)
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `size` zeroed bytes, returning their offset.
    pub fn alloc_chunk(&mut self, size: u32) -> (u32, &mut [u8]) {
        let offset = self.buf.len();
        self.buf.resize(size as usize + offset, 0);
        (offset as u32, &mut self.buf[offset..])
    }

    /// Overwrites an already encoded object.
    pub fn patch<T: Encode>(&mut self, at: Ref<T>, value: &T) {
        let start = at.offset() as usize;
        value.encode_to(&mut self.buf[start..start + T::fixed_size()]);
    }

    pub fn len(&self) -> u32 {
        self.buf.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn buf(&self) -> &[u8] {
        &self.buf
    }

    /// The encoded heap as words, zero padded to a word boundary.
    pub fn into_words(mut self) -> Vec<u32> {
        self.buf.resize(self.buf.len().next_multiple_of(4), 0);
        self.buf
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect()
    }
}

impl Encode for u32 {
    fn fixed_size() -> usize {
        4
    }

    fn encode_to(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.to_le_bytes());
    }
}

/// Encodes a fixed-size list of words, as produced by the `to_words` methods
/// of the tagged unions.
pub(crate) fn encode_words(words: &[u32], buf: &mut [u8]) {
    for (ix, word) in words.iter().enumerate() {
        buf[ix * 4..ix * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
}

/// `Encode` for plain structs whose in-memory layout is the wire layout.
///
/// Like the GPU upload path this assumes a little-endian host.
macro_rules! impl_encode_pod {
    ($($ty:ty),*) => {
        $(
            impl $crate::Encode for $ty {
                fn fixed_size() -> usize {
                    std::mem::size_of::<$ty>()
                }

                fn encode_to(&self, buf: &mut [u8]) {
                    buf[..std::mem::size_of::<$ty>()].copy_from_slice(bytemuck::bytes_of(self));
                }
            }
        )*
    };
}

pub(crate) use impl_encode_pod;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_little_endian_words() {
        let mut encoder = Encoder::new();
        let a = 0x0403_0201_u32.encode(&mut encoder);
        let b = 7_u32.encode(&mut encoder);
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 4);
        assert_eq!(&encoder.buf()[0..4], &[1, 2, 3, 4]);
        encoder.patch(b, &9);
        assert_eq!(encoder.into_words(), vec![0x0403_0201, 9]);
    }

    #[test]
    fn pads_to_word_boundary() {
        let mut encoder = Encoder::new();
        encoder.alloc_chunk(5);
        assert_eq!(encoder.into_words().len(), 2);
    }
}
