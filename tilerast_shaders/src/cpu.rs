// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU implementations of the compute kernels.
//!
//! Each kernel is written as a workgroup: shared arrays live on the stack of
//! the workgroup function, and the code between two barriers runs as a loop
//! over the invocations of the group. Workgroups of a dispatch are
//! independent and run in any order, on the rayon thread pool when the
//! `multithreading` feature is enabled.

// Allow un-idiomatic Rust to more closely match shaders
#![expect(
    clippy::needless_range_loop,
    reason = "Keeps code easily comparable to GPU shaders"
)]

mod backdrop;
mod fine;
mod memory;
mod util;

pub use backdrop::{backdrop, backdrop_main};
pub use fine::{fine, fine_main};
pub use memory::{MallocResult, Memory, ERR_MALLOC_FAILED, NO_ERROR};
pub use util::{from_srgb, pack_srgb, to_srgb, unpack_srgb};

use std::cell::{RefCell, RefMut};

use bytemuck::Pod;

#[derive(Clone, Copy)]
pub enum CpuBinding<'a> {
    Buffer(&'a [u8]),
    Memory(&'a Memory),
    Texture(&'a CpuTexture),
    Textures(&'a [CpuTexture]),
    TextureRW(&'a RefCell<CpuTexture>),
}

impl CpuBinding<'_> {
    pub fn as_typed<T: Pod>(&self) -> T {
        match self {
            CpuBinding::Buffer(b) => bytemuck::pod_read_unaligned(b),
            _ => panic!("resource type mismatch"),
        }
    }

    pub fn as_memory(&self) -> &Memory {
        match self {
            CpuBinding::Memory(m) => m,
            _ => panic!("resource type mismatch"),
        }
    }

    pub fn as_tex(&self) -> &CpuTexture {
        match self {
            CpuBinding::Texture(t) => t,
            _ => panic!("resource type mismatch"),
        }
    }

    pub fn as_textures(&self) -> &[CpuTexture] {
        match self {
            CpuBinding::Textures(t) => t,
            _ => panic!("resource type mismatch"),
        }
    }

    pub fn as_tex_mut(&self) -> RefMut<'_, CpuTexture> {
        match self {
            CpuBinding::TextureRW(t) => t.borrow_mut(),
            _ => panic!("resource type mismatch"),
        }
    }
}

/// Structure used for binding textures to CPU shaders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuTexture {
    pub width: usize,
    pub height: usize,
    // In RGBA format: r in the lowest byte, a in the highest.
    pub pixels: Vec<u32>,
}

impl CpuTexture {
    /// A transparent texture.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u32>) -> Self {
        assert_eq!(pixels.len(), width * height, "pixel count");
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Loads a texel, transparent black outside the texture.
    pub fn load(&self, x: i32, y: i32) -> u32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0;
        }
        self.pixels[y as usize * self.width + x as usize]
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Runs `f` for every workgroup of a dispatch, collecting the results in
/// workgroup order.
pub(crate) fn for_each_workgroup<T, F>(n_wg: u32, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(u32) -> T + Sync + Send,
{
    #[cfg(feature = "multithreading")]
    {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
        (0..n_wg).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "multithreading"))]
    {
        (0..n_wg).map(f).collect()
    }
}
