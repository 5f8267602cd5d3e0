// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bytemuck::{Pod, Zeroable};

/// Width of a tile in pixels.
pub const TILE_WIDTH_PX: u32 = 32;
/// Height of a tile in pixels.
pub const TILE_HEIGHT_PX: u32 = 32;
pub const TILE_SIZE_PX: u32 = TILE_WIDTH_PX * TILE_HEIGHT_PX;

/// Size in bytes of the initial command tape of each tile.
///
/// Tapes that don't fit continue in a separately allocated segment through
/// a jump command.
pub const PTCL_INITIAL_ALLOC: u32 = 1024;

// If changing also change in the backdrop kernel
pub const LG_BACKDROP_WG: u32 = 8;
pub const BACKDROP_WG: u32 = 1 << LG_BACKDROP_WG;

/// A region of the shared heap.
///
/// This must be kept in sync with the heap layout used by the kernels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct Alloc {
    /// Byte offset of the region.
    pub offset: u32,
    /// Size of the region in bytes.
    pub size: u32,
}

impl Alloc {
    pub const fn new(offset: u32, size: u32) -> Self {
        Self { offset, size }
    }

    /// End of the region (exclusive), in bytes.
    pub fn end(&self) -> u32 {
        self.offset + self.size
    }
}

/// Uniform render configuration data used by both kernels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct ConfigUniform {
    /// Number of annotated elements (and paths).
    pub n_elements: u32,
    /// Width of the target in tiles.
    pub width_in_tiles: u32,
    /// Height of the target in tiles.
    pub height_in_tiles: u32,
    /// Annotated elements, written by the encoder.
    pub anno_alloc: Alloc,
    /// Paths followed by their tiles and tile segments.
    pub tile_alloc: Alloc,
    /// Per-tile command tapes.
    pub ptcl_alloc: Alloc,
}

static_assertions::const_assert_eq!(std::mem::size_of::<ConfigUniform>(), 36);

impl ConfigUniform {
    pub fn n_tiles(&self) -> u32 {
        self.width_in_tiles * self.height_in_tiles
    }

    /// Width of the tile grid in pixels.
    pub fn width_px(&self) -> u32 {
        self.width_in_tiles * TILE_WIDTH_PX
    }

    /// Height of the tile grid in pixels.
    pub fn height_px(&self) -> u32 {
        self.height_in_tiles * TILE_HEIGHT_PX
    }

    /// Byte offset of the initial command tape of tile `tile_ix`.
    pub fn tape_offset(&self, tile_ix: u32) -> u32 {
        self.ptcl_alloc.offset + tile_ix * PTCL_INITIAL_ALLOC
    }

    /// The heap regions named by this config, in ascending order of offset.
    pub fn regions(&self) -> [Alloc; 3] {
        let mut regions = [self.anno_alloc, self.tile_alloc, self.ptcl_alloc];
        regions.sort_by_key(|alloc| alloc.offset);
        regions
    }
}

/// Computed workgroup counts for both dispatches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkgroupCounts {
    pub backdrop: u32,
    /// One workgroup per tile, `(x, y)`.
    pub fine: (u32, u32),
}

impl WorkgroupCounts {
    pub fn new(config: &ConfigUniform) -> Self {
        Self {
            backdrop: config.n_elements.div_ceil(BACKDROP_WG),
            fine: (config.width_in_tiles, config.height_in_tiles),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workgroup_counts_round_up() {
        let config = ConfigUniform {
            n_elements: BACKDROP_WG + 1,
            width_in_tiles: 3,
            height_in_tiles: 2,
            ..Default::default()
        };
        let counts = WorkgroupCounts::new(&config);
        assert_eq!(counts.backdrop, 2);
        assert_eq!(counts.fine, (3, 2));
        assert_eq!(config.n_tiles(), 6);
    }

    #[test]
    fn tapes_are_contiguous_per_tile() {
        let config = ConfigUniform {
            ptcl_alloc: Alloc::new(64, 4 * PTCL_INITIAL_ALLOC),
            ..Default::default()
        };
        assert_eq!(config.tape_offset(0), 64);
        assert_eq!(config.tape_offset(3), 64 + 3 * PTCL_INITIAL_ALLOC);
    }
}
