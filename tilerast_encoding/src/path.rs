// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bytemuck::{Pod, Zeroable};

use crate::encoder::impl_encode_pod;
use crate::{read_words, ReadWords};

/// `y_edge` of a segment that doesn't cross the left edge of its tile.
pub const Y_EDGE_NONE: f32 = 1e9;

/// Tile rectangle of a path.
#[derive(Copy, Clone, Pod, Zeroable, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct Path {
    /// Bounding box in tiles: x0, y0, x1, y1.
    pub bbox: [u16; 4],
    /// Reference to the first tile; tiles are stored row-major.
    pub tiles: u32,
}

/// Tile object.
#[derive(Copy, Clone, Pod, Zeroable, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct Tile {
    /// Reference to the first segment of this tile, 0 if there is none.
    pub tile: u32,
    /// Winding number contributed by edges left of the tile.
    ///
    /// Written as a per-tile delta by the coarse stage and turned into an
    /// inclusive row prefix sum by the backdrop kernel.
    pub backdrop: i32,
}

/// A line segment clipped to one tile, in target pixel coordinates.
///
/// Segments of a tile form a singly linked list terminated by `next == 0`.
#[derive(Copy, Clone, Pod, Zeroable, Debug, Default, PartialEq)]
#[repr(C)]
pub struct TileSeg {
    pub origin: [f32; 2],
    pub vector: [f32; 2],
    /// Y coordinate where the unclipped edge crosses the left edge of the
    /// tile, or [`Y_EDGE_NONE`].
    pub y_edge: f32,
    pub next: u32,
}

static_assertions::const_assert_eq!(std::mem::size_of::<Path>(), 12);
static_assertions::const_assert_eq!(std::mem::size_of::<Tile>(), 8);
static_assertions::const_assert_eq!(std::mem::size_of::<TileSeg>(), 24);

impl_encode_pod!(Path, Tile, TileSeg);

impl Path {
    pub const SIZE: u32 = 12;

    pub fn new(bbox: [u16; 4], tiles: u32) -> Self {
        Self { bbox, tiles }
    }

    pub fn read<M: ReadWords + ?Sized>(mem: &M, offset: u32) -> Self {
        bytemuck::cast(read_words::<3, M>(mem, offset))
    }

    /// Width in tiles, zero for inverted boxes.
    pub fn width(&self) -> u32 {
        u32::from(self.bbox[2].saturating_sub(self.bbox[0]))
    }

    /// Height in tiles, zero for inverted boxes.
    pub fn height(&self) -> u32 {
        u32::from(self.bbox[3].saturating_sub(self.bbox[1]))
    }

    /// Byte offset of the tile at path-local tile coordinates.
    pub fn tile_offset(&self, x: u32, y: u32) -> u32 {
        self.tiles + (y * self.width() + x) * Tile::SIZE
    }
}

impl Tile {
    pub const SIZE: u32 = 8;
    /// Word index of `backdrop` within a tile.
    pub const BACKDROP_WORD: u32 = 1;

    pub fn read<M: ReadWords + ?Sized>(mem: &M, offset: u32) -> Self {
        bytemuck::cast(read_words::<2, M>(mem, offset))
    }
}

impl TileSeg {
    pub const SIZE: u32 = 24;

    pub fn read<M: ReadWords + ?Sized>(mem: &M, offset: u32) -> Self {
        bytemuck::cast(read_words::<6, M>(mem, offset))
    }

    /// Walks the segment list starting at `head`.
    pub fn iter<M: ReadWords + ?Sized>(mem: &M, head: u32) -> TileSegs<'_, M> {
        TileSegs { mem, next: head }
    }
}

/// Iterator over a linked list of [`TileSeg`]s.
pub struct TileSegs<'a, M: ?Sized> {
    mem: &'a M,
    next: u32,
}

impl<M: ReadWords + ?Sized> Iterator for TileSegs<'_, M> {
    type Item = TileSeg;

    fn next(&mut self) -> Option<TileSeg> {
        if self.next == 0 {
            return None;
        }
        let seg = TileSeg::read(self.mem, self.next);
        self.next = seg.next;
        Some(seg)
    }
}
