// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{TILE_HEIGHT_PX, TILE_WIDTH_PX};

/// Word index of the link to the previous frame within a clip spill frame.
pub const CLIP_LINK_OFFSET: u32 = 2 * TILE_WIDTH_PX * TILE_HEIGHT_PX;
/// Size of a clip spill frame in words.
pub const CLIP_STATE_SIZE: u32 = CLIP_LINK_OFFSET + 1;

/// A heap-allocated frame holding one evicted clip stack entry per pixel.
///
/// Each pixel `x + y * TILE_WIDTH_PX` owns two words: the packed sRGB
/// background followed by the clip area as `f32` bits. The final word
/// links to the previously spilled frame, 0 for the bottom of the chain.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClipFrame {
    /// Byte offset of the frame; 0 when no frame is live.
    pub offset: u32,
}

impl ClipFrame {
    pub const SIZE_IN_BYTES: u32 = CLIP_STATE_SIZE * 4;

    pub fn new(offset: u32) -> Self {
        Self { offset }
    }

    /// Word index of the background color of a tile-local pixel.
    pub fn color_ix(&self, x: u32, y: u32) -> u32 {
        (self.offset >> 2) + ((x + y * TILE_WIDTH_PX) << 1)
    }

    /// Word index of the clip area of a tile-local pixel.
    pub fn area_ix(&self, x: u32, y: u32) -> u32 {
        self.color_ix(x, y) + 1
    }

    pub fn link_ix(&self) -> u32 {
        (self.offset >> 2) + CLIP_LINK_OFFSET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_and_link_do_not_overlap() {
        let frame = ClipFrame::new(400);
        let last = frame.area_ix(TILE_WIDTH_PX - 1, TILE_HEIGHT_PX - 1);
        assert_eq!(frame.color_ix(0, 0), 100);
        assert_eq!(frame.area_ix(1, 0), 103);
        assert_eq!(last + 1, frame.link_ix());
        assert_eq!(frame.link_ix() + 1 - 100, CLIP_STATE_SIZE);
    }
}
