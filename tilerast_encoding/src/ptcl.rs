// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-tile command lists (PTCL).

use crate::annotated::{pack_i16x2, unpack_i16x2};
use crate::encoder::encode_words;
use crate::{read_words, Encode, ReadWords};

/// Tags for PTCL commands.
pub struct CmdTag;

impl CmdTag {
    pub const END: u32 = 0;
    pub const FILL: u32 = 1;
    pub const STROKE: u32 = 2;
    pub const SOLID: u32 = 3;
    pub const ALPHA: u32 = 4;
    pub const COLOR: u32 = 5;
    pub const IMAGE: u32 = 6;
    pub const BEGIN_CLIP: u32 = 7;
    pub const END_CLIP: u32 = 8;
    pub const JUMP: u32 = 9;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CmdFill {
    /// First segment of the tile, 0 if there is none.
    pub tile_ref: u32,
    pub backdrop: i32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CmdStroke {
    pub tile_ref: u32,
    pub half_width: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CmdAlpha {
    pub alpha: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CmdColor {
    /// Packed `0xRRGGBBAA`, sRGB.
    pub rgba_color: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CmdImage {
    pub index: u32,
    /// Offset added to the pixel position before sampling.
    pub offset: [i16; 2],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CmdJump {
    pub new_ref: u32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Cmd {
    End,
    Fill(CmdFill),
    Stroke(CmdStroke),
    Solid,
    Alpha(CmdAlpha),
    Color(CmdColor),
    Image(CmdImage),
    BeginClip,
    EndClip,
    Jump(CmdJump),
}

impl Cmd {
    /// Encoded size: a tag word plus the largest payload.
    pub const SIZE: u32 = 12;

    pub fn tag(&self) -> u32 {
        match self {
            Self::End => CmdTag::END,
            Self::Fill(_) => CmdTag::FILL,
            Self::Stroke(_) => CmdTag::STROKE,
            Self::Solid => CmdTag::SOLID,
            Self::Alpha(_) => CmdTag::ALPHA,
            Self::Color(_) => CmdTag::COLOR,
            Self::Image(_) => CmdTag::IMAGE,
            Self::BeginClip => CmdTag::BEGIN_CLIP,
            Self::EndClip => CmdTag::END_CLIP,
            Self::Jump(_) => CmdTag::JUMP,
        }
    }

    pub fn to_words(&self) -> [u32; 3] {
        let payload = match self {
            Self::Fill(fill) => [fill.tile_ref, fill.backdrop as u32],
            Self::Stroke(stroke) => [stroke.tile_ref, stroke.half_width.to_bits()],
            Self::Alpha(alpha) => [alpha.alpha.to_bits(), 0],
            Self::Color(color) => [color.rgba_color, 0],
            Self::Image(image) => [image.index, pack_i16x2(image.offset)],
            Self::Jump(jump) => [jump.new_ref, 0],
            Self::End | Self::Solid | Self::BeginClip | Self::EndClip => [0, 0],
        };
        [self.tag(), payload[0], payload[1]]
    }

    /// Decodes the command at byte `offset`.
    ///
    /// Tapes come from a trusted upstream stage; an unknown tag reads as
    /// [`Cmd::End`] so interpretation still terminates.
    pub fn read<M: ReadWords + ?Sized>(mem: &M, offset: u32) -> Self {
        let [tag, a, b] = read_words::<3, M>(mem, offset);
        match tag {
            CmdTag::FILL => Self::Fill(CmdFill {
                tile_ref: a,
                backdrop: b as i32,
            }),
            CmdTag::STROKE => Self::Stroke(CmdStroke {
                tile_ref: a,
                half_width: f32::from_bits(b),
            }),
            CmdTag::SOLID => Self::Solid,
            CmdTag::ALPHA => Self::Alpha(CmdAlpha {
                alpha: f32::from_bits(a),
            }),
            CmdTag::COLOR => Self::Color(CmdColor { rgba_color: a }),
            CmdTag::IMAGE => Self::Image(CmdImage {
                index: a,
                offset: unpack_i16x2(b),
            }),
            CmdTag::BEGIN_CLIP => Self::BeginClip,
            CmdTag::END_CLIP => Self::EndClip,
            CmdTag::JUMP => Self::Jump(CmdJump { new_ref: a }),
            _ => Self::End,
        }
    }
}

impl Encode for Cmd {
    fn fixed_size() -> usize {
        Self::SIZE as usize
    }

    fn encode_to(&self, buf: &mut [u8]) {
        encode_words(&self.to_words(), buf);
    }
}
