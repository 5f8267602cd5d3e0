// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Annotated elements: one per draw object, produced by the encoder.

use crate::encoder::encode_words;
use crate::{read_words, Encode, ReadWords};

pub const MODE_NONZERO: u32 = 0;
pub const MODE_STROKE: u32 = 1;

pub fn fill_mode_from_flags(flags: u32) -> u32 {
    flags & 1
}

/// Style flags stored in the upper half of the tag word.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TagFlags(pub u32);

impl TagFlags {
    pub const NONZERO: Self = Self(MODE_NONZERO);
    pub const STROKE: Self = Self(MODE_STROKE);
}

/// Tag word of an annotated element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedTag {
    pub tag: u32,
    pub flags: u32,
}

impl AnnotatedTag {
    pub const NOP: u32 = 0;
    pub const COLOR: u32 = 1;
    pub const IMAGE: u32 = 2;
    pub const BEGIN_CLIP: u32 = 3;
    pub const END_CLIP: u32 = 4;

    pub fn read<M: ReadWords + ?Sized>(mem: &M, offset: u32) -> Self {
        let word = mem.read_word(offset >> 2);
        Self {
            tag: word & 0xffff,
            flags: word >> 16,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AnnoColor {
    pub bbox: [f32; 4],
    /// Stroke width, for stroked elements.
    pub linewidth: f32,
    pub rgba_color: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AnnoImage {
    pub bbox: [f32; 4],
    pub linewidth: f32,
    pub index: u32,
    pub offset: [i16; 2],
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AnnoBeginClip {
    pub bbox: [f32; 4],
    pub linewidth: f32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AnnoEndClip {
    pub bbox: [f32; 4],
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Annotated {
    Nop,
    Color(TagFlags, AnnoColor),
    Image(TagFlags, AnnoImage),
    BeginClip(TagFlags, AnnoBeginClip),
    EndClip(AnnoEndClip),
}

pub(crate) fn pack_i16x2(v: [i16; 2]) -> u32 {
    u32::from(v[0] as u16) | (u32::from(v[1] as u16) << 16)
}

pub(crate) fn unpack_i16x2(w: u32) -> [i16; 2] {
    [w as u16 as i16, (w >> 16) as u16 as i16]
}

fn bbox_words(bbox: [f32; 4]) -> [u32; 4] {
    bbox.map(f32::to_bits)
}

fn bbox_from(words: &[u32]) -> [f32; 4] {
    [0, 1, 2, 3].map(|i| f32::from_bits(words[i]))
}

impl Annotated {
    /// Encoded size: a tag word plus the largest payload.
    pub const SIZE: u32 = 32;

    pub fn tag(&self) -> AnnotatedTag {
        let (tag, flags) = match self {
            Self::Nop => (AnnotatedTag::NOP, TagFlags::default()),
            Self::Color(flags, _) => (AnnotatedTag::COLOR, *flags),
            Self::Image(flags, _) => (AnnotatedTag::IMAGE, *flags),
            Self::BeginClip(flags, _) => (AnnotatedTag::BEGIN_CLIP, *flags),
            Self::EndClip(_) => (AnnotatedTag::END_CLIP, TagFlags::default()),
        };
        AnnotatedTag {
            tag,
            flags: flags.0,
        }
    }

    pub fn to_words(&self) -> [u32; 8] {
        let tag = self.tag();
        let mut words = [0; 8];
        words[0] = tag.tag | (tag.flags << 16);
        match self {
            Self::Nop => {}
            Self::Color(_, color) => {
                words[1..5].copy_from_slice(&bbox_words(color.bbox));
                words[5] = color.linewidth.to_bits();
                words[6] = color.rgba_color;
            }
            Self::Image(_, image) => {
                words[1..5].copy_from_slice(&bbox_words(image.bbox));
                words[5] = image.linewidth.to_bits();
                words[6] = image.index;
                words[7] = pack_i16x2(image.offset);
            }
            Self::BeginClip(_, clip) => {
                words[1..5].copy_from_slice(&bbox_words(clip.bbox));
                words[5] = clip.linewidth.to_bits();
            }
            Self::EndClip(clip) => {
                words[1..5].copy_from_slice(&bbox_words(clip.bbox));
            }
        }
        words
    }

    pub fn read<M: ReadWords + ?Sized>(mem: &M, offset: u32) -> Self {
        let words = read_words::<8, M>(mem, offset);
        let flags = TagFlags(words[0] >> 16);
        let bbox = bbox_from(&words[1..5]);
        match words[0] & 0xffff {
            AnnotatedTag::COLOR => Self::Color(
                flags,
                AnnoColor {
                    bbox,
                    linewidth: f32::from_bits(words[5]),
                    rgba_color: words[6],
                },
            ),
            AnnotatedTag::IMAGE => Self::Image(
                flags,
                AnnoImage {
                    bbox,
                    linewidth: f32::from_bits(words[5]),
                    index: words[6],
                    offset: unpack_i16x2(words[7]),
                },
            ),
            AnnotatedTag::BEGIN_CLIP => Self::BeginClip(
                flags,
                AnnoBeginClip {
                    bbox,
                    linewidth: f32::from_bits(words[5]),
                },
            ),
            AnnotatedTag::END_CLIP => Self::EndClip(AnnoEndClip { bbox }),
            _ => Self::Nop,
        }
    }
}

impl Encode for Annotated {
    fn fixed_size() -> usize {
        Self::SIZE as usize
    }

    fn encode_to(&self, buf: &mut [u8]) {
        encode_words(&self.to_words(), buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Encoder;

    #[test]
    fn tag_word_carries_flags() {
        let mut encoder = Encoder::new();
        let color = Annotated::Color(
            TagFlags::STROKE,
            AnnoColor {
                bbox: [1.0, 2.0, 3.0, 4.0],
                linewidth: 2.5,
                rgba_color: 0xff00_00ff,
            },
        );
        let at = color.encode(&mut encoder);
        let words = encoder.into_words();
        assert_eq!(words.len(), 8);
        assert_eq!(words[0], AnnotatedTag::COLOR | (MODE_STROKE << 16));
        let tag = AnnotatedTag::read(&words, at.offset());
        assert_eq!(tag.tag, AnnotatedTag::COLOR);
        assert_eq!(fill_mode_from_flags(tag.flags), MODE_STROKE);
        assert_eq!(Annotated::read(&words, at.offset()), color);
    }

    #[test]
    fn image_offset_is_signed() {
        let image = Annotated::Image(
            TagFlags::NONZERO,
            AnnoImage {
                bbox: [0.0; 4],
                linewidth: 0.0,
                index: 3,
                offset: [-5, 7],
            },
        );
        let words = image.to_words();
        assert_eq!(words[7], 0x0007_fffb);
        assert_eq!(Annotated::read(words.as_slice(), 0), image);
    }
}
