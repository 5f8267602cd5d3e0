// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binary layouts of the buffers exchanged between Tilerast pipeline stages.
//!
//! Every structure here has a fixed size and field order. The upstream encoder
//! and coarse stages write them, the backdrop and fine kernels read them, and
//! the byte encoding is the only contract between those stages.
//!
//! All references are byte offsets into one shared heap of 32-bit words.
//! Offset 0 is the null reference.

// LINEBENDER LINT SET - lib.rs - v2
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    missing_debug_implementations,
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    reason = "Deferred"
)]

mod annotated;
mod clip;
mod config;
mod encoder;
mod path;
mod ptcl;
mod scene;
mod words;

pub use annotated::{
    fill_mode_from_flags, AnnoBeginClip, AnnoColor, AnnoEndClip, AnnoImage, Annotated,
    AnnotatedTag, TagFlags, MODE_NONZERO, MODE_STROKE,
};
pub use clip::{ClipFrame, CLIP_LINK_OFFSET, CLIP_STATE_SIZE};
pub use config::{
    Alloc, ConfigUniform, WorkgroupCounts, BACKDROP_WG, LG_BACKDROP_WG, PTCL_INITIAL_ALLOC,
    TILE_HEIGHT_PX, TILE_SIZE_PX, TILE_WIDTH_PX,
};
pub use encoder::{Encode, Encoder, Ref};
pub use path::{Path, Tile, TileSeg, TileSegs, Y_EDGE_NONE};
pub use ptcl::{Cmd, CmdAlpha, CmdColor, CmdFill, CmdImage, CmdJump, CmdStroke, CmdTag};
pub use scene::EncodedScene;
pub use words::{read_words, ReadWords};
